pub mod dispatch;
pub mod partition;
