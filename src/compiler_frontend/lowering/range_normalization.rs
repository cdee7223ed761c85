use serde::Serialize;

/// Explicit `(lower, upper, step)` form of a `range(...)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeTriple<T> {
    pub lower: T,
    pub upper: T,
    pub step: T,
}

/// Expands the one, two and three argument forms of `range`.
///
/// `range(a)` is `(0, a, 1)`, `range(a, b)` is `(a, b, 1)`. Any other arity returns None.
pub fn normalize_range<T>(args: Vec<T>, zero: T, one: T) -> Option<RangeTriple<T>> {
    let mut args = args.into_iter();

    let triple = match (args.next(), args.next(), args.next(), args.next()) {
        (Some(upper), None, None, None) => RangeTriple {
            lower: zero,
            upper,
            step: one,
        },
        (Some(lower), Some(upper), None, None) => RangeTriple {
            lower,
            upper,
            step: one,
        },
        (Some(lower), Some(upper), Some(step), None) => RangeTriple { lower, upper, step },
        _ => return None,
    };

    Some(triple)
}

impl RangeTriple<i64> {
    /// Number of indices the range yields. Zero when the step is zero.
    pub fn len(&self) -> u64 {
        if self.step > 0 && self.lower < self.upper {
            let span = (self.upper as i128 - self.lower as i128) as u128;
            span.div_ceil(self.step as u128) as u64
        } else if self.step < 0 && self.lower > self.upper {
            let span = (self.lower as i128 - self.upper as i128) as u128;
            span.div_ceil(self.step.unsigned_abs() as u128) as u64
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The indices in order, stopping before `upper`
    pub fn iter(&self) -> impl Iterator<Item = i64> + use<> {
        let RangeTriple { lower, step, .. } = *self;
        (0..self.len()).map(move |n| (lower as i128 + n as i128 * step as i128) as i64)
    }
}
