use crate::backends::foreign_call::AnalyzedFunction;
use crate::compiler_frontend::ast::ast_nodes::RawFunctionDefinition;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorMetaDataKey, ErrorType};
use crate::runtime::kernel::partition::Kernel;
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub const DEFAULT_NAMESPACE: &str = "global";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    pub namespace: String,
    pub name: String,
}

impl RegistryKey {
    pub fn new(namespace: &str, name: &str) -> Self {
        RegistryKey {
            namespace: String::from(namespace),
            name: String::from(name),
        }
    }
}

#[derive(Debug)]
pub enum RegistryEntry {
    /// `@func`, compiled or falling back to the host
    Function(AnalyzedFunction),
    Kernel(Kernel),
    /// Undecorated, always interpreted
    Host(RawFunctionDefinition),
}

impl RegistryEntry {
    pub fn definition(&self) -> &RawFunctionDefinition {
        match self {
            RegistryEntry::Function(function) => function.definition(),
            RegistryEntry::Kernel(kernel) => &kernel.definition,
            RegistryEntry::Host(definition) => definition,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            RegistryEntry::Function(AnalyzedFunction::Compiled { .. }) => "compiled function",
            RegistryEntry::Function(AnalyzedFunction::Fallback { .. }) => "fallback function",
            RegistryEntry::Kernel(_) => "kernel",
            RegistryEntry::Host(_) => "host function",
        }
    }
}

#[derive(Debug)]
pub struct RegisteredCallable {
    pub key: RegistryKey,
    pub entry: RegistryEntry,
    /// Every call logs its wall clock time
    pub timed: bool,
}

// ======================================================
//                    REGISTRY
// ======================================================
/// Every callable a session has defined, keyed by namespace and name.
///
/// Entries are inserted once and never replaced. Calls made while kernels run only read
/// the registry, so it is shared by reference across worker threads.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    entries: FxHashMap<RegistryKey, Arc<RegisteredCallable>>,

    // Insertion order, for listings
    order: Vec<RegistryKey>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry::default()
    }

    /// Checked before any work is done on a new definition
    pub fn ensure_available(&self, namespace: &str, name: &str) -> Result<(), CompilerError> {
        let key = RegistryKey::new(namespace, name);

        if let Some(existing) = self.entries.get(&key) {
            return Err(CompilerError::without_location(
                format!(
                    "'{}' is already defined as a {} in namespace '{}'",
                    name,
                    existing.entry.kind_name(),
                    namespace
                ),
                ErrorType::Rule,
            )
            .with_metadata(ErrorMetaDataKey::FunctionName, name)
            .with_metadata(
                ErrorMetaDataKey::PrimarySuggestion,
                "Rename one of the definitions or register it in another namespace",
            ));
        }

        Ok(())
    }

    pub fn register(
        &mut self,
        namespace: &str,
        name: &str,
        entry: RegistryEntry,
        timed: bool,
    ) -> Result<Arc<RegisteredCallable>, CompilerError> {
        self.ensure_available(namespace, name)?;

        let key = RegistryKey::new(namespace, name);
        let callable = Arc::new(RegisteredCallable {
            key: key.to_owned(),
            entry,
            timed,
        });

        self.entries.insert(key.to_owned(), Arc::clone(&callable));
        self.order.push(key);

        Ok(callable)
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<&Arc<RegisteredCallable>> {
        self.entries.get(&RegistryKey::new(namespace, name))
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.get(namespace, name).is_some()
    }

    /// Registered callables in definition order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RegisteredCallable>> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/function_registry_tests.rs"]
mod tests;
