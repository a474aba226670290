//! Function callback registry.
//!
//! The registry is shared by every call made through an adapter. Options may
//! carry callbacks of their own; those get registered on use, with different
//! rules for per-call (runtime) and adapter-level (default) options.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::callback::FunctionCallback;
use crate::api::ChatCompletionOptions;
use crate::error::LlmError;

/// How the callbacks carried by an options object are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Per-call options: carried callbacks overwrite registered ones and are
    /// enabled automatically.
    ///
    /// Registration outlives the call. Later calls through the same adapter
    /// do not advertise the callback, but still run it when the model asks
    /// for that name.
    Runtime,
    /// Adapter-level options: carried callbacks are registered only when the
    /// name is free, and are enabled only when listed by name.
    Default,
}

/// External lookup for functions that were never registered directly.
pub trait FunctionCallbackResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn FunctionCallback>>;
}

impl<F> FunctionCallbackResolver for F
where
    F: Fn(&str) -> Option<Arc<dyn FunctionCallback>> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<Arc<dyn FunctionCallback>> {
        self(name)
    }
}

/// Name-indexed store of function callbacks.
#[derive(Default)]
pub struct FunctionCallbackRegistry {
    callbacks: RwLock<HashMap<String, Arc<dyn FunctionCallback>>>,
    resolver: Option<Arc<dyn FunctionCallbackResolver>>,
}

impl fmt::Debug for FunctionCallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCallbackRegistry")
            .field("functions", &self.names())
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

impl FunctionCallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that falls back to `resolver` for unknown names.
    pub fn with_resolver(resolver: Arc<dyn FunctionCallbackResolver>) -> Self {
        Self {
            callbacks: RwLock::default(),
            resolver: Some(resolver),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<dyn FunctionCallback>>> {
        self.callbacks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<dyn FunctionCallback>>> {
        self.callbacks.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a callback, replacing any callback with the same name.
    pub fn register(&self, callback: Arc<dyn FunctionCallback>) {
        self.write().insert(callback.name().to_string(), callback);
    }

    /// Register a callback unless the name is already taken.
    pub fn register_if_absent(&self, callback: Arc<dyn FunctionCallback>) {
        self.write()
            .entry(callback.name().to_string())
            .or_insert(callback);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FunctionCallback>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Register the callbacks carried by `options` and return the function
    /// names the options enable.
    pub fn enabled_functions(
        &self,
        options: &ChatCompletionOptions,
        mode: ResolutionMode,
    ) -> BTreeSet<String> {
        let mut enabled = BTreeSet::new();

        for callback in &options.function_callbacks {
            match mode {
                ResolutionMode::Runtime => {
                    self.register(callback.clone());
                    enabled.insert(callback.name().to_string());
                }
                ResolutionMode::Default => self.register_if_absent(callback.clone()),
            }
        }

        enabled.extend(options.functions.iter().cloned());
        enabled
    }

    /// Look up a callback, consulting the external resolver for unknown
    /// names. Resolved callbacks are cached in the registry.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn FunctionCallback>, LlmError> {
        if let Some(callback) = self.get(name) {
            return Ok(callback);
        }

        let resolved = self
            .resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve(name))
            .ok_or_else(|| LlmError::UnknownFunction(name.to_string()))?;

        tracing::debug!(function = name, "resolved function callback through resolver");
        self.register_if_absent(resolved);
        self.get(name)
            .ok_or_else(|| LlmError::UnknownFunction(name.to_string()))
    }

    /// Resolve every name to its callback, in name order.
    pub fn resolve(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<Vec<Arc<dyn FunctionCallback>>, LlmError> {
        names.iter().map(|name| self.lookup(name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Named {
        name: &'static str,
        reply: &'static str,
        schema: Value,
    }

    impl Named {
        fn arc(name: &'static str, reply: &'static str) -> Arc<dyn FunctionCallback> {
            Arc::new(Self {
                name,
                reply,
                schema: json!({"type": "object"}),
            })
        }
    }

    #[async_trait]
    impl FunctionCallback for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "test function"
        }

        fn input_type_schema(&self) -> &Value {
            &self.schema
        }

        async fn call(&self, _arguments: &str) -> Result<String, LlmError> {
            Ok(self.reply.to_string())
        }
    }

    #[tokio::test]
    async fn runtime_callbacks_overwrite_and_enable() {
        let registry = FunctionCallbackRegistry::new();
        registry.register(Named::arc("calc", "old"));

        let options = ChatCompletionOptions::builder()
            .function_callback(Named::arc("calc", "new"))
            .build();
        let enabled = registry.enabled_functions(&options, ResolutionMode::Runtime);

        assert!(enabled.contains("calc"));
        let reply = registry.get("calc").unwrap().call("").await.unwrap();
        assert_eq!(reply, "new");
    }

    #[tokio::test]
    async fn default_callbacks_keep_existing_and_stay_disabled() {
        let registry = FunctionCallbackRegistry::new();
        registry.register(Named::arc("calc", "old"));

        let options = ChatCompletionOptions::builder()
            .function_callback(Named::arc("calc", "new"))
            .function_callback(Named::arc("weather", "sunny"))
            .function("explicit")
            .build();
        let enabled = registry.enabled_functions(&options, ResolutionMode::Default);

        assert_eq!(enabled.into_iter().collect::<Vec<_>>(), vec!["explicit"]);
        assert!(registry.contains("weather"));
        let reply = registry.get("calc").unwrap().call("").await.unwrap();
        assert_eq!(reply, "old");
    }

    #[test]
    fn unknown_names_fail_without_resolver() {
        let registry = FunctionCallbackRegistry::new();
        let names = BTreeSet::from(["missing".to_string()]);
        let err = registry.resolve(&names).unwrap_err();
        assert!(matches!(err, LlmError::UnknownFunction(name) if name == "missing"));
    }

    #[test]
    fn resolver_results_are_cached() {
        let resolver = |name: &str| (name == "lazy").then(|| Named::arc("lazy", "hi"));
        let registry = FunctionCallbackRegistry::with_resolver(Arc::new(resolver));

        assert!(!registry.contains("lazy"));
        let callback = registry.lookup("lazy").unwrap();
        assert_eq!(callback.name(), "lazy");
        assert!(registry.contains("lazy"));
        assert!(registry.lookup("other").is_err());
    }
}
