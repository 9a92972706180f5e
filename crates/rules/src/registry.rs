//! Rule registry
//!
//! Maps a plugin name to a typed factory. The pipeline config still carries
//! a plugin *path* and that path must exist; the file stem is the registry
//! key. This keeps the plugin-file contract observable while the actual
//! implementations are linked into the binary.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use weir_state::State;

use crate::builtin::{EchoRule, LengthRule, RateRule};
use crate::error::{Result, RuleError};
use crate::rule::Rule;

/// Factory producing a fresh rule instance per pipeline
pub type RuleFactory = Arc<dyn Fn() -> Box<dyn Rule> + Send + Sync>;

/// Registry of rule factories, keyed by plugin name
#[derive(Default, Clone)]
pub struct RuleRegistry {
    factories: HashMap<String, RuleFactory>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the reference rules
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("echo", || Box::new(EchoRule::default()));
        registry.register("length", || Box::new(LengthRule::default()));
        registry.register("rate", || Box::new(RateRule::default()));
        registry
    }

    /// Register a factory under `name`. Later registrations win.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Rule> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Resolve a plugin path to a rule and initialize it with its state.
    ///
    /// Fails if the file does not exist, if no factory is registered under
    /// the file stem, or if the rule's own `init` rejects the state.
    pub fn load(&self, plugin: &Path, state: Option<Arc<State>>) -> Result<Box<dyn Rule>> {
        let factory = self.resolve(plugin)?;
        let mut rule = factory();
        rule.init(state)?;
        tracing::debug!(rule = rule.name(), plugin = %plugin.display(), "loaded rule");
        Ok(rule)
    }

    /// Verify that a plugin path resolves and satisfies the rule contract.
    /// Used by the `--checkRule` CLI mode.
    pub fn check(&self, plugin: &Path) -> Result<()> {
        let factory = self.resolve(plugin)?;
        let mut rule = factory();
        rule.init(None)?;
        let _ = rule.window_interval();
        let _ = rule.name();
        rule.close();
        Ok(())
    }

    fn resolve(&self, plugin: &Path) -> Result<&RuleFactory> {
        if !plugin.exists() {
            return Err(RuleError::plugin_missing(plugin.display().to_string()));
        }
        let symbol = plugin
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        self.factories
            .get(symbol)
            .ok_or_else(|| RuleError::unknown_rule(symbol))
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RuleRegistry").field("rules", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_load_by_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = touch(dir.path(), "echo.wasm");

        let registry = RuleRegistry::with_builtins();
        let rule = registry.load(&plugin, None).unwrap();
        assert_eq!(rule.name(), "echo");
    }

    #[test]
    fn test_missing_file_fails() {
        let registry = RuleRegistry::with_builtins();
        let err = match registry.load(Path::new("/nope/echo.wasm"), None) {
            Err(e) => e,
            Ok(_) => panic!("expected error"),
        };
        assert!(matches!(err, RuleError::PluginMissing { .. }));
    }

    #[test]
    fn test_unregistered_symbol_fails() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = touch(dir.path(), "mystery.wasm");

        let registry = RuleRegistry::with_builtins();
        let err = match registry.load(&plugin, None) {
            Err(e) => e,
            Ok(_) => panic!("expected error"),
        };
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn test_check_passes_for_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = touch(dir.path(), "length.wasm");
        assert!(RuleRegistry::with_builtins().check(&plugin).is_ok());
    }

    #[test]
    fn test_custom_registration_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = touch(dir.path(), "echo.wasm");

        struct Named;
        impl Rule for Named {
            fn process(&mut self, _event: &weir_event::Event) -> Option<weir_event::Record> {
                None
            }
            fn name(&self) -> &str {
                "custom"
            }
        }

        let mut registry = RuleRegistry::with_builtins();
        registry.register("echo", || Box::new(Named));
        let rule = registry.load(&plugin, None).unwrap();
        assert_eq!(rule.name(), "custom");
    }
}
