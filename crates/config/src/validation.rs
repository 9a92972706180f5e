//! Configuration validation
//!
//! Structural invariants applied after parsing:
//! - Every rule's `source` refers to a defined source or rule
//! - Every rule's `sink`, if set, refers to a defined sink or rule
//! - Every rule's `state`, if set, refers to a defined state
//! - The name spaces of sources, rules, sinks and states are disjoint
//! - At most one rule declares each state
//! - Every rule's plugin file exists
//! - At least one source and one sink are defined
//!
//! Cycle detection needs the assembled graph and lives with the DAG
//! builder in `weir-pipeline`.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::PipelineConfig;

/// Validate the entire configuration
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    validate_references(config)?;
    validate_disjoint_names(config)?;
    validate_state_ownership(config)?;
    validate_presence(config)?;
    Ok(())
}

/// Check that everything a rule points at exists
fn validate_references(config: &PipelineConfig) -> Result<()> {
    for (rule_name, rule) in &config.rules {
        if !config.sources.contains_key(&rule.source) && !config.rules.contains_key(&rule.source) {
            return Err(ConfigError::unknown_source(rule_name, &rule.source));
        }

        if !rule.sink.is_empty()
            && !config.sinks.contains_key(&rule.sink)
            && !config.rules.contains_key(&rule.sink)
        {
            return Err(ConfigError::unknown_sink(rule_name, &rule.sink));
        }

        if !rule.state.is_empty() && !config.states.contains_key(&rule.state) {
            return Err(ConfigError::unknown_state(rule_name, &rule.state));
        }

        if !Path::new(&rule.plugin).exists() {
            return Err(ConfigError::missing_plugin(rule_name, &rule.plugin));
        }
    }
    Ok(())
}

/// Check that no name appears in more than one of the four maps
fn validate_disjoint_names(config: &PipelineConfig) -> Result<()> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    let names = config
        .sources
        .keys()
        .chain(config.rules.keys())
        .chain(config.sinks.keys())
        .chain(config.states.keys());
    for name in names {
        *seen.entry(name.as_str()).or_default() += 1;
    }

    let duplicates: Vec<&str> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::duplicate_names(duplicates.join(", ")))
    }
}

/// Check that no state is declared by more than one rule
fn validate_state_ownership(config: &PipelineConfig) -> Result<()> {
    let mut owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (rule_name, rule) in &config.rules {
        if !rule.state.is_empty() {
            owners.entry(&rule.state).or_default().push(rule_name);
        }
    }

    for (state, rules) in owners {
        if rules.len() > 1 {
            return Err(ConfigError::shared_state(state, rules.join(", ")));
        }
    }
    Ok(())
}

/// Check that the pipeline has endpoints at all
fn validate_presence(config: &PipelineConfig) -> Result<()> {
    if config.sources.is_empty() {
        return Err(ConfigError::NoSources);
    }
    if config.sinks.is_empty() {
        return Err(ConfigError::NoSinks);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileSinkConfig, FileSourceConfig, RuleConfig, SinkConfig, SourceConfig};
    use weir_state::{KvConfig, StateConfig};

    fn base_config(plugin: &str) -> PipelineConfig {
        let mut config = PipelineConfig {
            event_folder: "events/".to_string(),
            ..Default::default()
        };
        config.sources.insert(
            "fileInput".to_string(),
            SourceConfig::File {
                file_config: FileSourceConfig {
                    path: "input".to_string(),
                },
            },
        );
        config.sinks.insert(
            "fileOutput".to_string(),
            SinkConfig::File {
                file_config: FileSinkConfig {
                    path: "output".to_string(),
                },
            },
        );
        config.rules.insert(
            "aRule".to_string(),
            RuleConfig {
                source: "fileInput".to_string(),
                state: String::new(),
                plugin: plugin.to_string(),
                sink: "fileOutput".to_string(),
            },
        );
        config
    }

    fn plugin_file() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.wasm");
        std::fs::write(&path, b"").unwrap();
        (dir, path.display().to_string())
    }

    #[test]
    fn test_valid_config_passes() {
        let (_dir, plugin) = plugin_file();
        assert!(validate_config(&base_config(&plugin)).is_ok());
    }

    #[test]
    fn test_unknown_source_rejected() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        config.rules.get_mut("aRule").unwrap().source = "ghost".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("ghost"));
        assert!(err.to_string().contains("aRule"));
    }

    #[test]
    fn test_rule_as_source_accepted() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        config.rules.insert(
            "downstream".to_string(),
            RuleConfig {
                source: "aRule".to_string(),
                state: String::new(),
                plugin: plugin.clone(),
                sink: "fileOutput".to_string(),
            },
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_sink_rejected() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        config.rules.get_mut("aRule").unwrap().sink = "void".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("void"));
    }

    #[test]
    fn test_empty_sink_accepted() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        config.rules.get_mut("aRule").unwrap().sink = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_state_rejected() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        config.rules.get_mut("aRule").unwrap().state = "nonExistent".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("nonExistent"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        // A source named like the rule collides across name spaces.
        config.sources.insert(
            "aRule".to_string(),
            SourceConfig::File {
                file_config: FileSourceConfig {
                    path: "other".to_string(),
                },
            },
        );
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate names"));
        assert!(err.to_string().contains("aRule"));
    }

    #[test]
    fn test_shared_state_rejected() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        config.states.insert(
            "aState".to_string(),
            StateConfig::Kv {
                kv_config: KvConfig {
                    db_file_name: "state.db".to_string(),
                    bucket_name: "b".to_string(),
                },
            },
        );
        config.rules.get_mut("aRule").unwrap().state = "aState".to_string();
        config.rules.insert(
            "bRule".to_string(),
            RuleConfig {
                source: "fileInput".to_string(),
                state: "aState".to_string(),
                plugin: plugin.clone(),
                sink: "fileOutput".to_string(),
            },
        );
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("aState"));
        assert!(err.to_string().contains("aRule, bRule"));
    }

    #[test]
    fn test_missing_plugin_rejected() {
        let config = base_config("/definitely/not/a/plugin");
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("plugin"));
    }

    #[test]
    fn test_no_sources_rejected() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        config.sources.clear();
        config.rules.clear();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::NoSources)
        ));
    }

    #[test]
    fn test_no_sinks_rejected() {
        let (_dir, plugin) = plugin_file();
        let mut config = base_config(&plugin);
        config.sinks.clear();
        config.rules.get_mut("aRule").unwrap().sink = String::new();
        assert!(matches!(validate_config(&config), Err(ConfigError::NoSinks)));
    }
}
