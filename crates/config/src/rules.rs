//! Rule configuration

use serde::{Deserialize, Serialize};

/// Configuration for a named rule.
///
/// `source` names a source or another rule; `sink`, when set, names a sink
/// or another rule; `state`, when set, names a declared state. `plugin` is
/// the path of the rule's plugin file — the file must exist and its stem is
/// the key under which the rule implementation is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub source: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,

    pub plugin: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sink: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_default_empty() {
        let rule: RuleConfig =
            serde_json::from_str(r#"{"source":"in","plugin":"rules/echo.wasm"}"#).unwrap();
        assert_eq!(rule.source, "in");
        assert!(rule.state.is_empty());
        assert!(rule.sink.is_empty());
    }

    #[test]
    fn test_missing_source_rejected() {
        assert!(serde_json::from_str::<RuleConfig>(r#"{"plugin":"p"}"#).is_err());
    }
}
