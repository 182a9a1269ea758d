use std::collections::{BTreeMap, BTreeSet};

use canon_contracts::{CANON_CONFIG_SCHEMA_VERSION, RULE_NAMESPACE};
use serde_json::Value;

/// Settings of one rule, using the RuboCop key spelling on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    pub enabled: bool,
    /// Bucket abbreviated `key:` entries ahead of expanded ones.
    pub shorthands_first: bool,
    /// Callees whose literal arguments are never reordered.
    pub exclude_methods: BTreeSet<String>,
    /// Call names a call-site rule applies to. Empty means none.
    pub methods: BTreeSet<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shorthands_first: false,
            exclude_methods: BTreeSet::new(),
            methods: BTreeSet::new(),
        }
    }
}

impl RuleConfig {
    /// Reads a rule section permissively: unknown keys are ignored and a value of the
    /// wrong shape falls back to the field's default.
    pub fn from_value(v: &Value) -> Self {
        let mut cfg = RuleConfig::default();
        let Some(obj) = v.as_object() else {
            return cfg;
        };
        if let Some(b) = obj.get("Enabled").and_then(Value::as_bool) {
            cfg.enabled = b;
        }
        if let Some(b) = obj.get("ShorthandsFirst").and_then(Value::as_bool) {
            cfg.shorthands_first = b;
        }
        cfg.exclude_methods = string_set(obj.get("ExcludeMethods"));
        cfg.methods = string_set(obj.get("Methods"));
        cfg
    }
}

fn string_set(v: Option<&Value>) -> BTreeSet<String> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Per-rule settings keyed by qualified rule name (`Canon/SortHash`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonConfig {
    rules: BTreeMap<String, RuleConfig>,
}

impl CanonConfig {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let v: Value = serde_json::from_slice(bytes).map_err(|err| ConfigError {
            message: format!("config is not valid JSON: {err}"),
        })?;
        Self::from_value(&v)
    }

    pub fn from_value(v: &Value) -> Result<Self, ConfigError> {
        let obj = v.as_object().ok_or_else(|| ConfigError {
            message: "config root must be a JSON object".to_string(),
        })?;
        if let Some(version) = obj.get("schema_version") {
            if version.as_str() != Some(CANON_CONFIG_SCHEMA_VERSION) {
                return Err(ConfigError {
                    message: format!(
                        "config schema_version mismatch: expected {CANON_CONFIG_SCHEMA_VERSION} got {version}"
                    ),
                });
            }
        }
        // sections of other tools (`AllCops`, `Style/...`) may share the document
        let rules = obj
            .iter()
            .filter(|(name, _)| is_canon_section(name))
            .map(|(name, section)| (name.clone(), RuleConfig::from_value(section)))
            .collect();
        Ok(Self { rules })
    }

    /// Settings for `rule`, or the defaults when the document has no section for it.
    pub fn rule(&self, rule: &str) -> RuleConfig {
        self.rules.get(rule).cloned().unwrap_or_default()
    }
}

fn is_canon_section(name: &str) -> bool {
    name.strip_prefix(RULE_NAMESPACE)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CanonConfig, RuleConfig};

    #[test]
    fn reads_rule_sections() {
        let cfg = CanonConfig::from_value(&json!({
            "Canon/SortHash": {
                "Enabled": true,
                "ShorthandsFirst": true,
                "ExcludeMethods": ["enum"],
            },
            "Canon/SortMethodArguments": { "Methods": ["attr_reader", "delegate"] },
        }))
        .expect("parse config");

        let hash = cfg.rule("Canon/SortHash");
        assert!(hash.shorthands_first);
        assert!(hash.exclude_methods.contains("enum"));

        let args = cfg.rule("Canon/SortMethodArguments");
        assert!(args.enabled);
        assert_eq!(args.methods.len(), 2);
    }

    #[test]
    fn wrong_shapes_fall_back_to_defaults() {
        let cfg = CanonConfig::from_value(&json!({
            "Canon/SortKeywords": {
                "Enabled": "yes",
                "ShorthandsFirst": 1,
                "Methods": ["attribute", 7, null],
                "ExcludeMethods": "enum",
            },
            "Canon/KeywordShorthand": false,
            "Style/HashSyntax": { "Enabled": false },
        }))
        .expect("parse config");

        let kw = cfg.rule("Canon/SortKeywords");
        assert!(kw.enabled);
        assert!(!kw.shorthands_first);
        assert_eq!(kw.methods.iter().collect::<Vec<_>>(), vec!["attribute"]);
        assert!(kw.exclude_methods.is_empty());

        assert_eq!(cfg.rule("Canon/KeywordShorthand"), RuleConfig::default());
        assert_eq!(cfg.rule("Canon/Missing"), RuleConfig::default());
        assert!(cfg.rule("Style/HashSyntax").enabled);
    }

    #[test]
    fn schema_version_is_checked_when_present() {
        let ok = CanonConfig::from_value(&json!({ "schema_version": "canon.config@0.1.0" }));
        assert!(ok.is_ok());

        let err = CanonConfig::from_value(&json!({ "schema_version": "canon.config@9.9.9" }))
            .expect_err("version mismatch must fail");
        assert!(err.message.contains("mismatch"), "unexpected error: {err}");

        let err = CanonConfig::from_value(&json!([])).expect_err("array root must fail");
        assert!(err.message.contains("JSON object"), "unexpected error: {err}");
    }
}
