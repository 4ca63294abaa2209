//! Weaver configuration (`weft.toml`)
//!
//! ```toml
//! [weave]
//! primary_marker = "weft.aop.Aspect"
//! synthetic_prefix = "__weft"
//! supports = ["com.example.Timed"]
//! supports_file = "aspect.supports"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TriggerSet;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level shape of `weft.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeftConfig {
    #[serde(default)]
    pub weave: WeaveSettings,
}

/// Names and seeds the weaving pass works with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaveSettings {
    /// The framework's own aspect-declaration annotation. Only this marker
    /// may carry a strategy attribute.
    pub primary_marker: String,
    /// Attribute on the primary marker naming the context builder
    pub strategy_attribute: String,
    /// Prefix of every generated field, local and label
    pub synthetic_prefix: String,
    /// Runtime type of the per-invocation aspect context
    pub context_type: String,
    /// Runtime type of the owner-level metadata cache
    pub owner_meta_type: String,
    /// Runtime type of the method-level metadata cache
    pub method_meta_type: String,
    /// Trigger annotations known before the pass starts
    pub supports: Vec<String>,
    /// Line-based allow-list with more trigger annotations
    pub supports_file: Option<PathBuf>,
}

impl Default for WeaveSettings {
    fn default() -> Self {
        Self {
            primary_marker: "weft.aop.Aspect".to_string(),
            strategy_attribute: "builder".to_string(),
            synthetic_prefix: "__weft".to_string(),
            context_type: "weft.aop.AspectContext".to_string(),
            owner_meta_type: "weft.aop.OwnerMeta".to_string(),
            method_meta_type: "weft.aop.MethodMeta".to_string(),
            supports: vec!["weft.aop.Aspect".to_string()],
            supports_file: None,
        }
    }
}

impl WeftConfig {
    /// Load a config from a file. A relative `supports_file` is resolved
    /// against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_str(&content)?;
        if let (Some(file), Some(dir)) = (&config.weave.supports_file, path.parent()) {
            if file.is_relative() {
                config.weave.supports_file = Some(dir.join(file));
            }
        }
        Ok(config)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: WeftConfig = toml::from_str(content)?;
        config.weave.validate()?;
        Ok(config)
    }
}

impl WeaveSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.synthetic_prefix;
        let valid_start = prefix
            .chars()
            .next()
            .is_some_and(|c| c == '_' || c == '$' || c.is_ascii_alphabetic());
        let valid_rest = prefix
            .chars()
            .all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric());
        if !valid_start || !valid_rest {
            return Err(ConfigError::Invalid(format!(
                "synthetic_prefix '{}' is not a valid identifier",
                prefix
            )));
        }

        for (key, value) in [
            ("primary_marker", &self.primary_marker),
            ("strategy_attribute", &self.strategy_attribute),
            ("context_type", &self.context_type),
            ("owner_meta_type", &self.owner_meta_type),
            ("method_meta_type", &self.method_meta_type),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} cannot be empty", key)));
            }
        }
        Ok(())
    }

    /// Build the initial trigger set from `supports` plus the allow-list
    /// file. A missing file is not an error: the set then grows only through
    /// meta-annotation discovery.
    pub fn seed_triggers(&self) -> Result<TriggerSet, ConfigError> {
        let mut triggers = TriggerSet::with_seed(self.supports.iter().cloned());
        if let Some(path) = &self.supports_file {
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    for name in TriggerSet::parse_supports(&content) {
                        triggers.insert(name);
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(
                        path = %path.display(),
                        "no supports file, starting from inline seed"
                    );
                }
                Err(source) => {
                    return Err(ConfigError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(triggers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = WeftConfig::from_str("").unwrap();
        assert_eq!(config.weave, WeaveSettings::default());
    }

    #[test]
    fn partial_weave_table_keeps_other_defaults() {
        let config = WeftConfig::from_str(
            r#"
[weave]
synthetic_prefix = "$aop"
supports = ["com.acme.Timed"]
"#,
        )
        .unwrap();
        assert_eq!(config.weave.synthetic_prefix, "$aop");
        assert_eq!(config.weave.primary_marker, "weft.aop.Aspect");
        assert_eq!(config.weave.supports, vec!["com.acme.Timed".to_string()]);
    }

    #[test]
    fn rejects_bad_prefix() {
        let err = WeftConfig::from_str("[weave]\nsynthetic_prefix = \"9x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("synthetic_prefix")));
    }

    #[test]
    fn supports_file_is_resolved_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut supports = std::fs::File::create(dir.path().join("aspect.supports")).unwrap();
        writeln!(supports, "# extra triggers").unwrap();
        writeln!(supports, "com.acme.Logged").unwrap();
        writeln!(supports).unwrap();
        writeln!(supports, "  com.acme.Retry  ").unwrap();

        let config_path = dir.path().join("weft.toml");
        std::fs::write(&config_path, "[weave]\nsupports_file = \"aspect.supports\"\n").unwrap();

        let config = WeftConfig::from_file(&config_path).unwrap();
        let triggers = config.weave.seed_triggers().unwrap();
        assert!(triggers.contains("com.acme.Logged"));
        assert!(triggers.contains("com.acme.Retry"));
        assert!(triggers.contains("weft.aop.Aspect"));
        assert_eq!(triggers.len(), 3);
    }

    #[test]
    fn missing_supports_file_is_fine() {
        let settings = WeaveSettings {
            supports: vec![],
            supports_file: Some(PathBuf::from("/definitely/not/here.supports")),
            ..WeaveSettings::default()
        };
        assert!(settings.seed_triggers().unwrap().is_empty());
    }
}
