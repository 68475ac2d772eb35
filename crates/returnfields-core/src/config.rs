//! Restriction configuration.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default query parameter naming the fields to return.
pub const INCLUDE_KEY: &str = "return_fields";

/// Default query parameter naming the fields to skip.
pub const EXCLUDE_KEY: &str = "skip_fields";

/// Default query parameter requesting fetch-plan optimization.
pub const AGGRESSIVE_KEY: &str = "aggressive";

/// Default token that selects every field.
pub const ALL_TOKEN: &str = "*";

/// Which request parameters drive restriction, and how their values are read.
///
/// Immutable once handed to an engine. Two engines with equal configurations
/// share compiled serializers in a [`crate::SerializerRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictionConfig {
    /// Parameter holding the comma-separated include paths.
    pub include_key: String,
    /// Parameter holding the comma-separated exclude paths.
    pub exclude_key: String,
    /// Parameter whose presence enables fetch-plan optimization.
    pub aggressive_key: String,
    /// Token that stands for every field at its level and below.
    pub all_token: String,
    /// Separator between path segments.
    pub separator: String,
}

impl Default for RestrictionConfig {
    fn default() -> Self {
        Self {
            include_key: INCLUDE_KEY.to_string(),
            exclude_key: EXCLUDE_KEY.to_string(),
            aggressive_key: AGGRESSIVE_KEY.to_string(),
            all_token: ALL_TOKEN.to_string(),
            separator: returnfields_proto::PATH_SEPARATOR.to_string(),
        }
    }
}

impl RestrictionConfig {
    /// The standard configuration: `return_fields`, `skip_fields`,
    /// `aggressive`, `*` and `__`.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Create a configuration with custom include/exclude keys.
    pub fn with_keys(include_key: impl Into<String>, exclude_key: impl Into<String>) -> Self {
        Self {
            include_key: include_key.into(),
            exclude_key: exclude_key.into(),
            ..Default::default()
        }
    }

    /// Set the include key.
    pub fn with_include_key(mut self, key: impl Into<String>) -> Self {
        self.include_key = key.into();
        self
    }

    /// Set the exclude key.
    pub fn with_exclude_key(mut self, key: impl Into<String>) -> Self {
        self.exclude_key = key.into();
        self
    }

    /// Set the aggressive key.
    pub fn with_aggressive_key(mut self, key: impl Into<String>) -> Self {
        self.aggressive_key = key.into();
        self
    }

    /// Set the ALL token.
    pub fn with_all_token(mut self, token: impl Into<String>) -> Self {
        self.all_token = token.into();
        self
    }

    /// Set the path separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Load a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot be interpreted unambiguously.
    pub fn validate(&self) -> Result<(), Error> {
        let keys = [
            ("include_key", &self.include_key),
            ("exclude_key", &self.exclude_key),
            ("aggressive_key", &self.aggressive_key),
        ];
        for (label, key) in keys {
            if key.trim().is_empty() {
                return Err(Error::Configuration(format!("{label} must not be empty")));
            }
        }
        if self.include_key == self.exclude_key {
            return Err(Error::Configuration(format!(
                "include and exclude keys are both {:?}",
                self.include_key
            )));
        }
        if self.aggressive_key == self.include_key || self.aggressive_key == self.exclude_key {
            return Err(Error::Configuration(format!(
                "aggressive key {:?} collides with an include/exclude key",
                self.aggressive_key
            )));
        }
        if self.separator.is_empty() || self.separator.contains(',') {
            return Err(Error::Configuration(format!(
                "invalid path separator {:?}",
                self.separator
            )));
        }
        if self.all_token.trim().is_empty()
            || self.all_token.contains(',')
            || self.all_token.contains(self.separator.as_str())
        {
            return Err(Error::Configuration(format!(
                "invalid ALL token {:?}",
                self.all_token
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_config() {
        let config = RestrictionConfig::standard();
        assert_eq!(config.include_key, "return_fields");
        assert_eq!(config.exclude_key, "skip_fields");
        assert_eq!(config.aggressive_key, "aggressive");
        assert_eq!(config.separator, "__");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_conflicting_keys_rejected() {
        let config = RestrictionConfig::with_keys("fields", "fields");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = RestrictionConfig::standard().with_aggressive_key("skip_fields");
        assert!(config.validate().is_err());

        let config = RestrictionConfig::standard().with_include_key("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_tokens_rejected() {
        assert!(RestrictionConfig::standard().with_separator("").validate().is_err());
        assert!(RestrictionConfig::standard().with_all_token("a,b").validate().is_err());
        assert!(RestrictionConfig::standard().with_all_token("a__b").validate().is_err());
        assert!(RestrictionConfig::standard().with_all_token(":all:").validate().is_ok());
    }

    #[test]
    fn test_from_json_defaults() {
        let config =
            RestrictionConfig::from_json(r#"{"include_key": "include", "exclude_key": "exclude"}"#)
                .unwrap();
        assert_eq!(config.include_key, "include");
        assert_eq!(config.exclude_key, "exclude");
        assert_eq!(config.aggressive_key, "aggressive");

        assert!(RestrictionConfig::from_json(r#"{"include_key": "skip_fields"}"#).is_err());
        assert!(RestrictionConfig::from_json("not json").is_err());
    }
}
