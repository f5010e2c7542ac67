use serde::Deserialize;
use validator::Validate;

/// How codes missing from the tables are reported. Codes in the 500+
/// exchange-specific range are always accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownEnumPolicy {
    /// Report as a warning; later revisions of the tables add codes.
    #[default]
    Warn,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub unknown_enums: UnknownEnumPolicy,
    /// Turn the missing `w`/`wmin` or `h`/`hmin` warning into an error.
    pub require_image_dimensions: bool,
    /// Warn about `imptrackers` and `jstracker`.
    pub report_deprecated: bool,
    #[validate(range(min = 1))]
    pub max_assets: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            unknown_enums: UnknownEnumPolicy::Warn,
            require_image_dimensions: false,
            report_deprecated: true,
            max_assets: 64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct NativeConfig {
    #[serde(default)]
    #[validate(nested)]
    pub validation: ValidationConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation error: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

impl NativeConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: NativeConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
