use crate::constants::ENV_NAME_STYLE_VAR;
use crate::error::{ManifestError, Result};
use std::str::FromStr;

/// How a relatedImage name is derived from a `RELATED_IMAGE_<SUFFIX>` env var.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvNameStyle {
    /// `RELATED_IMAGE_OPERAND_V1` -> `operand_v1`
    #[default]
    Lowercase,
    /// `RELATED_IMAGE_OPERAND_V1` -> `OPERAND_V1`
    Verbatim,
    /// `RELATED_IMAGE_OPERAND_V1` -> `operand-v1`
    Kebab,
}

impl EnvNameStyle {
    pub fn derive(&self, suffix: &str) -> String {
        match self {
            EnvNameStyle::Lowercase => suffix.to_lowercase(),
            EnvNameStyle::Verbatim => suffix.to_string(),
            EnvNameStyle::Kebab => suffix.to_lowercase().replace('_', "-"),
        }
    }
}

impl FromStr for EnvNameStyle {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowercase" => Ok(EnvNameStyle::Lowercase),
            "verbatim" => Ok(EnvNameStyle::Verbatim),
            "kebab" => Ok(EnvNameStyle::Kebab),
            _ => Err(ManifestError::InvalidConfig {
                key: ENV_NAME_STYLE_VAR.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Per-document processing options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvConfig {
    pub env_name_style: EnvNameStyle,
}

impl CsvConfig {
    /// Defaults, overridden by `BUNDLEPIN_ENV_NAME_STYLE` when set
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(style) = lookup(ENV_NAME_STYLE_VAR) {
            config.env_name_style = style.parse()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_styles() {
        assert_eq!(EnvNameStyle::Lowercase.derive("CE1"), "ce1");
        assert_eq!(EnvNameStyle::Verbatim.derive("CE1"), "CE1");
        assert_eq!(EnvNameStyle::Kebab.derive("OPERAND_V1"), "operand-v1");
    }

    #[test]
    fn test_parse_style() {
        assert_eq!("kebab".parse::<EnvNameStyle>().unwrap(), EnvNameStyle::Kebab);
        assert_eq!(" Verbatim ".parse::<EnvNameStyle>().unwrap(), EnvNameStyle::Verbatim);

        let err = "shouting".parse::<EnvNameStyle>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value 'shouting' for BUNDLEPIN_ENV_NAME_STYLE"
        );
    }

    #[test]
    fn test_from_vars() {
        let config = CsvConfig::from_vars(|key| {
            (key == ENV_NAME_STYLE_VAR).then(|| "verbatim".to_string())
        })
        .unwrap();
        assert_eq!(config.env_name_style, EnvNameStyle::Verbatim);

        assert_eq!(CsvConfig::from_vars(|_| None).unwrap(), CsvConfig::default());
        assert!(CsvConfig::from_vars(|_| Some("shouting".to_string())).is_err());
    }
}
