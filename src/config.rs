//! Runtime configuration.
//!
//! Read from `$CONFIG_DIR/pgexec/config.toml` when present. Every field is
//! optional in the file.

use crate::copy::DEFAULT_CHUNK_SIZE;
use crate::error::{ExecError, ExecResult};
use crate::escape::EscapeStyle;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding [`ExecConfig::conninfo`].
pub const CONNINFO_ENV: &str = "PGEXEC_CONNINFO";

/// pgexec configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    /// libpq conninfo string or URI
    pub conninfo: Option<String>,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// Control-character escaping for COPY data
    pub escape_style: EscapeStyle,

    /// Flush threshold for batched COPY rows
    pub copy_chunk_size: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            conninfo: None,
            log_level: "warn".to_string(),
            escape_style: EscapeStyle::Literal,
            copy_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ExecConfig {
    /// Create a new configuration builder
    pub fn builder() -> ExecConfigBuilder {
        ExecConfigBuilder::default()
    }

    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pgexec").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// tried and silently skipped when missing. The environment is applied
    /// last.
    pub fn load(path: Option<&Path>) -> ExecResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.is_file() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> ExecResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExecError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text).map_err(|e| match e {
            ExecError::Config(msg) => ExecError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> ExecResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ExecError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(conninfo) = std::env::var(CONNINFO_ENV) {
            if !conninfo.is_empty() {
                self.conninfo = Some(conninfo);
            }
        }
    }

    fn validate(&self) -> ExecResult<()> {
        if self.copy_chunk_size == 0 {
            return Err(ExecError::Config("copy_chunk_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Builder for ExecConfig
#[derive(Debug, Default)]
pub struct ExecConfigBuilder {
    config: ExecConfig,
}

impl ExecConfigBuilder {
    /// Set the connection string
    pub fn conninfo(mut self, conninfo: impl Into<String>) -> Self {
        self.config.conninfo = Some(conninfo.into());
        self
    }

    /// Set the log filter
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Set the escape style
    pub fn escape_style(mut self, style: EscapeStyle) -> Self {
        self.config.escape_style = style;
        self
    }

    /// Set the COPY flush threshold
    pub fn copy_chunk_size(mut self, size: usize) -> Self {
        self.config.copy_chunk_size = size;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ExecResult<ExecConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExecConfig::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.escape_style, EscapeStyle::Literal);
        assert_eq!(config.copy_chunk_size, 64 * 1024);
    }

    #[test]
    fn test_partial_toml() {
        let config = ExecConfig::from_toml(
            r#"
            conninfo = "host=localhost dbname=gis"
            escape_style = "symbolic"
            "#,
        )
        .unwrap();
        assert_eq!(config.conninfo.as_deref(), Some("host=localhost dbname=gis"));
        assert_eq!(config.escape_style, EscapeStyle::Symbolic);
        assert_eq!(config.copy_chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = ExecConfig::from_toml("colour = true").unwrap_err();
        assert!(matches!(err, ExecError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        assert!(ExecConfig::from_toml("copy_chunk_size = 0").is_err());
        assert!(ExecConfig::builder().copy_chunk_size(0).build().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();
        let config = ExecConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExecConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_builder() {
        let config = ExecConfig::builder()
            .conninfo("dbname=test")
            .log_level("trace")
            .copy_chunk_size(16)
            .build()
            .unwrap();
        assert_eq!(config.conninfo.as_deref(), Some("dbname=test"));
        assert_eq!(config.copy_chunk_size, 16);
    }
}
