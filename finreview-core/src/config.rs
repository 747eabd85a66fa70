//! Configuration for the finreview service
//!
//! Loaded from `~/.finreview/config.toml` (or an explicit path). Every field
//! has a default, so a missing default file is not an error. Environment
//! variables override the file:
//!
//! - `DATABASE_URL` → `database.url`
//! - `FINREVIEW_BIND` → `server.bind`

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FinreviewError, Result};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinreviewConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub analysis: AnalysisSection,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind, e.g. "127.0.0.1:3030"
    pub bind: String,
    /// Allow any CORS origin (default: localhost only)
    pub cors_permissive: bool,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3030".to_string(),
            cors_permissive: false,
            request_timeout_secs: 30,
        }
    }
}

/// Database pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// PostgreSQL connection string
    pub url: Option<String>,
    /// Pool size. Kept low, the service is a single-team tool.
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

/// Thresholds for the variance heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Absolute period-over-period change that flags an anomaly
    pub min_abs_change: f64,
    /// Percentage change that flags an anomaly
    pub min_pct_change: f64,
    /// |z-score| above which an account's change is an outlier
    pub zscore_threshold: f64,
    /// Debits and credits closer than this count as balanced
    pub balance_tolerance: f64,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            min_abs_change: 10_000.0,
            min_pct_change: 20.0,
            zscore_threshold: 3.0,
            balance_tolerance: 0.005,
        }
    }
}

impl FinreviewConfig {
    /// Default config location: `~/.finreview/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".finreview")
            .join("config.toml")
    }

    /// Load configuration and apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// if present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| FinreviewError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| FinreviewError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(bind) = lookup("FINREVIEW_BIND").filter(|v| !v.trim().is_empty()) {
            self.server.bind = bind;
        }
    }

    /// Semantic checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.database.max_connections == 0 {
            return Err(FinreviewError::config(
                "database.max_connections must be at least 1",
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(FinreviewError::config(
                "server.request_timeout_secs must be at least 1",
            ));
        }

        let a = &self.analysis;
        for (name, value) in [
            ("analysis.min_abs_change", a.min_abs_change),
            ("analysis.min_pct_change", a.min_pct_change),
            ("analysis.zscore_threshold", a.zscore_threshold),
            ("analysis.balance_tolerance", a.balance_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(FinreviewError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Parsed bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|_| {
            FinreviewError::config(format!(
                "server.bind is not a valid socket address: '{}'",
                self.server.bind
            ))
        })
    }

    /// Render as TOML (used by `finreview check-config`).
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let config = FinreviewConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().unwrap().port(), 3030);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[analysis]\nmin_pct_change = 15.0\n\n[database]\nurl = \"postgres://localhost/finreview\""
        )
        .unwrap();

        let config = FinreviewConfig::from_file(file.path()).unwrap();
        assert_eq!(config.analysis.min_pct_change, 15.0);
        assert_eq!(config.analysis.min_abs_change, 10_000.0);
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://localhost/finreview")
        );
        assert_eq!(config.server, ServerSection::default());
    }

    #[test]
    fn invalid_toml_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = 1").unwrap();

        let err = FinreviewConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, FinreviewError::Toml { .. }));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = FinreviewConfig::load(Some(Path::new("/nonexistent/finreview.toml"))).unwrap_err();
        assert!(matches!(err, FinreviewError::Io { .. }));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = FinreviewConfig::default();
        config.apply_overrides(|key| match key {
            "DATABASE_URL" => Some("postgres://db/other".to_string()),
            "FINREVIEW_BIND" => Some("0.0.0.0:8080".to_string()),
            _ => None,
        });

        assert_eq!(config.database.url.as_deref(), Some("postgres://db/other"));
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = FinreviewConfig::default();
        config.apply_overrides(|_| Some("   ".to_string()));
        assert!(config.database.url.is_none());
        assert_eq!(config.server.bind, "127.0.0.1:3030");
    }

    #[test]
    fn rejects_bad_bind() {
        let mut config = FinreviewConfig::default();
        config.server.bind = "not-an-address".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            FinreviewError::Config { .. }
        ));
    }

    #[test]
    fn rejects_negative_threshold() {
        let mut config = FinreviewConfig::default();
        config.analysis.zscore_threshold = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("analysis.zscore_threshold"));
    }

    #[test]
    fn rejects_zero_pool() {
        let mut config = FinreviewConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_roundtrip_preserves_values() {
        let mut config = FinreviewConfig::default();
        config.server.cors_permissive = true;
        let rendered = config.to_toml_string().unwrap();
        let parsed: FinreviewConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
