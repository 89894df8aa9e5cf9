use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Remote fetch tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub cache_ttl_minutes: i64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 500,
            cache_ttl_minutes: 10,
        }
    }
}

/// Application settings, read from a YAML file. Every field has a
/// default so a partial file (or none at all) works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upload_dir: PathBuf,
    pub report_dir: PathBuf,
    pub currency: String,
    pub report_title: String,
    pub default_sheet_url: Option<String>,
    /// Files in the upload and report folders older than this are
    /// deleted on startup. Zero disables the sweep.
    pub retention_days: u32,
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            report_dir: PathBuf::from("reports"),
            currency: "MWK".to_string(),
            report_title: "MONTHLY CONTRIBUTIONS REPORT".to_string(),
            default_sheet_url: None,
            retention_days: 7,
            fetch: FetchConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read settings from `path`. A missing file yields the defaults;
    /// a present-but-broken file is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let config = AppConfig::load("/no/such/welfare.yaml")?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.currency, "MWK");
        Ok(())
    }

    #[test]
    fn partial_files_keep_defaults_for_the_rest() -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new()?;
        writeln!(tmp, "currency: USD")?;
        writeln!(tmp, "retention_days: 30")?;
        tmp.flush()?;

        let config = AppConfig::load(tmp.path())?;
        assert_eq!(config.currency, "USD");
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.report_dir, PathBuf::from("reports"));
        assert_eq!(config.fetch.max_retries, 3);
        Ok(())
    }

    #[test]
    fn full_round_trip_through_yaml() -> Result<()> {
        let mut config = AppConfig::default();
        config.default_sheet_url =
            Some("https://docs.google.com/spreadsheets/d/1AbC".to_string());
        config.fetch.cache_ttl_minutes = 42;

        let yaml = serde_yaml::to_string(&config)?;
        let back: AppConfig = serde_yaml::from_str(&yaml)?;
        assert_eq!(config, back);
        Ok(())
    }

    #[test]
    fn broken_files_are_an_error() -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new()?;
        writeln!(tmp, "retention_days: [not a number")?;
        tmp.flush()?;

        assert!(AppConfig::load(tmp.path()).is_err());
        Ok(())
    }
}
