//! Configuration file handling for the CLI.
//!
//! Settings live in `$XDG_CONFIG_HOME/netdeck/config.toml`; table preferences
//! (visible columns, user scope) in `$XDG_DATA_HOME/netdeck/storage.json`.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context as _, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use netdeck_business::BusinessConfig;

/// CLI configuration stored on disk
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tables: TablesConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: Option<String>,
    /// Sent verbatim as the `Authorization` header
    pub authorization: Option<String>,
    /// Login used for "only my rows"
    pub user: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TablesConfig {
    pub page_size: Option<usize>,
    pub search_debounce_ms: Option<u64>,
    pub search_notification: Option<bool>,
    /// Seconds between `watch` refreshes, per entity type
    #[serde(default)]
    pub refresh_rates: BTreeMap<String, u64>,
    /// JSON document replacing the column lists of some entities
    pub properties: Option<PathBuf>,
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("org", "netdeck", "netdeck").context("Failed to determine project directories")
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where table preferences are persisted between runs.
    pub fn storage_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("storage.json"))
    }

    /// Load configuration from disk.
    ///
    /// Returns default configuration if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Business settings from this file alone; environment overrides come later.
    pub fn business_config(&self) -> Result<BusinessConfig> {
        let mut config = match &self.server.url {
            Some(url) => BusinessConfig::new(url.clone()),
            None => BusinessConfig::default(),
        };
        config.authorization.clone_from(&self.server.authorization);
        config.current_user.clone_from(&self.server.user);

        match self.tables.page_size {
            Some(0) => bail!("tables.page_size must be greater than zero"),
            Some(size) => config.page_size = size,
            None => {}
        }
        if let Some(ms) = self.tables.search_debounce_ms {
            config.search_debounce_ms = ms;
        }
        if let Some(flag) = self.tables.search_notification {
            config.search_notification = flag;
        }
        for (entity, seconds) in &self.tables.refresh_rates {
            if *seconds == 0 {
                bail!("Refresh rate for `{entity}` must be greater than zero");
            }
            config
                .refresh_rates
                .insert(Ustr::from(entity), Duration::from_secs(*seconds));
        }

        Ok(config)
    }

    /// Contents of the table-properties document, if one is configured.
    pub fn table_properties(&self) -> Result<Option<String>> {
        self.tables
            .properties
            .as_ref()
            .map(|path| {
                fs::read_to_string(path).with_context(|| {
                    format!("Failed to read table properties: {}", path.display())
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_the_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.server.url.is_none());
        assert!(config.tables.refresh_rates.is_empty());

        let business = config.business_config().unwrap();
        assert_eq!(business, BusinessConfig::default());
    }

    #[test]
    fn file_settings_reach_the_business_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
url = "https://nms.example"
user = "admin"

[tables]
page_size = 25
search_notification = true

[tables.refresh_rates]
run = 10
"#,
        )
        .unwrap();

        let business = Config::load_from(&path)
            .unwrap()
            .business_config()
            .unwrap();
        assert_eq!(business.server_url, "https://nms.example");
        assert_eq!(business.current_user.as_deref(), Some("admin"));
        assert_eq!(business.page_size, 25);
        assert!(business.search_notification);
        assert_eq!(business.refresh_rate("run"), Some(Duration::from_secs(10)));
        assert_eq!(business.refresh_rate("device"), None);
    }

    #[test]
    fn zero_values_are_rejected() {
        let mut config = Config::default();
        config.tables.page_size = Some(0);
        assert!(config.business_config().is_err());

        let mut config = Config::default();
        config.tables.refresh_rates.insert("run".to_owned(), 0);
        assert!(config.business_config().is_err());
    }

    #[test]
    fn unparsable_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nurl = 1").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn table_properties_are_read_from_the_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("properties.json");
        fs::write(&path, r#"{"device": []}"#).unwrap();

        let mut config = Config::default();
        assert!(config.table_properties().unwrap().is_none());
        config.tables.properties = Some(path);
        assert_eq!(
            config.table_properties().unwrap().as_deref(),
            Some(r#"{"device": []}"#)
        );
    }
}
