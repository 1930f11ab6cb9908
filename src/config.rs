use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "sage-console.toml";
pub const CONFIG_ENV: &str = "SAGE_CONFIG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub listen: SocketAddr,
    /// Browser shell and JSON fixtures.
    pub static_dir: PathBuf,
    /// Base directory for collection locators that are not URLs.
    pub docs_root: PathBuf,
    /// Five-field cron expression for re-loading every collection.
    pub reload_cron: Option<String>,
    pub auth: AuthConfig,
    pub collections: Vec<CollectionConfig>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CollectionConfig {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            static_dir: PathBuf::from("public"),
            docs_root: PathBuf::from("public/specs"),
            reload_cron: None,
            auth: AuthConfig::default(),
            collections: vec![],
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: "admin@sage.dev".to_string(),
            password: "sage-admin".to_string(),
            name: "SAGE Administrator".to_string(),
            role: "admin".to_string(),
        }
    }
}

impl Config {
    /// Reads the file named by `SAGE_CONFIG`, or [`CONFIG_FILE`] in the
    /// working directory. A missing default file yields the defaults.
    pub fn load() -> Result<Config, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::parse_from_file(path),
            None if Path::new(CONFIG_FILE).exists() => Self::parse_from_file(CONFIG_FILE),
            None => {
                tracing::warn!("{} not found, using defaults", CONFIG_FILE);
                Ok(Config::default())
            }
        }
    }

    pub fn parse_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse_from_str(&contents)
    }

    pub fn parse_from_str(contents: &str) -> Result<Config, ConfigError> {
        let mut config: Config = toml::from_str(contents)?;
        config.finish()?;
        Ok(config)
    }

    pub fn collection(&self, id: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|collection| collection.id == id)
    }

    fn finish(&mut self) -> Result<(), ConfigError> {
        for collection in self.collections.iter_mut() {
            if collection.id.is_empty() {
                collection.id = URL_SAFE_NO_PAD.encode(&collection.name);
            }
        }

        for (index, collection) in self.collections.iter().enumerate() {
            if self.collections[..index].iter().any(|other| other.id == collection.id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate collection id `{}`",
                    collection.id
                )));
            }
        }

        if let Some(cron) = &self.reload_cron {
            next_reload(cron, &Utc::now())?;
        }

        Ok(())
    }
}

/// Next occurrence of a five-field cron expression after `after`.
pub fn next_reload(cron: &str, after: &DateTime<Utc>) -> Result<DateTime<Utc>, ConfigError> {
    // cron-parser indexes the fields without checking how many there are.
    let fields = cron.split_whitespace().count();
    if fields != 5 {
        return Err(ConfigError::Invalid(format!(
            "reload_cron `{}`: expected 5 fields, found {}",
            cron, fields
        )));
    }

    cron_parser::parse(cron, after)
        .map_err(|err| ConfigError::Invalid(format!("reload_cron `{}`: {:?}", cron, err)))
}
