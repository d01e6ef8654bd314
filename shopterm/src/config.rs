use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tokio::fs::{read_to_string, try_exists};
use url::Url;

pub const CONFIG_FILE: &str = "shopterm.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found at: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ssh: SshConfig,
    pub api: ApiConfig,
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub shop: ShopConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    pub address: String,
    pub port: u16,
    pub host_key_dir: PathBuf,
    pub inactivity_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_owned(),
            port: 2222,
            host_key_dir: default_data_dir(),
            inactivity_timeout_secs: 3600,
        }
    }
}

impl SshConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub url: Url,
    pub auth_url: Url,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_app_id")]
    pub app_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    #[serde(default = "default_payments_url")]
    pub url: String,
    pub publishable_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub name: String,
    pub faq: Option<PathBuf>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: "terminal".to_owned(),
            faq: None,
        }
    }
}

fn default_app_id() -> String {
    "ssh".to_owned()
}

fn default_payments_url() -> String {
    "https://api.stripe.com".to_owned()
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("shop", "shopterm", "shopterm")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".shopterm"))
}

impl Config {
    /// Load from `path`, or from `shopterm.toml` inside it when it is a directory, then
    /// apply environment overrides.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = if path.is_dir() {
            path.join(CONFIG_FILE)
        } else {
            path.to_owned()
        };
        let exists = try_exists(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        if !exists {
            return Err(ConfigError::NotFound(path));
        }
        let string = read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let mut config = Self::parse(&string, &path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        if let Some(faq) = &config.shop.faq {
            if faq.is_relative() {
                if let Some(parent) = path.parent() {
                    config.shop.faq = Some(parent.join(faq));
                }
            }
        }
        Ok(config)
    }

    fn parse(string: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(string).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// `SSH_PORT` and `SHOPTERM_CLIENT_SECRET` take precedence over the file.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(port) = var("SSH_PORT") {
            self.ssh.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "SSH_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(secret) = var("SHOPTERM_CLIENT_SECRET") {
            self.api.client_secret = secret;
        }
        Ok(())
    }
}
