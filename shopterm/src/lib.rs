mod config;
mod content;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use shopterm_api::{ApiError, HttpAuthenticator, HttpClient, HttpConnector, StripeTokenizer};
use shopterm_ssh::{ServerOptions, SshError, SshServer};
use shopterm_tui::{Faq, Services};
use thiserror::Error;
use tracing::info;
use url::Url;

pub use crate::config::{Config, ConfigError};
pub use crate::content::{ContentError, load_faqs};

#[derive(Parser, Debug)]
#[command(name = "shopterm", version, about = "A coffee shop served over ssh")]
pub struct Cli {
    /// Config file, or a directory containing shopterm.toml
    #[arg(long = "config", env = "SHOPTERM_CONFIG")]
    pub config_path: Option<PathBuf>,

    #[arg(long = "log", default_value = "info")]
    pub log: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid payments url {url}: {source}")]
    PaymentsUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Ssh(#[from] SshError),

    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

pub async fn get_config(cli: &Cli) -> Result<Config, AppError> {
    let config_path = cli
        .config_path
        .clone()
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let config = Config::load(&config_path).await?;
    Ok(config)
}

/// Wire the remote services every session shares.
pub fn build_services(config: &Config, faqs: Arc<[Faq]>) -> Result<Services, AppError> {
    let http = HttpClient::new()?;
    let payments_url =
        Url::parse(&config.payments.url).map_err(|source| AppError::PaymentsUrl {
            url: config.payments.url.clone(),
            source,
        })?;

    Ok(Services {
        auth: Arc::new(HttpAuthenticator::new(
            http.clone(),
            config.api.auth_url.clone(),
            config.api.app_id.clone(),
            config.api.client_secret.clone(),
        )),
        connector: Arc::new(HttpConnector::new(
            http.clone(),
            config.api.url.clone(),
            config.api.app_id.clone(),
        )),
        tokenizer: Arc::new(StripeTokenizer::new(
            http,
            payments_url,
            config.payments.publishable_key.clone(),
        )),
        faqs,
        shop_name: Arc::from(config.shop.name.as_str()),
    })
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let config = get_config(&cli).await?;
    let faqs = load_faqs(config.shop.faq.as_deref()).await?;
    let services = build_services(&config, faqs)?;
    let options = ServerOptions {
        address: config.ssh.address.clone(),
        port: config.ssh.port,
        host_key_dir: config.ssh.host_key_dir.clone(),
        inactivity_timeout: config.ssh.inactivity_timeout(),
    };

    tokio::select! {
        result = SshServer::new(services).serve(options) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(AppError::Signal)?;
            info!("shutting down");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_level_defaults_to_info() {
        let cli = Cli::try_parse_from(["shopterm", "--config", "/etc/shopterm.toml"]).unwrap();
        assert_eq!(cli.log, "info");
        assert_eq!(cli.config_path, Some(PathBuf::from("/etc/shopterm.toml")));
    }

    #[tokio::test]
    async fn services_carry_the_shop_name_and_faqs() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(config::CONFIG_FILE);
        let config = Config::load(&path).await.unwrap();
        let faqs = load_faqs(None).await.unwrap();
        let count = faqs.len();
        let services = build_services(&config, faqs).unwrap();
        assert_eq!(&*services.shop_name, "terminal");
        assert_eq!(services.faqs.len(), count);
    }

    #[test]
    fn bad_payments_url_is_reported() {
        let config: Config = toml::from_str(
            r#"
            [api]
            url = "https://api.example.com"
            auth_url = "https://auth.example.com"

            [payments]
            url = "not a url"
            publishable_key = "pk_test"
            "#,
        )
        .unwrap();
        let error = build_services(&config, Arc::from(Vec::new())).unwrap_err();
        assert!(matches!(error, AppError::PaymentsUrl { .. }));
    }
}
