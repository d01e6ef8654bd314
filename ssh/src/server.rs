use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use russh::server::{Config, Server};
use shopterm_tui::Services;
use tracing::{info, warn};

use crate::SshError;
use crate::connection::Connection;
use crate::host_key::HostKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub address: String,
    pub port: u16,
    pub host_key_dir: PathBuf,
    pub inactivity_timeout: Duration,
}

/// Accepts SSH connections and gives each one its own shop session.
#[derive(Debug, Clone)]
pub struct SshServer {
    services: Services,
}

impl SshServer {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Listen until the listener fails. Each connection runs on its own task.
    #[tracing::instrument(skip(self, options), fields(address = %options.address, port = options.port))]
    pub async fn serve(mut self, options: ServerOptions) -> Result<(), SshError> {
        let host_key = HostKey::load_or_create(&options.host_key_dir).await?;
        let config = Config {
            inactivity_timeout: Some(options.inactivity_timeout),
            auth_rejection_time: Duration::from_secs(1),
            auth_rejection_time_initial: Some(Duration::from_secs(0)),
            keys: vec![host_key.into_private_key()],
            ..Default::default()
        };

        info!("listening");
        self.run_on_address(Arc::new(config), (options.address.as_str(), options.port))
            .await
            .map_err(SshError::Listen)
    }
}

impl Server for SshServer {
    type Handler = Connection;

    fn new_client(&mut self, peer: Option<SocketAddr>) -> Connection {
        Connection::new(self.services.clone(), peer)
    }

    fn handle_session_error(&mut self, error: SshError) {
        warn!(%error, "connection failed");
    }
}
