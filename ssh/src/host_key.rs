use std::path::{Path, PathBuf};

use base64ct::LineEnding;
use russh::keys::PrivateKey;
use russh::keys::ssh_key::HashAlg;
use russh::keys::ssh_key::private::Ed25519Keypair;
use russh::keys::ssh_key::rand_core::OsRng;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Error, Debug)]
pub enum HostKeyError {
    #[error("failed to encode or decode host key {path}: {source}")]
    Key {
        path: PathBuf,
        #[source]
        source: russh::keys::ssh_key::Error,
    },

    #[error("failed to access host key {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const HOST_KEY_FILE: &str = "ssh_host_ed25519_key";

/// The server's ed25519 identity, persisted in OpenSSH format so clients see
/// the same host key across restarts.
#[derive(Clone, Debug)]
pub struct HostKey {
    private_key: PrivateKey,
}

impl HostKey {
    /// Load the key from `directory`, generating and saving one on first start.
    #[tracing::instrument(skip_all, fields(directory = %directory.display()))]
    pub async fn load_or_create(directory: &Path) -> Result<Self, HostKeyError> {
        let path = directory.join(HOST_KEY_FILE);
        let exists = fs::try_exists(&path).await.map_err(|source| HostKeyError::Io {
            path: path.clone(),
            source,
        })?;
        let host_key = if exists {
            Self::load(&path).await?
        } else {
            let host_key = Self::generate();
            host_key.save(directory, &path).await?;
            host_key
        };
        info!(fingerprint = %host_key.fingerprint(), "host key ready");
        Ok(host_key)
    }

    pub fn generate() -> Self {
        let keypair = Ed25519Keypair::random(&mut OsRng);
        Self {
            private_key: PrivateKey::from(keypair),
        }
    }

    pub fn fingerprint(&self) -> String {
        self.private_key
            .public_key()
            .fingerprint(HashAlg::Sha256)
            .to_string()
    }

    pub fn into_private_key(self) -> PrivateKey {
        self.private_key
    }

    async fn load(path: &Path) -> Result<Self, HostKeyError> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|source| HostKeyError::Io {
                path: path.to_owned(),
                source,
            })?;
        let private_key =
            PrivateKey::from_openssh(&contents).map_err(|source| HostKeyError::Key {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self { private_key })
    }

    async fn save(&self, directory: &Path, path: &Path) -> Result<(), HostKeyError> {
        let io_error = |source| HostKeyError::Io {
            path: path.to_owned(),
            source,
        };
        fs::create_dir_all(directory).await.map_err(io_error)?;
        let encoded = self
            .private_key
            .to_openssh(LineEnding::LF)
            .map_err(|source| HostKeyError::Key {
                path: path.to_owned(),
                source,
            })?;

        let mut file = private_file(path).await.map_err(io_error)?;
        file.write_all(encoded.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        Ok(())
    }
}

#[cfg(unix)]
async fn private_file(path: &Path) -> Result<fs::File, std::io::Error> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .await
}

#[cfg(not(unix))]
async fn private_file(path: &Path) -> Result<fs::File, std::io::Error> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}
