use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::ApiError;
use crate::http::{HttpClient, join_url};

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct UserCredentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials").finish_non_exhaustive()
    }
}

/// Exchanges a connection fingerprint for an access credential.
#[async_trait]
pub trait Authenticator: Send + Sync + Debug {
    async fn fetch_user_token(&self, fingerprint: &str) -> Result<UserCredentials, ApiError>;
}

#[derive(Clone)]
pub struct HttpAuthenticator {
    http: HttpClient,
    auth_url: Url,
    client_id: String,
    client_secret: String,
}

impl Debug for HttpAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthenticator")
            .field("auth_url", &self.auth_url.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl HttpAuthenticator {
    pub fn new(
        http: HttpClient,
        auth_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    #[tracing::instrument(skip(self))]
    async fn fetch_user_token(&self, fingerprint: &str) -> Result<UserCredentials, ApiError> {
        let url = join_url(&self.auth_url, "token")?;
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("fingerprint", fingerprint),
            ("provider", self.client_id.as_str()),
        ];
        let request = self.http.request(Method::POST, url).form(&form);
        let credentials: UserCredentials = self.http.send(request).await?;
        debug!("fetched user token");
        Ok(credentials)
    }
}
