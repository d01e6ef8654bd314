use std::fmt::{self, Debug};

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::ApiError;
use crate::http::{HttpClient, join_url};

/// Raw card fields, handed to the payment provider exactly once.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub name: String,
    pub number: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvc: String,
    pub zip: String,
}

impl Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last4 = self
            .number
            .get(self.number.len().saturating_sub(4)..)
            .unwrap_or_default();
        f.debug_struct("CardDetails")
            .field("name", &self.name)
            .field("last4", &last4)
            .finish_non_exhaustive()
    }
}

/// Turns raw card fields into an opaque single-use token.
#[async_trait]
pub trait PaymentTokenizer: Send + Sync + Debug {
    async fn tokenize(&self, card: CardDetails) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct StripeTokenizer {
    http: HttpClient,
    url: Url,
    publishable_key: String,
}

impl Debug for StripeTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeTokenizer")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

impl StripeTokenizer {
    pub fn new(http: HttpClient, url: Url, publishable_key: impl Into<String>) -> Self {
        Self {
            http,
            url,
            publishable_key: publishable_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    id: String,
}

#[async_trait]
impl PaymentTokenizer for StripeTokenizer {
    #[tracing::instrument(skip(self))]
    async fn tokenize(&self, card: CardDetails) -> Result<String, ApiError> {
        let url = join_url(&self.url, "v1/tokens")?;
        let exp_month = card.exp_month.to_string();
        let exp_year = card.exp_year.to_string();
        let form = [
            ("card[name]", card.name.as_str()),
            ("card[number]", card.number.as_str()),
            ("card[exp_month]", exp_month.as_str()),
            ("card[exp_year]", exp_year.as_str()),
            ("card[cvc]", card.cvc.as_str()),
            ("card[address_zip]", card.zip.as_str()),
        ];
        let request = self
            .http
            .request(Method::POST, url)
            .basic_auth(&self.publishable_key, None::<&str>)
            .form(&form);
        let response: TokenResponse = self.http.send(request).await.map_err(|error| match error {
            ApiError::Remote { message, .. } => ApiError::Rejected(message),
            other => other,
        })?;
        debug!("tokenized card");
        Ok(response.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_card_number() {
        let card = CardDetails {
            name: "ada".into(),
            number: "4242424242424242".into(),
            exp_month: 4,
            exp_year: 29,
            cvc: "123".into(),
            zip: "90210".into(),
        };
        let debug = format!("{card:?}");
        assert!(debug.contains("4242"));
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("123"));
    }
}
