use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::{
    Address, AddressInput, ApiError, App, AppInput, Card, Cart, ClientOptions, Connector,
    InitialData, NewApp, NewToken, Order, Product, Profile, ShopApi, Subscription,
    SubscriptionInput, Token,
};

const REQUEST_TIMEOUT_SEC: u64 = 10;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .read_timeout(Duration::from_secs(REQUEST_TIMEOUT_SEC))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(ApiError::BuildClient)?;
        Ok(HttpClient { client })
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a request and decode a JSON body, turning non-success statuses into `ApiError::Remote`.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::Request)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::Request)?;
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(ApiError::Decode)
    }
}

pub(crate) fn join_url(base: &Url, path: &str) -> Result<Url, ApiError> {
    base.join(path).map_err(|source| ApiError::Url {
        url: format!("{base}{path}"),
        source,
    })
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

/// `ShopApi` over the commerce REST API.
#[derive(Debug, Clone)]
pub struct HttpShopApi {
    http: HttpClient,
    base_url: Url,
    app_id: String,
    options: ClientOptions,
}

impl HttpShopApi {
    pub fn new(http: HttpClient, base_url: Url, app_id: String, options: ClientOptions) -> Self {
        Self {
            http,
            base_url,
            app_id,
            options,
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = join_url(&self.base_url, path)?;
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.options.access_token)
            .header("x-terminal-app-id", &self.app_id);
        if let Some(ip) = &self.options.client_ip {
            request = request.header("x-terminal-ip", ip);
        }
        if let Some(region) = self.options.region {
            request = request.header("x-terminal-region", region.as_str());
        }
        Ok(request)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.http.send(request).await?;
        Ok(envelope.data)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        self.call(self.request(Method::GET, path)?).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        debug!(path, "DELETE");
        let _: Value = self.call(self.request(Method::DELETE, path)?).await?;
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<T, ApiError> {
        debug!(path, %method, "send");
        self.call(self.request(method, path)?.json(body)).await
    }
}

#[async_trait]
impl ShopApi for HttpShopApi {
    async fn view_init(&self) -> Result<InitialData, ApiError> {
        self.get("view/init").await
    }

    async fn profile_update(&self, name: &str, email: &str) -> Result<Profile, ApiError> {
        self.send_json(
            Method::PUT,
            "profile",
            &json!({ "name": name, "email": email }),
        )
        .await
    }

    async fn product_list(&self) -> Result<Vec<Product>, ApiError> {
        self.get("product").await
    }

    async fn cart_get(&self) -> Result<Cart, ApiError> {
        self.get("cart").await
    }

    async fn cart_set_item(&self, variant_id: &str, quantity: u32) -> Result<Cart, ApiError> {
        self.send_json(
            Method::PUT,
            "cart/item",
            &json!({ "productVariantID": variant_id, "quantity": quantity }),
        )
        .await
    }

    async fn cart_set_address(&self, address_id: &str) -> Result<(), ApiError> {
        let _: Value = self
            .send_json(
                Method::PUT,
                "cart/address",
                &json!({ "addressID": address_id }),
            )
            .await?;
        Ok(())
    }

    async fn cart_set_card(&self, card_id: &str) -> Result<(), ApiError> {
        let _: Value = self
            .send_json(Method::PUT, "cart/card", &json!({ "cardID": card_id }))
            .await?;
        Ok(())
    }

    async fn cart_clear(&self) -> Result<(), ApiError> {
        self.delete("cart").await
    }

    async fn cart_convert(&self) -> Result<Order, ApiError> {
        self.send_json(Method::POST, "cart/convert", &json!({})).await
    }

    async fn address_list(&self) -> Result<Vec<Address>, ApiError> {
        self.get("address").await
    }

    async fn address_create(&self, address: &AddressInput) -> Result<String, ApiError> {
        let body = serde_json::to_value(address).map_err(ApiError::Decode)?;
        let created: Value = self.send_json(Method::POST, "address", &body).await?;
        created_id(created)
    }

    async fn address_delete(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("address/{id}")).await
    }

    async fn card_list(&self) -> Result<Vec<Card>, ApiError> {
        self.get("card").await
    }

    async fn card_create(&self, token: &str) -> Result<String, ApiError> {
        let created: Value = self
            .send_json(Method::POST, "card", &json!({ "token": token }))
            .await?;
        created_id(created)
    }

    async fn card_delete(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("card/{id}")).await
    }

    async fn card_collect(&self) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        struct Collect {
            url: String,
        }
        let collect: Collect = self
            .send_json(Method::POST, "card/collect", &json!({}))
            .await?;
        Ok(collect.url)
    }

    async fn subscription_list(&self) -> Result<Vec<Subscription>, ApiError> {
        self.get("subscription").await
    }

    async fn subscription_create(&self, subscription: &SubscriptionInput) -> Result<(), ApiError> {
        let body = serde_json::to_value(subscription).map_err(ApiError::Decode)?;
        let _: Value = self.send_json(Method::POST, "subscription", &body).await?;
        Ok(())
    }

    async fn subscription_delete(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("subscription/{id}")).await
    }

    async fn token_list(&self) -> Result<Vec<Token>, ApiError> {
        self.get("token").await
    }

    async fn token_create(&self) -> Result<NewToken, ApiError> {
        self.send_json(Method::POST, "token", &json!({})).await
    }

    async fn token_delete(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("token/{id}")).await
    }

    async fn app_list(&self) -> Result<Vec<App>, ApiError> {
        self.get("app").await
    }

    async fn app_create(&self, app: &AppInput) -> Result<NewApp, ApiError> {
        let body = serde_json::to_value(app).map_err(ApiError::Decode)?;
        self.send_json(Method::POST, "app", &body).await
    }

    async fn app_delete(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("app/{id}")).await
    }

    async fn order_list(&self) -> Result<Vec<Order>, ApiError> {
        self.get("order").await
    }
}

// Create endpoints answer with either a bare id or `{ "id": ... }`.
fn created_id(value: Value) -> Result<String, ApiError> {
    match value {
        Value::String(id) => Ok(id),
        other => serde_json::from_value::<Created>(other)
            .map(|created| created.id)
            .map_err(ApiError::Decode),
    }
}

/// Builds `HttpShopApi` clients sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: HttpClient,
    base_url: Url,
    app_id: String,
}

impl HttpConnector {
    pub fn new(http: HttpClient, base_url: Url, app_id: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            app_id: app_id.into(),
        }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, options: ClientOptions) -> Arc<dyn ShopApi> {
        debug!(region = ?options.region, "connecting api client");
        Arc::new(HttpShopApi::new(
            self.http.clone(),
            self.base_url.clone(),
            self.app_id.clone(),
            options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_id_accepts_both_shapes() {
        assert_eq!(created_id(json!("adr_1")).unwrap(), "adr_1");
        assert_eq!(created_id(json!({ "id": "crd_1" })).unwrap(), "crd_1");
        assert!(created_id(json!(42)).is_err());
    }

    #[test]
    fn join_url_keeps_base_path() {
        let base = Url::parse("https://api.example.com/v1/").unwrap();
        let url = join_url(&base, "cart/item").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/cart/item");
    }

    #[test]
    fn envelope_unwraps_data() {
        let envelope: Envelope<Vec<Token>> =
            serde_json::from_str(r#"{"data":[{"id":"pat_1","token":"trm_****"}]}"#).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].id, "pat_1");
    }
}
