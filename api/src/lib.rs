mod account;
mod auth;
mod cart;
mod error;
mod http;
mod order;
mod payment;
mod product;

pub use crate::account::{
    Address, AddressInput, App, AppInput, Card, CardExpiration, NewApp, NewToken, Profile, Region,
    Schedule, Subscription, SubscriptionInput, Token, User,
};
pub use crate::auth::{Authenticator, HttpAuthenticator, UserCredentials};
pub use crate::cart::{Cart, CartAmount, CartItem, CartShipping};
pub use crate::error::ApiError;
pub use crate::http::{HttpClient, HttpConnector, HttpShopApi};
pub use crate::order::{Order, OrderAmount, OrderItem, OrderShipping, Tracking};
pub use crate::payment::{CardDetails, PaymentTokenizer, StripeTokenizer};
pub use crate::product::{
    Product, ProductTags, ProductVariant, SubscriptionMode, featured_first, find_variant,
};

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything a session needs to render its first page, fetched in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialData {
    pub profile: Profile,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub cart: Cart,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub apps: Vec<App>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub region: Option<Region>,
}

/// Typed operations against the commerce API, bound to one user's credential.
#[async_trait]
pub trait ShopApi: Send + Sync + Debug {
    async fn view_init(&self) -> Result<InitialData, ApiError>;

    async fn profile_update(&self, name: &str, email: &str) -> Result<Profile, ApiError>;

    async fn product_list(&self) -> Result<Vec<Product>, ApiError>;

    async fn cart_get(&self) -> Result<Cart, ApiError>;
    async fn cart_set_item(&self, variant_id: &str, quantity: u32) -> Result<Cart, ApiError>;
    async fn cart_set_address(&self, address_id: &str) -> Result<(), ApiError>;
    async fn cart_set_card(&self, card_id: &str) -> Result<(), ApiError>;
    async fn cart_clear(&self) -> Result<(), ApiError>;
    async fn cart_convert(&self) -> Result<Order, ApiError>;

    async fn address_list(&self) -> Result<Vec<Address>, ApiError>;
    async fn address_create(&self, address: &AddressInput) -> Result<String, ApiError>;
    async fn address_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn card_list(&self) -> Result<Vec<Card>, ApiError>;
    async fn card_create(&self, token: &str) -> Result<String, ApiError>;
    async fn card_delete(&self, id: &str) -> Result<(), ApiError>;
    /// Start a provider-hosted card collection and return its URL.
    async fn card_collect(&self) -> Result<String, ApiError>;

    async fn subscription_list(&self) -> Result<Vec<Subscription>, ApiError>;
    async fn subscription_create(&self, subscription: &SubscriptionInput) -> Result<(), ApiError>;
    async fn subscription_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn token_list(&self) -> Result<Vec<Token>, ApiError>;
    async fn token_create(&self) -> Result<NewToken, ApiError>;
    async fn token_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn app_list(&self) -> Result<Vec<App>, ApiError>;
    async fn app_create(&self, app: &AppInput) -> Result<NewApp, ApiError>;
    async fn app_delete(&self, id: &str) -> Result<(), ApiError>;

    async fn order_list(&self) -> Result<Vec<Order>, ApiError>;
}

/// Per-session parameters for building an API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub access_token: String,
    pub client_ip: Option<String>,
    pub region: Option<Region>,
}

/// Builds API clients. A region change replaces the client wholesale.
pub trait Connector: Send + Sync + Debug {
    fn connect(&self, options: ClientOptions) -> Arc<dyn ShopApi>;
}
