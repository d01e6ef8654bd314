use std::sync::Arc;

use crossterm::event::KeyEvent;
use shopterm_api::{
    Address, ApiError, App, Card, Cart, InitialData, NewApp, NewToken, Order, Profile, ShopApi,
    Subscription, Token,
};

/// Every event the session consumes: terminal input or a command result.
#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },

    SignedIn(Result<SignedIn, ApiError>),
    SplashDelayElapsed,
    InitialData(Result<InitialData, ApiError>),
    RegionChanged(Result<InitialData, ApiError>),

    CartUpdated { token: u64, result: Result<Cart, ApiError> },
    CartRefetched { token: u64, result: Result<Cart, ApiError> },

    AddressSelected(Result<AddressSelected, ApiError>),
    CardSelected(Result<CardSelected, ApiError>),
    ProfileUpdated(Result<Profile, ApiError>),
    PaymentLinkCreated {
        generation: u64,
        result: Result<String, ApiError>,
    },
    PaymentLinkPolled {
        generation: u64,
        card_count: usize,
        result: Result<Vec<Card>, ApiError>,
    },

    OrderPlaced(Result<Order, ApiError>),
    SubscriptionPlaced(Result<Vec<Subscription>, ApiError>),
    RecurringCreated(Result<Vec<Subscription>, ApiError>),

    TokenCreated(Result<(NewToken, Vec<Token>), ApiError>),
    AppCreated(Result<(NewApp, Vec<App>), ApiError>),

    Deleted { resource: Resource, result: Result<Collection, ApiError> },
}

pub struct SignedIn {
    pub access_token: String,
    pub api: Arc<dyn ShopApi>,
}

impl std::fmt::Debug for SignedIn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedIn").field("api", &self.api).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AddressSelected {
    pub address_id: String,
    pub addresses: Option<Vec<Address>>,
    pub cart: Option<Cart>,
}

#[derive(Debug, Clone)]
pub struct CardSelected {
    pub card_id: String,
    pub cards: Option<Vec<Card>>,
}

/// Account resources that can be listed and deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Address,
    Card,
    Subscription,
    Token,
    App,
}

/// A freshly listed collection.
#[derive(Debug, Clone)]
pub enum Collection {
    Addresses(Vec<Address>),
    Cards(Vec<Card>),
    Subscriptions(Vec<Subscription>),
    Tokens(Vec<Token>),
    Apps(Vec<App>),
}
