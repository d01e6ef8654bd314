//! In-memory services and session helpers for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crossterm::event::KeyEvent;
use ratatui::text::Line;
use shopterm_api::{
    Address, AddressInput, ApiError, App, AppInput, Authenticator, Card, CardDetails,
    CardExpiration, Cart, ClientOptions, Connector, InitialData, NewApp, NewToken, Order,
    OrderAmount, OrderItem, PaymentTokenizer, Product, ProductTags, ProductVariant, Profile, Region,
    Schedule, ShopApi, Subscription, SubscriptionInput, Token, User, UserCredentials,
};

use crate::command::Command;
use crate::keys::key;
use crate::msg::Msg;
use crate::pages::faq::Faq;
use crate::session::{Identity, Services, Session};

/// Commands run by `run_all` before it gives up on a feedback loop.
const MAX_COMMANDS: usize = 64;

#[derive(Debug, Default)]
struct FakeState {
    profile: Profile,
    products: Vec<Product>,
    cart: Cart,
    addresses: Vec<Address>,
    cards: Vec<Card>,
    subscriptions: Vec<Subscription>,
    tokens: Vec<Token>,
    apps: Vec<App>,
    orders: Vec<Order>,
    failures: HashMap<&'static str, String>,
    regions: Vec<Option<Region>>,
    tokenized: Vec<String>,
    next_id: u32,
}

impl FakeState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// A shop backend held in memory. Clones share state, so a test keeps one handle
/// while sessions talk to another.
#[derive(Debug, Clone)]
pub(crate) struct FakeShop {
    state: Arc<Mutex<FakeState>>,
}

impl FakeShop {
    pub fn new() -> Self {
        let state = FakeState {
            profile: Profile {
                user: User {
                    id: "user-1".to_owned(),
                    name: Some("jane doe".to_owned()),
                    email: Some("jane@example.com".to_owned()),
                    fingerprint: Some("d41d8cd98f00b204e9800998ecf8427e".to_owned()),
                },
            },
            ..FakeState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn set_products(&self, products: Vec<Product>) {
        self.with(|state| state.products = products);
    }

    pub fn set_addresses(&self, addresses: Vec<Address>) {
        self.with(|state| state.addresses = addresses);
    }

    pub fn set_cards(&self, cards: Vec<Card>) {
        self.with(|state| state.cards = cards);
    }

    pub fn set_orders(&self, orders: Vec<Order>) {
        self.with(|state| state.orders = orders);
    }

    pub fn set_subscriptions(&self, subscriptions: Vec<Subscription>) {
        self.with(|state| state.subscriptions = subscriptions);
    }

    /// Make the next call of `operation` fail with `message`.
    pub fn fail_next(&self, operation: &'static str, message: &str) {
        self.with(|state| state.failures.insert(operation, message.to_owned()));
    }

    /// Region of every client built so far.
    pub fn connected_regions(&self) -> Vec<Option<Region>> {
        self.with(|state| state.regions.clone())
    }

    /// Card numbers handed to the payment provider.
    pub fn tokenized(&self) -> Vec<String> {
        self.with(|state| state.tokenized.clone())
    }

    fn check(&self, operation: &'static str) -> Result<(), ApiError> {
        match self.with(|state| state.failures.remove(operation)) {
            Some(message) => Err(ApiError::Remote {
                status: 400,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ShopApi for FakeShop {
    async fn view_init(&self) -> Result<InitialData, ApiError> {
        self.check("view_init")?;
        Ok(self.with(|state| InitialData {
            profile: state.profile.clone(),
            products: state.products.clone(),
            cart: state.cart.clone(),
            addresses: state.addresses.clone(),
            cards: state.cards.clone(),
            subscriptions: state.subscriptions.clone(),
            tokens: state.tokens.clone(),
            apps: state.apps.clone(),
            orders: state.orders.clone(),
            region: None,
        }))
    }

    async fn profile_update(&self, name: &str, email: &str) -> Result<Profile, ApiError> {
        self.check("profile_update")?;
        Ok(self.with(|state| {
            state.profile.user.name = Some(name.to_owned());
            state.profile.user.email = Some(email.to_owned());
            state.profile.clone()
        }))
    }

    async fn product_list(&self) -> Result<Vec<Product>, ApiError> {
        self.check("product_list")?;
        Ok(self.with(|state| state.products.clone()))
    }

    async fn cart_get(&self) -> Result<Cart, ApiError> {
        self.check("cart_get")?;
        Ok(self.with(|state| state.cart.clone()))
    }

    async fn cart_set_item(&self, variant_id: &str, quantity: u32) -> Result<Cart, ApiError> {
        self.check("cart_set_item")?;
        self.with(|state| {
            let price = shopterm_api::find_variant(&state.products, variant_id)
                .map(|(_, variant)| variant.price)
                .ok_or_else(|| ApiError::Remote {
                    status: 404,
                    message: format!("unknown variant {variant_id}"),
                })?;
            state.cart.set_quantity(variant_id, quantity, price);
            Ok(state.cart.clone())
        })
    }

    async fn cart_set_address(&self, address_id: &str) -> Result<(), ApiError> {
        self.check("cart_set_address")?;
        self.with(|state| {
            state.cart.address_id = Some(address_id.to_owned());
            state.cart.amount.shipping = Some(500);
        });
        Ok(())
    }

    async fn cart_set_card(&self, card_id: &str) -> Result<(), ApiError> {
        self.check("cart_set_card")?;
        self.with(|state| state.cart.card_id = Some(card_id.to_owned()));
        Ok(())
    }

    async fn cart_clear(&self) -> Result<(), ApiError> {
        self.check("cart_clear")?;
        self.with(|state| state.cart = Cart::default());
        Ok(())
    }

    async fn cart_convert(&self) -> Result<Order, ApiError> {
        self.check("cart_convert")?;
        Ok(self.with(|state| {
            let id = state.next_id();
            let cart = std::mem::take(&mut state.cart);
            let order = Order {
                id: format!("order-{id}"),
                index: Some(u32::try_from(state.orders.len() + 1).unwrap()),
                amount: OrderAmount {
                    subtotal: cart.subtotal,
                    shipping: cart.shipping_cost(),
                },
                items: cart
                    .items
                    .iter()
                    .map(|item| OrderItem {
                        id: item.id.clone(),
                        product_variant_id: Some(item.product_variant_id.clone()),
                        description: None,
                        quantity: item.quantity,
                        amount: item.subtotal,
                    })
                    .collect(),
                ..Order::default()
            };
            state.orders.insert(0, order.clone());
            order
        }))
    }

    async fn address_list(&self) -> Result<Vec<Address>, ApiError> {
        self.check("address_list")?;
        Ok(self.with(|state| state.addresses.clone()))
    }

    async fn address_create(&self, address: &AddressInput) -> Result<String, ApiError> {
        self.check("address_create")?;
        Ok(self.with(|state| {
            let id = format!("address-{}", state.next_id());
            state.addresses.push(Address {
                id: id.clone(),
                name: address.name.clone(),
                street1: address.street1.clone(),
                street2: address.street2.clone(),
                city: address.city.clone(),
                province: address.province.clone(),
                country: address.country.clone(),
                zip: address.zip.clone(),
                phone: address.phone.clone(),
            });
            id
        }))
    }

    async fn address_delete(&self, id: &str) -> Result<(), ApiError> {
        self.check("address_delete")?;
        self.with(|state| state.addresses.retain(|address| address.id != id));
        Ok(())
    }

    async fn card_list(&self) -> Result<Vec<Card>, ApiError> {
        self.check("card_list")?;
        Ok(self.with(|state| state.cards.clone()))
    }

    async fn card_create(&self, token: &str) -> Result<String, ApiError> {
        self.check("card_create")?;
        Ok(self.with(|state| {
            let number = token.trim_start_matches("tok_");
            let last4 = number.get(number.len().saturating_sub(4)..).unwrap_or_default();
            let id = format!("card-{}", state.next_id());
            state.cards.push(Card {
                id: id.clone(),
                brand: "visa".to_owned(),
                last4: last4.to_owned(),
                expiration: CardExpiration {
                    month: 12,
                    year: 2030,
                },
            });
            id
        }))
    }

    async fn card_delete(&self, id: &str) -> Result<(), ApiError> {
        self.check("card_delete")?;
        self.with(|state| state.cards.retain(|card| card.id != id));
        Ok(())
    }

    async fn card_collect(&self) -> Result<String, ApiError> {
        self.check("card_collect")?;
        Ok("https://pay.example.com/collect/1".to_owned())
    }

    async fn subscription_list(&self) -> Result<Vec<Subscription>, ApiError> {
        self.check("subscription_list")?;
        Ok(self.with(|state| state.subscriptions.clone()))
    }

    async fn subscription_create(&self, input: &SubscriptionInput) -> Result<(), ApiError> {
        self.check("subscription_create")?;
        self.with(|state| {
            let id = format!("sub-{}", state.next_id());
            state.subscriptions.push(Subscription {
                id,
                product_variant_id: input.product_variant_id.clone(),
                quantity: input.quantity,
                address_id: input.address_id.clone(),
                card_id: input.card_id.clone(),
                schedule: input.schedule,
                next: None,
            });
        });
        Ok(())
    }

    async fn subscription_delete(&self, id: &str) -> Result<(), ApiError> {
        self.check("subscription_delete")?;
        self.with(|state| state.subscriptions.retain(|subscription| subscription.id != id));
        Ok(())
    }

    async fn token_list(&self) -> Result<Vec<Token>, ApiError> {
        self.check("token_list")?;
        Ok(self.with(|state| state.tokens.clone()))
    }

    async fn token_create(&self) -> Result<NewToken, ApiError> {
        self.check("token_create")?;
        Ok(self.with(|state| {
            let id = state.next_id();
            let secret = format!("secret-token-{}", state.tokens.len() + 1);
            state.tokens.push(Token {
                id: format!("token-{id}"),
                token: format!("secret-****-{}", state.tokens.len() + 1),
                created: Some("2024-05-01".to_owned()),
            });
            NewToken {
                id: format!("token-{id}"),
                token: secret,
            }
        }))
    }

    async fn token_delete(&self, id: &str) -> Result<(), ApiError> {
        self.check("token_delete")?;
        self.with(|state| state.tokens.retain(|token| token.id != id));
        Ok(())
    }

    async fn app_list(&self) -> Result<Vec<App>, ApiError> {
        self.check("app_list")?;
        Ok(self.with(|state| state.apps.clone()))
    }

    async fn app_create(&self, app: &AppInput) -> Result<NewApp, ApiError> {
        self.check("app_create")?;
        Ok(self.with(|state| {
            let id = format!("app-{}", state.next_id());
            let secret = format!("app-secret-{}", state.apps.len() + 1);
            state.apps.push(App {
                id: id.clone(),
                name: app.name.clone(),
                redirect_uri: app.redirect_uri.clone(),
                secret: "****".to_owned(),
            });
            NewApp { id, secret }
        }))
    }

    async fn app_delete(&self, id: &str) -> Result<(), ApiError> {
        self.check("app_delete")?;
        self.with(|state| state.apps.retain(|app| app.id != id));
        Ok(())
    }

    async fn order_list(&self) -> Result<Vec<Order>, ApiError> {
        self.check("order_list")?;
        Ok(self.with(|state| state.orders.clone()))
    }
}

impl Connector for FakeShop {
    fn connect(&self, options: ClientOptions) -> Arc<dyn ShopApi> {
        self.with(|state| state.regions.push(options.region));
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Authenticator for FakeShop {
    async fn fetch_user_token(&self, _fingerprint: &str) -> Result<UserCredentials, ApiError> {
        self.check("fetch_user_token")?;
        Ok(UserCredentials {
            access_token: "access-token".to_owned(),
            refresh_token: None,
        })
    }
}

#[async_trait]
impl PaymentTokenizer for FakeShop {
    async fn tokenize(&self, card: CardDetails) -> Result<String, ApiError> {
        self.check("tokenize")?;
        self.with(|state| state.tokenized.push(card.number.clone()));
        Ok(format!("tok_{}", card.number))
    }
}

pub(crate) fn services(shop: &FakeShop) -> Services {
    let shop = Arc::new(shop.clone());
    Services {
        auth: shop.clone(),
        connector: shop.clone(),
        tokenizer: shop,
        faqs: Arc::from(vec![Faq {
            question: "is the coffee any good?".to_owned(),
            answer: "yes.".to_owned(),
        }]),
        shop_name: Arc::from("terminal"),
    }
}

pub(crate) fn session_with(shop: &FakeShop, identity: Identity, width: u16, height: u16) -> Session {
    Session::new(services(shop), identity, width, height)
}

/// A signed-in session past the splash screen, holding the shop's current data.
pub(crate) async fn loaded_session(
    shop: &FakeShop,
    width: u16,
    height: u16,
) -> (Session, Vec<Command>) {
    let identity = Identity {
        fingerprint: "d41d8cd98f00b204e9800998ecf8427e".to_owned(),
        ..Identity::default()
    };
    let session = session_with(shop, identity, width, height);
    let mut commands = session.init();
    let msg = commands.remove(0).run().await;
    let (session, commands) = session.update(msg);
    let init = commands
        .into_iter()
        .find(|command| command.label() == "view.init")
        .expect("sign in loads initial data");
    let (session, _) = session.update(init.run().await);
    session.update(Msg::SplashDelayElapsed)
}

impl Session {
    pub(crate) fn press(self, key: KeyEvent) -> (Session, Vec<Command>) {
        self.update(Msg::Key(key))
    }

    /// Run commands to completion in issue order, feeding each result back in.
    pub(crate) async fn run_all(self, commands: Vec<Command>) -> Session {
        let mut session = self;
        let mut queue: VecDeque<Command> = commands.into();
        let mut remaining = MAX_COMMANDS;
        while let Some(command) = queue.pop_front() {
            assert!(remaining > 0, "commands kept producing commands");
            remaining -= 1;
            let msg = command.run().await;
            let (next, commands) = session.update(msg);
            session = next;
            queue.extend(commands);
        }
        session
    }

    /// Type each value into the focused field and press enter, which moves to the
    /// next field and submits on the last.
    pub(crate) fn fill_form(self, values: &[&str]) -> (Session, Vec<Command>) {
        let mut session = self;
        let mut issued = Vec::new();
        for value in values {
            for ch in value.chars() {
                let (next, commands) = session.press(crate::keys::ch(ch));
                session = next;
                issued.extend(commands);
            }
            let (next, commands) = session.press(key(crossterm::event::KeyCode::Enter));
            session = next;
            issued.extend(commands);
        }
        (session, issued)
    }
}

pub(crate) fn plain_lines(lines: &[Line<'_>]) -> Vec<String> {
    lines.iter().map(ToString::to_string).collect()
}

pub(crate) fn product(name: &str, featured: bool) -> Product {
    Product {
        id: name.to_owned(),
        name: name.to_owned(),
        description: format!("{name} is a whole bean coffee."),
        variants: vec![ProductVariant {
            id: format!("{name}-12oz"),
            name: "12oz".to_owned(),
            price: 2200,
        }],
        subscription: None,
        tags: ProductTags {
            featured,
            color: None,
        },
    }
}

pub(crate) fn address(name: &str) -> Address {
    Address {
        id: name.to_owned(),
        name: name.to_owned(),
        street1: "1 main st".to_owned(),
        street2: None,
        city: "brooklyn".to_owned(),
        province: Some("ny".to_owned()),
        country: "US".to_owned(),
        zip: "11201".to_owned(),
        phone: None,
    }
}

pub(crate) fn card(brand: &str, last4: &str) -> Card {
    Card {
        id: format!("{brand}-{last4}"),
        brand: brand.to_owned(),
        last4: last4.to_owned(),
        expiration: CardExpiration {
            month: 12,
            year: 2030,
        },
    }
}

pub(crate) fn subscription(id: &str, variant_id: &str) -> Subscription {
    Subscription {
        id: id.to_owned(),
        product_variant_id: variant_id.to_owned(),
        quantity: 1,
        address_id: "home".to_owned(),
        card_id: "visa-4242".to_owned(),
        schedule: Some(Schedule::Weekly { interval: 2 }),
        next: Some("2024-06-01".to_owned()),
    }
}
