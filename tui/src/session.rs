use std::sync::Arc;

use crossterm::event::KeyEvent;
use shopterm_api::{
    Address, ApiError, App, Authenticator, Card, Cart, Connector, Order, PaymentTokenizer, Profile,
    Product, Region, ShopApi, Subscription, Token,
};
use tracing::{debug, info, warn};

use crate::chrome::{self, Chrome};
use crate::command::Command;
use crate::keys::{is_char, is_ctrl, is_esc};
use crate::layout::{Breakpoint, Layout};
use crate::msg::Msg;
use crate::page::Page;
use crate::pages::account::{AccountSection, AccountState};
use crate::pages::apps::AppsState;
use crate::pages::cart::CartState;
use crate::pages::confirm::ConfirmState;
use crate::pages::faq::Faq;
use crate::pages::final_subscribe::FinalSubscribeState;
use crate::pages::menu::MenuState;
use crate::pages::orders::OrdersState;
use crate::pages::payment::{PaymentState, PaymentView};
use crate::pages::shipping::{ShippingState, ShippingView};
use crate::pages::shop::ShopState;
use crate::pages::splash::SplashState;
use crate::pages::subscribe::SubscribeState;
use crate::pages::subscriptions::SubscriptionsState;
use crate::pages::tokens::TokensState;
use crate::theme::Theme;
use crate::viewport::Viewport;

pub(crate) const RESTART_MESSAGE: &str = "something went wrong, restart the ssh session";

/// Collaborators shared by every session on a server.
#[derive(Debug, Clone)]
pub struct Services {
    pub auth: Arc<dyn Authenticator>,
    pub connector: Arc<dyn Connector>,
    pub tokenizer: Arc<dyn PaymentTokenizer>,
    pub faqs: Arc<[Faq]>,
    pub shop_name: Arc<str>,
}

/// Who is connected, as told by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub fingerprint: String,
    pub anonymous: bool,
    pub client_ip: Option<String>,
    /// Arguments of an exec request, used to pick the first page.
    pub command: Vec<String>,
}

/// Remote data cached for the duration of the session.
#[derive(Debug, Clone, Default)]
pub(crate) struct Data {
    pub profile: Option<Profile>,
    pub products: Vec<Product>,
    pub cart: Cart,
    pub addresses: Vec<Address>,
    pub cards: Vec<Card>,
    pub subscriptions: Vec<Subscription>,
    pub tokens: Vec<Token>,
    pub apps: Vec<App>,
    pub orders: Vec<Order>,
    /// The order placed during this session, if any.
    pub order: Option<Order>,
}

/// One slot per page.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageStates {
    pub splash: SplashState,
    pub shop: ShopState,
    pub cart: CartState,
    pub subscribe: SubscribeState,
    pub shipping: ShippingState,
    pub payment: PaymentState,
    pub confirm: ConfirmState,
    pub final_subscribe: FinalSubscribeState,
    pub account: AccountState,
    pub orders: OrdersState,
    pub subscriptions: SubscriptionsState,
    pub tokens: TokensState,
    pub apps: AppsState,
    pub menu: MenuState,
    /// Scroll region of single-pane pages.
    pub body: Viewport,
}

/// The complete state of one connected terminal.
///
/// `update` consumes the session and returns its successor, so the event loop
/// is the only writer.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) services: Services,
    pub(crate) identity: Identity,
    pub(crate) api: Option<Arc<dyn ShopApi>>,
    pub(crate) access_token: Option<String>,
    pub(crate) region: Region,
    pub(crate) page: Page,
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) layout: Layout,
    pub(crate) theme: Theme,
    pub(crate) error: Option<String>,
    pub(crate) quitting: bool,
    pub(crate) has_menu: bool,
    pub(crate) checkout: bool,
    pub(crate) chrome: Chrome,
    pub(crate) data: Data,
    pub(crate) state: PageStates,
}

impl Session {
    pub fn new(services: Services, identity: Identity, width: u16, height: u16) -> Self {
        let mut session = Self {
            services,
            identity,
            api: None,
            access_token: None,
            region: Region::default(),
            page: Page::Splash,
            width,
            height,
            layout: Layout::default(),
            theme: Theme::default(),
            error: None,
            quitting: false,
            has_menu: false,
            checkout: false,
            chrome: Chrome::default(),
            data: Data::default(),
            state: PageStates::default(),
        };
        session.refresh();
        session
    }

    /// Commands to run once the session starts.
    pub fn init(&self) -> Vec<Command> {
        self.sign_in()
    }

    pub fn update(mut self, msg: Msg) -> (Self, Vec<Command>) {
        let commands = self.handle(msg);
        self.refresh();
        (self, commands)
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cart(&self) -> &Cart {
        &self.data.cart
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn has_menu(&self) -> bool {
        self.has_menu
    }

    pub fn is_checkout(&self) -> bool {
        self.checkout
    }

    fn handle(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Resize { width, height } => {
                debug!(width, height, "resize");
                self.width = width;
                self.height = height;
                Vec::new()
            }
            Msg::SignedIn(result) => self.signed_in(result),
            Msg::SplashDelayElapsed => self.splash_delay_elapsed(),
            Msg::InitialData(result) => self.initial_data_loaded(result),
            Msg::RegionChanged(result) => self.region_changed(result),
            Msg::CartUpdated { token, result } => self.cart_updated(token, result),
            Msg::CartRefetched { token, result } => self.cart_refetched(token, result),
            Msg::AddressSelected(result) => self.address_selected(result),
            Msg::CardSelected(result) => self.card_selected(result),
            Msg::ProfileUpdated(result) => self.profile_updated(result),
            Msg::PaymentLinkCreated { generation, result } => {
                self.payment_link_created(generation, result)
            }
            Msg::PaymentLinkPolled {
                generation,
                card_count,
                result,
            } => self.payment_link_polled(generation, card_count, result),
            Msg::OrderPlaced(result) => self.order_placed(result),
            Msg::SubscriptionPlaced(result) => self.subscription_placed(result),
            Msg::RecurringCreated(result) => self.recurring_created(result),
            Msg::TokenCreated(result) => self.token_created(result),
            Msg::AppCreated(result) => self.app_created(result),
            Msg::Deleted { resource, result } => self.deleted(resource, result),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if is_ctrl(&key, 'c') {
            self.quit();
            return Vec::new();
        }
        if self.layout.breakpoint == Breakpoint::Undersized {
            return Vec::new();
        }
        if self.page == Page::Splash {
            if is_esc(&key) {
                self.quit();
            }
            return Vec::new();
        }
        if is_esc(&key) && self.error.is_some() {
            self.error = None;
            return Vec::new();
        }
        if !self.is_capturing_text() {
            if let Some(commands) = self.handle_global_key(&key) {
                return commands;
            }
        }

        match self.page {
            Page::Splash => Vec::new(),
            Page::Shop => self.shop_update(&key),
            Page::Cart => self.cart_update(&key),
            Page::Subscribe => self.subscribe_update(&key),
            Page::Shipping => self.shipping_update(&key),
            Page::Payment => self.payment_update(&key),
            Page::Confirm => self.confirm_update(&key),
            Page::FinalSubscribe => self.final_subscribe_update(&key),
            Page::Final => self.final_update(&key),
            Page::Account => self.account_update(&key),
            Page::Menu => self.menu_update(&key),
        }
    }

    /// Header navigation and quit, available outside of checkout and text entry.
    fn handle_global_key(&mut self, key: &KeyEvent) -> Option<Vec<Command>> {
        let navigable = matches!(
            self.page,
            Page::Shop | Page::Cart | Page::Account | Page::Final
        );
        if !navigable {
            return None;
        }
        if is_char(key, 'q') {
            self.quit();
            return Some(Vec::new());
        }
        if is_char(key, 's') && self.page != Page::Shop {
            return Some(self.shop_switch());
        }
        if is_char(key, 'a') && self.page != Page::Account {
            return Some(self.account_switch());
        }
        if is_char(key, 'c') && self.page != Page::Cart {
            return Some(self.cart_switch());
        }
        if is_char(key, 'm') && self.layout.breakpoint == Breakpoint::Small && self.has_menu {
            return Some(self.menu_switch());
        }
        None
    }

    pub(crate) fn is_capturing_text(&self) -> bool {
        match self.page {
            Page::Shipping => self.state.shipping.view == ShippingView::Form,
            Page::Payment => self.state.payment.view == PaymentView::Form,
            Page::Account => {
                self.state.account.focused
                    && self.state.account.section() == AccountSection::Apps
                    && self.state.apps.editing
            }
            _ => false,
        }
    }

    pub(crate) fn quit(&mut self) {
        info!("session quitting");
        self.quitting = true;
    }

    pub(crate) fn switch_page(&mut self, page: Page) {
        if self.page != page {
            debug!(from = ?self.page, to = ?page, "switch page");
        }
        self.page = page;
        self.state.body.goto_top();
    }

    pub(crate) fn api(&self) -> Option<Arc<dyn ShopApi>> {
        self.api.clone()
    }

    pub(crate) fn is_subscribing(&self) -> bool {
        self.state.subscribe.product.is_some()
    }

    /// Record a failed remote call. On browsing pages the cart is refetched so
    /// optimistic edits converge with the server.
    pub(crate) fn report_error(&mut self, error: ApiError) -> Vec<Command> {
        let message = error.message();
        warn!(page = ?self.page, %error, "remote call failed");
        self.error = Some(message);
        if self.page.is_browsing() {
            self.refetch_cart()
        } else {
            Vec::new()
        }
    }

    pub(crate) fn refetch_cart(&self) -> Vec<Command> {
        let Some(api) = self.api() else {
            return Vec::new();
        };
        let token = self.state.cart.update_token;
        vec![Command::new("cart.get", async move {
            Msg::CartRefetched {
                token,
                result: api.cart_get().await,
            }
        })]
    }

    fn cart_refetched(&mut self, token: u64, result: Result<Cart, ApiError>) -> Vec<Command> {
        match result {
            Ok(cart) => {
                self.apply_cart(token, cart);
            }
            Err(error) => {
                warn!(%error, "cart refetch failed");
                self.error = Some(RESTART_MESSAGE.to_owned());
            }
        }
        Vec::new()
    }

    /// Apply a cart result only if no newer cart mutation has been issued since it was requested.
    pub(crate) fn apply_cart(&mut self, token: u64, cart: Cart) -> bool {
        if token != self.state.cart.update_token {
            debug!(
                token,
                current = self.state.cart.update_token,
                "discarding stale cart"
            );
            return false;
        }
        self.data.cart = cart;
        self.state.cart.clamp(self.data.cart.items.len());
        true
    }

    /// Replace the cart with authoritative state, superseding in-flight mutations.
    pub(crate) fn replace_cart(&mut self, cart: Cart) {
        self.state.cart.update_token += 1;
        self.data.cart = cart;
        self.state.cart.clamp(self.data.cart.items.len());
    }

    pub(crate) fn selected_product(&self) -> Option<&Product> {
        self.data.products.get(self.state.shop.selected)
    }

    pub(crate) fn update_theme(&mut self) {
        let color = self
            .selected_product()
            .and_then(|product| product.tags.color.clone());
        self.theme = Theme::from_hex(color.as_deref());
    }

    /// Recompute derived flags, chrome and layout, then fit every viewport.
    fn refresh(&mut self) {
        self.has_menu = self.page == Page::Shop
            || (self.page == Page::Account && !self.state.apps.editing);
        self.checkout = self.page.is_checkout();
        self.layout = Layout::compute(self.width, self.height, 0);
        self.chrome = chrome::build(self);
        self.layout = Layout::compute(self.width, self.height, self.chrome.height());
        self.sync_viewports();
    }

    fn sync_viewports(&mut self) {
        if self.page == Page::Shop && self.state.shop.viewports.is_none() {
            self.state.shop.viewports = Some(Default::default());
        }
        if self.page == Page::Account && self.state.account.viewports.is_none() {
            self.state.account.viewports = Some(Default::default());
        }

        if self.state.shop.viewports.is_some() {
            let panes = self.shop_panes();
            let menu_lines = self.shop_menu_view().len();
            let detail_lines = self.shop_detail_view(panes.detail.width).len();
            if let Some(pair) = self.state.shop.viewports.as_mut() {
                pair.menu.fit(panes.menu.width, panes.menu.height, lines(menu_lines));
                pair.detail.fit(panes.detail.width, panes.detail.height, lines(detail_lines));
            }
        }

        if self.state.account.viewports.is_some() {
            let panes = self.account_panes();
            let menu_lines = self.account_menu_view().len();
            let detail_lines = self.account_detail_view(panes.detail.width).len();
            if let Some(pair) = self.state.account.viewports.as_mut() {
                pair.menu.fit(panes.menu.width, panes.menu.height, lines(menu_lines));
                pair.detail.fit(panes.detail.width, panes.detail.height, lines(detail_lines));
            }
        }

        let body_lines = self.body_view(self.layout.content_width).len();
        let (width, height) = (self.layout.content_width, self.layout.content_height);
        self.state.body.fit(width, height, lines(body_lines));
    }
}

fn lines(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::keys::{ch, key};
    use crate::testing::{FakeShop, loaded_session, product};

    fn ctrl_c() -> KeyEvent {
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
    }

    #[tokio::test]
    async fn q_quits_from_the_shop() {
        let shop = FakeShop::new();
        let (session, _) = loaded_session(&shop, 120, 40).await;
        assert_eq!(session.page(), Page::Shop);
        let (session, commands) = session.press(ch('q'));
        assert!(commands.is_empty());
        assert!(session.is_quitting());
    }

    #[tokio::test]
    async fn typing_q_does_not_quit_but_ctrl_c_does() {
        let shop = FakeShop::new();
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        session.account_switch();
        session.account_focus(AccountSection::Apps);
        let (session, _) = session.press(key(KeyCode::Enter));
        assert!(session.is_capturing_text());

        let (session, _) = session.press(ch('q'));
        assert!(!session.is_quitting());
        assert_eq!(session.state.apps.form.value("name"), "q");

        let (session, _) = session.press(ctrl_c());
        assert!(session.is_quitting());
    }

    #[tokio::test]
    async fn esc_dismisses_an_error_and_keeps_the_page() {
        let shop = FakeShop::new();
        shop.set_products(vec![product("cron", false)]);
        let (session, _) = loaded_session(&shop, 120, 40).await;
        shop.fail_next("cart_set_item", "out of beans");
        let (session, commands) = session.press(ch('+'));
        let session = session.run_all(commands).await;
        assert_eq!(session.error(), Some("out of beans"));
        // The refetch puts the optimistic quantity back.
        assert!(session.cart().items.is_empty());

        let (session, commands) = session.press(key(KeyCode::Esc));
        assert!(commands.is_empty());
        assert_eq!(session.error(), None);
        assert_eq!(session.page(), Page::Shop);
    }

    #[tokio::test]
    async fn failed_refetch_asks_for_a_restart() {
        let shop = FakeShop::new();
        shop.set_products(vec![product("cron", false)]);
        let (session, _) = loaded_session(&shop, 120, 40).await;
        shop.fail_next("cart_set_item", "out of beans");
        shop.fail_next("cart_get", "gone");
        let (session, commands) = session.press(ch('+'));
        let session = session.run_all(commands).await;
        assert_eq!(session.error(), Some(RESTART_MESSAGE));
    }

    #[tokio::test]
    async fn undersized_terminals_ignore_keys_except_ctrl_c() {
        let shop = FakeShop::new();
        let (session, _) = loaded_session(&shop, 120, 40).await;
        let (session, _) = session.update(Msg::Resize {
            width: 12,
            height: 40,
        });
        assert_eq!(session.layout().breakpoint, Breakpoint::Undersized);

        let (session, commands) = session.press(ch('a'));
        assert!(commands.is_empty());
        assert_eq!(session.page(), Page::Shop);

        let (session, _) = session.update(Msg::Resize {
            width: 120,
            height: 40,
        });
        let (session, _) = session.press(ch('a'));
        assert_eq!(session.page(), Page::Account);

        let (session, _) = session.update(Msg::Resize {
            width: 12,
            height: 40,
        });
        let (session, _) = session.press(ctrl_c());
        assert!(session.is_quitting());
    }
}
