use std::time::Duration;

use ratatui::text::{Line, Span};
use shopterm_api::{ApiError, ClientOptions, InitialData, featured_first};
use tracing::{info, warn};

use crate::command::Command;
use crate::msg::{Msg, SignedIn};
use crate::page::Page;
use crate::pages::account::AccountSection;
use crate::session::Session;
use crate::text::{centered, key_hints};

/// Minimum time the splash stays on screen.
pub(crate) const SPLASH_DELAY: Duration = Duration::from_secs(2);

/// The splash leaves once both the delay and the initial load are done.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SplashState {
    pub data_loaded: bool,
    pub delay_done: bool,
}

impl Session {
    /// Exchange the connection fingerprint for an API credential.
    pub(crate) fn sign_in(&self) -> Vec<Command> {
        let auth = self.services.auth.clone();
        let connector = self.services.connector.clone();
        let fingerprint = self.identity.fingerprint.clone();
        let client_ip = self.identity.client_ip.clone();
        vec![Command::new("auth.token", async move {
            let result = auth
                .fetch_user_token(&fingerprint)
                .await
                .map(|credentials| {
                    let api = connector.connect(ClientOptions {
                        access_token: credentials.access_token.clone(),
                        client_ip,
                        region: None,
                    });
                    SignedIn {
                        access_token: credentials.access_token,
                        api,
                    }
                });
            Msg::SignedIn(result)
        })]
    }

    pub(crate) fn signed_in(&mut self, result: Result<SignedIn, ApiError>) -> Vec<Command> {
        let signed_in = match result {
            Ok(signed_in) => signed_in,
            Err(error) => return self.report_error(error),
        };
        info!(anonymous = self.identity.anonymous, "signed in");
        let api = signed_in.api;
        self.api = Some(api.clone());
        self.access_token = Some(signed_in.access_token);
        vec![
            Command::after("splash.delay", SPLASH_DELAY, async { Msg::SplashDelayElapsed }),
            Command::new("view.init", async move { Msg::InitialData(api.view_init().await) }),
        ]
    }

    pub(crate) fn splash_delay_elapsed(&mut self) -> Vec<Command> {
        self.state.splash.delay_done = true;
        self.finish_splash()
    }

    pub(crate) fn initial_data_loaded(
        &mut self,
        result: Result<InitialData, ApiError>,
    ) -> Vec<Command> {
        match result {
            Ok(data) => {
                self.apply_initial_data(data);
                self.state.splash.data_loaded = true;
                self.finish_splash()
            }
            Err(error) => self.report_error(error),
        }
    }

    pub(crate) fn region_changed(&mut self, result: Result<InitialData, ApiError>) -> Vec<Command> {
        match result {
            Ok(data) => {
                self.apply_initial_data(data);
                Vec::new()
            }
            Err(error) => {
                warn!(region = self.region.as_str(), "region change failed");
                self.report_error(error)
            }
        }
    }

    fn apply_initial_data(&mut self, data: InitialData) {
        let InitialData {
            profile,
            products,
            cart,
            addresses,
            cards,
            subscriptions,
            tokens,
            apps,
            orders,
            region,
        } = data;
        self.data.profile = Some(profile);
        self.data.products = featured_first(products);
        self.data.addresses = addresses;
        self.data.cards = cards;
        self.data.subscriptions = subscriptions;
        self.data.tokens = tokens;
        self.data.apps = apps;
        self.data.orders = orders;
        if let Some(region) = region {
            self.region = region;
        }
        self.replace_cart(cart);
        self.state.shop.selected = 0;
        self.update_theme();
    }

    /// Route to the first page, honoring an exec command such as `ssh host cart`.
    fn finish_splash(&mut self) -> Vec<Command> {
        let splash = self.state.splash;
        if self.page != Page::Splash || !splash.data_loaded || !splash.delay_done {
            return Vec::new();
        }
        let command = self.identity.command.join(" ").trim().to_lowercase();
        if command.is_empty() {
            return self.shop_switch();
        }
        if command == "cart" {
            return self.cart_switch();
        }
        let product = self
            .data
            .products
            .iter()
            .position(|product| product.name.to_lowercase() == command);
        if let Some(index) = product {
            self.state.shop.selected = index;
            return self.shop_switch();
        }
        if let Some(section) = AccountSection::matching(&command) {
            let commands = self.account_switch();
            self.account_focus(section);
            return commands;
        }
        info!(%command, "unknown command, opening the shop");
        self.shop_switch()
    }

    pub(crate) fn splash_view(&self, width: u16, height: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let top = usize::from(height / 2).saturating_sub(2);
        lines.extend(std::iter::repeat_n(Line::default(), top));
        lines.push(centered(
            Line::styled(self.services.shop_name.to_string(), self.theme.selected()),
            width,
        ));
        if let Some(error) = &self.error {
            lines.push(Line::default());
            lines.push(centered(
                Line::from(Span::styled(error.clone(), self.theme.error())),
                width,
            ));
            lines.push(centered(key_hints(&[("esc", "quit")], &self.theme), width));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::keys::key;
    use crate::session::Identity;
    use crate::testing::{FakeShop, plain_lines, product, session_with};

    #[tokio::test]
    async fn splash_waits_for_both_delay_and_data() {
        let shop = FakeShop::new();
        shop.set_products(vec![product("cron", false)]);
        let session = session_with(&shop, Identity::default(), 120, 40);
        let commands = session.init();
        assert_eq!(commands[0].label(), "auth.token");

        let msg = commands.into_iter().next().unwrap().run().await;
        let (session, commands) = session.update(msg);
        let labels: Vec<_> = commands.iter().map(Command::label).collect();
        assert_eq!(labels, vec!["splash.delay", "view.init"]);

        let init = commands.into_iter().nth(1).unwrap().run().await;
        let (session, _) = session.update(init);
        assert_eq!(session.page(), Page::Splash);
        let (session, _) = session.update(Msg::SplashDelayElapsed);
        assert_eq!(session.page(), Page::Shop);
        assert_eq!(session.data.products.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exec_command_selects_first_page() {
        let shop = FakeShop::new();
        shop.set_products(vec![product("cron", false), product("nil", false)]);
        for (command, page) in [
            ("cart", Page::Cart),
            ("NIL", Page::Shop),
            ("order", Page::Account),
            ("bogus", Page::Shop),
        ] {
            let identity = Identity {
                command: vec![command.to_owned()],
                ..Identity::default()
            };
            let session = session_with(&shop, identity, 120, 40);
            let commands = session.init();
            let session = session.run_all(commands).await;
            assert_eq!(session.page(), page, "{command}");
            if command == "NIL" {
                assert_eq!(session.selected_product().unwrap().name, "nil");
            }
        }
    }

    #[tokio::test]
    async fn auth_failure_stays_on_splash_until_esc() {
        let shop = FakeShop::new();
        shop.fail_next("fetch_user_token", "auth service unavailable");
        let session = session_with(&shop, Identity::default(), 60, 20);
        let commands = session.init();
        let session = session.run_all(commands).await;
        assert_eq!(session.page(), Page::Splash);
        assert_eq!(session.error(), Some("auth service unavailable"));
        let text = plain_lines(&session.splash_view(60, 20)).join("\n");
        assert!(text.contains("auth service unavailable"));

        let (session, _) = session.press(key(KeyCode::Char('q')));
        assert!(!session.is_quitting());
        let (session, _) = session.press(key(KeyCode::Esc));
        assert!(session.is_quitting());
    }
}
