use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{ClientOptions, Product};
use tracing::info;

use crate::command::Command;
use crate::keys::{is_char, is_decrement, is_enter, is_increment, is_next, is_previous};
use crate::layout::Panes;
use crate::msg::Msg;
use crate::page::Page;
use crate::session::Session;
use crate::text::{format_usd, paragraph};
use crate::viewport::ViewportPair;

pub(crate) const ANONYMOUS_SUBSCRIBE: &str = "ssh public key required to subscribe, see the faq";

const FEATURED_HEADER: &str = "~ featured ~";
const ORIGINALS_HEADER: &str = "~ originals ~";
const MENU_PADDING: u16 = 4;

#[derive(Debug, Clone, Default)]
pub(crate) struct ShopState {
    pub selected: usize,
    pub viewports: Option<ViewportPair>,
}

impl Session {
    pub(crate) fn shop_switch(&mut self) -> Vec<Command> {
        self.switch_page(Page::Shop);
        self.update_theme();
        Vec::new()
    }

    pub(crate) fn shop_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.data.products.len();
        if is_next(key) {
            let selected = (self.state.shop.selected + 1).min(count.saturating_sub(1));
            self.shop_select(selected);
            Vec::new()
        } else if is_previous(key) {
            self.shop_select(self.state.shop.selected.saturating_sub(1));
            Vec::new()
        } else if is_increment(key) {
            self.shop_adjust_quantity(1)
        } else if is_decrement(key) {
            self.shop_adjust_quantity(-1)
        } else if is_enter(key) {
            self.shop_enter()
        } else if is_char(key, 'r') {
            self.toggle_region()
        } else {
            if let Some(pair) = self.state.shop.viewports.as_mut() {
                pair.detail.handle_paging_key(key);
            }
            Vec::new()
        }
    }

    pub(crate) fn shop_select(&mut self, index: usize) {
        if index == self.state.shop.selected {
            return;
        }
        self.state.shop.selected = index;
        self.update_theme();
        let target = self.shop_menu_row(index);
        if let Some(pair) = self.state.shop.viewports.as_mut() {
            pair.menu.reveal(target, 1);
            pair.detail.goto_top();
        }
    }

    fn shop_adjust_quantity(&mut self, delta: i32) -> Vec<Command> {
        let Some(product) = self.selected_product() else {
            return Vec::new();
        };
        if product.requires_subscription() {
            return Vec::new();
        }
        let Some(variant) = product.variants.first() else {
            return Vec::new();
        };
        let variant_id = variant.id.clone();
        self.update_cart(&variant_id, delta)
    }

    fn shop_enter(&mut self) -> Vec<Command> {
        let Some(product) = self.selected_product().cloned() else {
            return Vec::new();
        };
        if !product.requires_subscription() {
            return self.cart_switch();
        }
        let existing = self
            .data
            .subscriptions
            .iter()
            .position(|subscription| product.has_variant(&subscription.product_variant_id));
        if let Some(index) = existing {
            return self.subscription_manage_switch(index);
        }
        if self.identity.anonymous {
            self.error = Some(ANONYMOUS_SUBSCRIBE.to_owned());
            return Vec::new();
        }
        self.subscribe_switch(product)
    }

    /// Swap the API client for the other region, then clear the cart and reload.
    fn toggle_region(&mut self) -> Vec<Command> {
        let Some(access_token) = self.access_token.clone() else {
            return Vec::new();
        };
        self.region = self.region.toggle();
        info!(region = self.region.as_str(), "switching region");
        let api = self.services.connector.connect(ClientOptions {
            access_token,
            client_ip: self.identity.client_ip.clone(),
            region: Some(self.region),
        });
        self.api = Some(api.clone());
        self.state.cart.update_token += 1;
        vec![Command::new("region.change", async move {
            let result = match api.cart_clear().await {
                Ok(()) => api.view_init().await,
                Err(error) => Err(error),
            };
            Msg::RegionChanged(result)
        })]
    }

    fn featured_count(&self) -> usize {
        self.data
            .products
            .iter()
            .filter(|product| product.is_featured())
            .count()
    }

    /// Row of a product in the menu, accounting for section headers.
    fn shop_menu_row(&self, index: usize) -> u16 {
        let featured = self.featured_count();
        let row = if featured == 0 {
            index
        } else if index < featured {
            index + 1
        } else {
            index + 3
        };
        u16::try_from(row).unwrap_or(u16::MAX)
    }

    pub(crate) fn shop_menu_width(&self) -> u16 {
        let longest = self
            .data
            .products
            .iter()
            .map(|product| product.name.chars().count())
            .chain([FEATURED_HEADER.len(), ORIGINALS_HEADER.len()])
            .max()
            .unwrap_or(0);
        u16::try_from(longest)
            .unwrap_or(u16::MAX)
            .saturating_add(MENU_PADDING)
    }

    pub(crate) fn shop_panes(&self) -> Panes {
        let menu_lines = u16::try_from(self.shop_menu_view().len()).unwrap_or(u16::MAX);
        self.layout.panes(self.shop_menu_width(), menu_lines)
    }

    pub(crate) fn shop_menu_view(&self) -> Vec<Line<'static>> {
        let featured = self.featured_count();
        let mut lines = Vec::new();
        for (index, product) in self.data.products.iter().enumerate() {
            if featured > 0 && index == 0 {
                lines.push(Line::styled(FEATURED_HEADER, self.theme.muted()));
            }
            if featured > 0 && index == featured {
                lines.push(Line::default());
                lines.push(Line::styled(ORIGINALS_HEADER, self.theme.muted()));
            }
            let style = if index == self.state.shop.selected {
                self.theme.selected()
            } else {
                self.theme.base()
            };
            lines.push(Line::styled(product.name.clone(), style));
        }
        lines
    }

    pub(crate) fn shop_detail_view(&self, width: u16) -> Vec<Line<'static>> {
        let Some(product) = self.selected_product() else {
            return vec![Line::styled("no products available", self.theme.muted())];
        };
        let mut lines = vec![Line::styled(product.name.clone(), self.theme.bold())];
        let variants = product
            .variants
            .iter()
            .map(|variant| variant.name.as_str())
            .collect::<Vec<_>>()
            .join("/");
        lines.push(Line::styled(variants, self.theme.muted()));
        if let Some(variant) = product.variants.first() {
            lines.push(Line::styled(format_usd(variant.price), self.theme.accent()));
        }
        lines.push(Line::default());
        lines.extend(paragraph(&product.description, width, self.theme.base()));
        lines.push(Line::default());
        lines.push(self.quantity_control(product));
        lines
    }

    fn quantity_control(&self, product: &Product) -> Line<'static> {
        if product.requires_subscription() {
            let subscribed = self
                .data
                .subscriptions
                .iter()
                .any(|subscription| product.has_variant(&subscription.product_variant_id));
            let label = if subscribed { "manage sub" } else { "subscribe" };
            return Line::from(vec![
                Span::styled(label, self.theme.selected()),
                Span::styled("  enter", self.theme.muted()),
            ]);
        }
        let quantity = product
            .variants
            .first()
            .map(|variant| self.data.cart.quantity_of(&variant.id))
            .unwrap_or(0);
        Line::from(vec![
            Span::styled("- ", self.theme.muted()),
            Span::styled(quantity.to_string(), self.theme.bold()),
            Span::styled(" +", self.theme.muted()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;
    use shopterm_api::Region;

    use super::*;
    use crate::keys::{ch, key};
    use crate::testing::{FakeShop, loaded_session, plain_lines, product};

    #[tokio::test]
    async fn plus_increments_selected_original() {
        let shop = FakeShop::new();
        shop.set_products(vec![
            product("cron", false),
            product("segfault", true),
            product("nil", false),
        ]);
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        assert_eq!(session.data.products[0].id, "segfault");

        session = session.press(key(KeyCode::Down)).0;
        session = session.press(key(KeyCode::Down)).0;
        assert_eq!(session.selected_product().unwrap().id, "nil");

        let (session, commands) = session.press(ch('+'));
        assert_eq!(session.cart().quantity_of("nil-12oz"), 1);
        let session = session.run_all(commands).await;
        assert_eq!(session.cart().quantity_of("nil-12oz"), 1);
        assert_eq!(session.cart().quantity_of("cron-12oz"), 0);
        assert_eq!(session.cart().quantity_of("segfault-12oz"), 0);
    }

    #[tokio::test]
    async fn subscription_products_ignore_quantity_keys() {
        let shop = FakeShop::new();
        let mut required = product("cron", false);
        required.subscription = Some(shopterm_api::SubscriptionMode::Required);
        shop.set_products(vec![required]);
        let (session, _) = loaded_session(&shop, 120, 40).await;

        let (session, commands) = session.press(ch('+'));
        assert!(commands.is_empty());
        assert_eq!(session.cart().item_count(), 0);
    }

    #[tokio::test]
    async fn anonymous_users_cannot_subscribe() {
        let shop = FakeShop::new();
        let mut required = product("cron", false);
        required.subscription = Some(shopterm_api::SubscriptionMode::Required);
        shop.set_products(vec![required]);
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        session.identity.anonymous = true;

        let (session, _) = session.press(key(KeyCode::Enter));
        assert_eq!(session.page(), Page::Shop);
        assert_eq!(session.error(), Some(ANONYMOUS_SUBSCRIBE));
    }

    #[tokio::test]
    async fn region_toggle_swaps_client_and_reloads() {
        let shop = FakeShop::new();
        shop.set_products(vec![product("cron", false)]);
        let (session, _) = loaded_session(&shop, 120, 40).await;
        let (session, commands) = session.press(ch('+'));
        let session = session.run_all(commands).await;
        assert_eq!(session.cart().item_count(), 1);

        let (session, commands) = session.press(ch('r'));
        assert_eq!(session.region(), Region::Eu);
        assert_eq!(shop.connected_regions(), vec![None, Some(Region::Eu)]);
        let session = session.run_all(commands).await;
        assert_eq!(session.cart().item_count(), 0);
        assert_eq!(session.state.shop.selected, 0);
    }

    #[tokio::test]
    async fn menu_lists_sections() {
        let shop = FakeShop::new();
        shop.set_products(vec![product("cron", false), product("segfault", true)]);
        let (session, _) = loaded_session(&shop, 120, 40).await;
        assert_eq!(
            plain_lines(&session.shop_menu_view()),
            vec!["~ featured ~", "segfault", "", "~ originals ~", "cron"]
        );
        assert_eq!(session.shop_menu_row(1), 4);
    }
}
