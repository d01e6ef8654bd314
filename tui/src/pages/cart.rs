use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{ApiError, Cart, find_variant};
use tracing::debug;

use crate::command::Command;
use crate::keys::{is_char, is_decrement, is_enter, is_esc, is_increment, is_next, is_previous};
use crate::msg::Msg;
use crate::page::Page;
use crate::session::Session;
use crate::text::{format_usd, spread};

#[derive(Debug, Clone, Default)]
pub(crate) struct CartState {
    pub selected: usize,
    /// Bumped on every cart mutation; results carrying an older value are stale.
    pub update_token: u64,
}

impl CartState {
    pub fn clamp(&mut self, count: usize) {
        self.selected = self.selected.min(count.saturating_sub(1));
    }
}

impl Session {
    pub(crate) fn cart_switch(&mut self) -> Vec<Command> {
        self.switch_page(Page::Cart);
        self.state.cart.clamp(self.data.cart.items.len());
        Vec::new()
    }

    pub(crate) fn cart_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.data.cart.items.len();
        if is_next(key) {
            self.state.cart.selected = (self.state.cart.selected + 1).min(count.saturating_sub(1));
            Vec::new()
        } else if is_previous(key) {
            self.state.cart.selected = self.state.cart.selected.saturating_sub(1);
            Vec::new()
        } else if is_increment(key) {
            self.cart_adjust_selected(1)
        } else if is_decrement(key) {
            self.cart_adjust_selected(-1)
        } else if is_enter(key) || is_char(key, 'c') {
            if self.data.cart.is_empty() {
                Vec::new()
            } else {
                self.shipping_switch()
            }
        } else if is_esc(key) {
            self.shop_switch()
        } else {
            self.state.body.handle_paging_key(key);
            Vec::new()
        }
    }

    fn cart_adjust_selected(&mut self, delta: i32) -> Vec<Command> {
        let Some(item) = self.data.cart.items.get(self.state.cart.selected) else {
            return Vec::new();
        };
        let variant_id = item.product_variant_id.clone();
        self.update_cart(&variant_id, delta)
    }

    /// Change a variant's quantity locally and ask the server to match.
    pub(crate) fn update_cart(&mut self, variant_id: &str, delta: i32) -> Vec<Command> {
        let Some(api) = self.api() else {
            return Vec::new();
        };
        let Some((_, variant)) = find_variant(&self.data.products, variant_id) else {
            return Vec::new();
        };
        let price = variant.price;
        let current = self.data.cart.quantity_of(variant_id);
        let quantity = current.saturating_add_signed(delta);
        if quantity == current {
            return Vec::new();
        }
        self.data.cart.set_quantity(variant_id, quantity, price);
        self.state.cart.clamp(self.data.cart.items.len());
        self.state.cart.update_token += 1;
        let token = self.state.cart.update_token;
        let variant_id = variant_id.to_owned();
        debug!(token, %variant_id, quantity, "updating cart");
        vec![Command::new("cart.set_item", async move {
            let result = api.cart_set_item(&variant_id, quantity).await;
            Msg::CartUpdated { token, result }
        })]
    }

    pub(crate) fn cart_updated(&mut self, token: u64, result: Result<Cart, ApiError>) -> Vec<Command> {
        match result {
            Ok(cart) => {
                self.apply_cart(token, cart);
                Vec::new()
            }
            Err(error) => self.report_error(error),
        }
    }

    pub(crate) fn cart_view(&self, width: u16) -> Vec<Line<'static>> {
        let cart = &self.data.cart;
        if cart.is_empty() {
            return vec![
                Line::styled("your cart is empty", self.theme.muted()),
                Line::default(),
                Line::from(vec![
                    Span::styled("s", self.theme.bold()),
                    Span::styled(" back to the shop", self.theme.muted()),
                ]),
            ];
        }

        let mut lines = Vec::new();
        for (index, item) in cart.items.iter().enumerate() {
            let selected = index == self.state.cart.selected;
            let (name, variant) = find_variant(&self.data.products, &item.product_variant_id)
                .map(|(product, variant)| (product.name.clone(), variant.name.clone()))
                .unwrap_or_else(|| (item.product_variant_id.clone(), String::new()));
            let name_style = if selected {
                self.theme.selected()
            } else {
                self.theme.base()
            };
            lines.push(spread(
                vec![
                    Span::styled(name, name_style),
                    Span::styled(format!(" {variant}"), self.theme.muted()),
                ],
                vec![
                    Span::styled("- ", self.theme.muted()),
                    Span::styled(item.quantity.to_string(), self.theme.bold()),
                    Span::styled(" +  ", self.theme.muted()),
                    Span::styled(format_usd(item.subtotal), self.theme.base()),
                ],
                width,
            ));
        }
        lines.push(Line::default());
        lines.push(spread(
            vec![Span::styled("subtotal", self.theme.muted())],
            vec![Span::styled(format_usd(cart.subtotal), self.theme.bold())],
            width,
        ));
        lines
    }
}
