use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::Product;

use crate::command::Command;
use crate::keys::{is_char, is_enter, is_esc, is_next, is_previous};
use crate::page::Page;
use crate::session::Session;
use crate::text::{boxed, format_usd};

/// Item height of a variant box.
const VARIANT_HEIGHT: u16 = 3;

/// Draft of a subscription collected across the checkout pages.
#[derive(Debug, Clone, Default)]
pub(crate) struct SubscribeState {
    pub product: Option<Product>,
    pub selected: usize,
    pub variant_id: Option<String>,
    pub address_id: Option<String>,
    pub card_id: Option<String>,
}

impl Session {
    pub(crate) fn subscribe_switch(&mut self, product: Product) -> Vec<Command> {
        let single = match product.variants.as_slice() {
            [variant] => Some(variant.id.clone()),
            _ => None,
        };
        self.state.subscribe = SubscribeState {
            product: Some(product),
            ..SubscribeState::default()
        };
        self.switch_page(Page::Subscribe);
        if let Some(variant_id) = single {
            self.state.subscribe.variant_id = Some(variant_id);
            return self.shipping_switch();
        }
        Vec::new()
    }

    pub(crate) fn subscribe_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self
            .state
            .subscribe
            .product
            .as_ref()
            .map_or(0, |product| product.variants.len());
        let state = &mut self.state.subscribe;
        if is_next(key) {
            state.selected = (state.selected + 1).min(count.saturating_sub(1));
            let target = u16::try_from(state.selected).unwrap_or(u16::MAX) * VARIANT_HEIGHT;
            self.state.body.reveal(target, VARIANT_HEIGHT);
            Vec::new()
        } else if is_previous(key) {
            state.selected = state.selected.saturating_sub(1);
            let target = u16::try_from(state.selected).unwrap_or(u16::MAX) * VARIANT_HEIGHT;
            self.state.body.reveal(target, VARIANT_HEIGHT);
            Vec::new()
        } else if is_enter(key) || is_char(key, 'c') {
            let variant_id = state
                .product
                .as_ref()
                .and_then(|product| product.variants.get(state.selected))
                .map(|variant| variant.id.clone());
            match variant_id {
                Some(variant_id) => {
                    state.variant_id = Some(variant_id);
                    self.shipping_switch()
                }
                None => Vec::new(),
            }
        } else if is_esc(key) {
            self.subscribe_cancel()
        } else {
            Vec::new()
        }
    }

    /// Leave the subscription flow and return to the shop.
    pub(crate) fn subscribe_cancel(&mut self) -> Vec<Command> {
        self.state.subscribe = SubscribeState::default();
        self.shop_switch()
    }

    pub(crate) fn subscribe_view(&self, width: u16) -> Vec<Line<'static>> {
        let Some(product) = &self.state.subscribe.product else {
            return Vec::new();
        };
        let mut lines = Vec::new();
        for (index, variant) in product.variants.iter().enumerate() {
            let selected = index == self.state.subscribe.selected;
            let name_style = if selected {
                self.theme.selected()
            } else {
                self.theme.base()
            };
            lines.extend(boxed(
                vec![Line::from(vec![
                    Span::styled(variant.name.clone(), name_style),
                    Span::styled(format!("  {}", format_usd(variant.price)), self.theme.muted()),
                ])],
                width,
                self.theme.border(selected),
            ));
        }
        lines
    }
}
