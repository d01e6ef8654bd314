use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::Order;

use crate::command::Command;
use crate::keys::{is_enter, is_esc, is_next, is_previous};
use crate::session::Session;
use crate::text::{boxed, format_usd, paragraph, spread};

pub(crate) const ORDER_HEIGHT: u16 = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OrdersState {
    pub selected: usize,
    /// Index of the order whose detail is open.
    pub viewing: Option<usize>,
    /// Detail scroll offset of the list, restored when the detail closes.
    pub saved_offset: u16,
}

impl OrdersState {
    pub fn clamp(&mut self, count: usize) {
        self.selected = self.selected.min(count.saturating_sub(1));
        if self.viewing.is_some_and(|index| index >= count) {
            self.viewing = None;
        }
    }
}

impl Session {
    pub(crate) fn orders_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.data.orders.len();
        if self.state.orders.viewing.is_some() {
            if is_esc(key) || is_enter(key) {
                self.close_order();
            } else {
                self.account_detail_scroll(key);
            }
            return Vec::new();
        }
        let state = &mut self.state.orders;
        if is_next(key) {
            state.selected = (state.selected + 1).min(count.saturating_sub(1));
            let selected = state.selected;
            self.account_reveal(selected, ORDER_HEIGHT);
        } else if is_previous(key) {
            state.selected = state.selected.saturating_sub(1);
            let selected = state.selected;
            self.account_reveal(selected, ORDER_HEIGHT);
        } else if is_enter(key) && state.selected < count {
            state.viewing = Some(state.selected);
            let pair = self.state.account.viewports.as_mut();
            if let Some(pair) = pair {
                self.state.orders.saved_offset = pair.detail.y_offset();
                pair.detail.goto_top();
            }
        } else if let Some(pair) = self.state.account.viewports.as_mut() {
            pair.detail.handle_paging_key(key);
        }
        Vec::new()
    }

    fn close_order(&mut self) {
        self.state.orders.viewing = None;
        let offset = self.state.orders.saved_offset;
        if let Some(pair) = self.state.account.viewports.as_mut() {
            pair.detail.set_y_offset(i32::from(offset));
        }
    }

    /// Orders newest first, numbered from the oldest.
    fn order_number(&self, index: usize) -> usize {
        self.data.orders.len() - index
    }

    pub(crate) fn orders_view(&self, width: u16) -> Vec<Line<'static>> {
        if let Some(index) = self.state.orders.viewing {
            if let Some(order) = self.data.orders.get(index) {
                return self.order_detail_view(order, self.order_number(index), width);
            }
        }
        if self.data.orders.is_empty() {
            return vec![Line::styled("no orders found", self.theme.muted())];
        }
        let mut lines = Vec::new();
        for (index, order) in self.data.orders.iter().enumerate() {
            let selected = self.state.account.focused && index == self.state.orders.selected;
            let title_style = if selected {
                self.theme.selected()
            } else {
                self.theme.bold()
            };
            let count: u32 = order.items.iter().map(|item| item.quantity).sum();
            let status = order
                .tracking
                .status
                .clone()
                .unwrap_or_else(|| "processing".to_owned());
            let content = vec![
                spread(
                    vec![Span::styled(format!("order #{}", self.order_number(index)), title_style)],
                    vec![Span::styled(format_usd(order.total()), self.theme.base())],
                    width.saturating_sub(4),
                ),
                Line::styled(
                    format!(
                        "{} · {count} {}",
                        order.created.as_deref().unwrap_or("recently"),
                        if count == 1 { "item" } else { "items" }
                    ),
                    self.theme.muted(),
                ),
                Line::styled(status, self.theme.muted()),
            ];
            lines.extend(boxed(content, width, self.theme.border(selected)));
        }
        lines
    }

    fn order_detail_view(&self, order: &Order, number: usize, width: u16) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::styled(format!("order #{number}"), self.theme.selected()),
            Line::styled(
                order.created.clone().unwrap_or_default(),
                self.theme.muted(),
            ),
            Line::default(),
        ];
        for item in &order.items {
            let description = item
                .description
                .clone()
                .unwrap_or_else(|| "item".to_owned());
            lines.push(spread(
                vec![
                    Span::styled(format!("{}x ", item.quantity), self.theme.muted()),
                    Span::styled(description, self.theme.base()),
                ],
                vec![Span::styled(format_usd(item.amount), self.theme.base())],
                width,
            ));
        }
        lines.push(Line::default());
        for (label, amount, style) in [
            ("subtotal", order.amount.subtotal, self.theme.base()),
            ("shipping", order.amount.shipping, self.theme.base()),
            ("total", order.total(), self.theme.bold()),
        ] {
            lines.push(spread(
                vec![Span::styled(label, self.theme.muted())],
                vec![Span::styled(format_usd(amount), style)],
                width,
            ));
        }
        if let Some(shipping) = &order.shipping {
            lines.push(Line::default());
            lines.push(Line::styled("shipped to", self.theme.accent()));
            lines.push(Line::styled(shipping.name.clone(), self.theme.base()));
            lines.push(Line::styled(shipping.street1.clone(), self.theme.base()));
            lines.push(Line::styled(
                format!("{} {} {}", shipping.city, shipping.zip, shipping.country),
                self.theme.muted(),
            ));
        }
        let tracking = &order.tracking;
        lines.push(Line::default());
        lines.push(Line::styled("tracking", self.theme.accent()));
        match (&tracking.service, &tracking.number) {
            (Some(service), Some(number)) => {
                lines.push(Line::styled(format!("{service} {number}"), self.theme.base()));
            }
            _ => lines.push(Line::styled("not shipped yet", self.theme.muted())),
        }
        if let Some(status) = &tracking.status {
            lines.push(Line::styled(status.clone(), self.theme.muted()));
        }
        if let Some(url) = &tracking.url {
            lines.extend(paragraph(url, width, self.theme.accent()));
        }
        lines
    }
}
