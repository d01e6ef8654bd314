use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};

use crate::command::Command;
use crate::keys::{is_enter, is_esc};
use crate::page::Page;
use crate::session::Session;
use crate::text::{format_usd, key_hints, paragraph};

impl Session {
    pub(crate) fn final_switch(&mut self) -> Vec<Command> {
        self.switch_page(Page::Final);
        Vec::new()
    }

    pub(crate) fn final_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        if is_enter(key) || is_esc(key) {
            self.shop_switch()
        } else {
            self.state.body.handle_scroll_key(key);
            Vec::new()
        }
    }

    pub(crate) fn final_view(&self, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        match &self.data.order {
            Some(order) => {
                let number = order
                    .index
                    .map(|index| format!("order #{index} confirmed"))
                    .unwrap_or_else(|| "order confirmed".to_owned());
                lines.push(Line::styled(number, self.theme.selected()));
                lines.push(Line::from(vec![
                    Span::styled("total: ", self.theme.muted()),
                    Span::styled(format_usd(order.total()), self.theme.bold()),
                ]));
                lines.push(Line::default());
                lines.extend(paragraph(
                    "we'll email you tracking details once your order ships.",
                    width,
                    self.theme.base(),
                ));
            }
            None => {
                lines.push(Line::styled("thanks for subscribing!", self.theme.selected()));
                lines.push(Line::default());
                lines.extend(paragraph(
                    "your first delivery is on its way soon.",
                    width,
                    self.theme.base(),
                ));
            }
        }
        lines.push(Line::default());
        lines.push(key_hints(&[("enter", "back to the shop")], &self.theme));
        lines
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;
    use shopterm_api::{Order, OrderAmount};

    use super::*;
    use crate::keys::key;
    use crate::testing::{FakeShop, loaded_session, plain_lines};

    #[tokio::test]
    async fn shows_order_and_returns_to_shop() {
        let shop = FakeShop::new();
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        session.data.order = Some(Order {
            index: Some(7),
            amount: OrderAmount {
                subtotal: 2200,
                shipping: 500,
            },
            ..Order::default()
        });
        session.final_switch();
        let text = plain_lines(&session.final_view(60)).join("\n");
        assert!(text.contains("order #7 confirmed"));
        assert!(text.contains("total: $27.00"));

        let (session, _) = session.press(key(KeyCode::Enter));
        assert_eq!(session.page(), Page::Shop);
    }
}
