use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{Schedule, find_variant};

use crate::command::Command;
use crate::msg::Resource;
use crate::pages::shipping::confirm_hint;
use crate::selection::{ListAction, SelectionList};
use crate::session::Session;
use crate::text::{boxed, format_usd, spread};

pub(crate) const SUBSCRIPTION_HEIGHT: u16 = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SubscriptionsState {
    pub list: SelectionList,
}

impl Session {
    pub(crate) fn subscriptions_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.data.subscriptions.len();
        match self.state.subscriptions.list.handle_key(key, count) {
            ListAction::Moved => {
                let selected = self.state.subscriptions.list.selected();
                self.account_reveal(selected, SUBSCRIPTION_HEIGHT);
                Vec::new()
            }
            ListAction::DeleteConfirmed(index) => match self.data.subscriptions.get(index) {
                Some(subscription) => {
                    let id = subscription.id.clone();
                    self.state.subscriptions.list.start();
                    self.delete_resource(Resource::Subscription, id)
                }
                None => Vec::new(),
            },
            ListAction::Ignored => {
                self.account_detail_scroll(key);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn subscriptions_view(&self, width: u16) -> Vec<Line<'static>> {
        if self.data.subscriptions.is_empty() {
            return vec![Line::styled("no active subscriptions", self.theme.muted())];
        }
        let list = &self.state.subscriptions.list;
        let mut lines = Vec::new();
        for (index, subscription) in self.data.subscriptions.iter().enumerate() {
            let selected = self.state.account.focused && index == list.selected();
            let (name, price) = find_variant(&self.data.products, &subscription.product_variant_id)
                .map(|(product, variant)| {
                    (format!("{} {}", product.name, variant.name), variant.price)
                })
                .unwrap_or_else(|| (subscription.product_variant_id.clone(), 0));
            let name_style = if selected {
                self.theme.selected()
            } else {
                self.theme.bold()
            };
            let schedule = subscription.schedule.unwrap_or(Schedule::Fixed);
            let content = if list.deleting() == Some(index) {
                vec![
                    Line::styled(name, name_style),
                    Line::styled("cancel this subscription?", self.theme.warning()),
                    confirm_hint(&self.theme),
                ]
            } else {
                vec![
                    spread(
                        vec![
                            Span::styled(format!("{}x ", subscription.quantity), self.theme.muted()),
                            Span::styled(name, name_style),
                        ],
                        vec![Span::styled(
                            format_usd(price * u64::from(subscription.quantity)),
                            self.theme.base(),
                        )],
                        width.saturating_sub(4),
                    ),
                    Line::styled(schedule.to_string(), self.theme.muted()),
                    Line::styled(
                        match &subscription.next {
                            Some(next) => format!("next shipment {next}"),
                            None => "next shipment pending".to_owned(),
                        },
                        self.theme.muted(),
                    ),
                ]
            };
            lines.extend(boxed(content, width, self.theme.border(selected)));
        }
        lines
    }
}
