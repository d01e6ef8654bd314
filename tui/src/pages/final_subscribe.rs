use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{ApiError, Schedule, Subscription, SubscriptionInput};
use tracing::info;

use crate::command::Command;
use crate::keys::{is_decrement, is_enter, is_esc, is_increment};
use crate::msg::Msg;
use crate::page::Page;
use crate::session::Session;
use crate::text::key_hints;

const MIN_WEEKS: u32 = 1;
const MAX_WEEKS: u32 = 12;
const DEFAULT_WEEKS: u32 = 3;

/// Offer to repeat a just-placed order on a weekly schedule.
#[derive(Debug, Clone)]
pub(crate) struct FinalSubscribeState {
    pub weeks: u32,
    pub submitting: bool,
    pub completed: bool,
    pub address_id: Option<String>,
    pub card_id: Option<String>,
}

impl Default for FinalSubscribeState {
    fn default() -> Self {
        Self {
            weeks: DEFAULT_WEEKS,
            submitting: false,
            completed: false,
            address_id: None,
            card_id: None,
        }
    }
}

impl Session {
    pub(crate) fn final_subscribe_switch(&mut self) -> Vec<Command> {
        self.switch_page(Page::FinalSubscribe);
        let state = &mut self.state.final_subscribe;
        state.submitting = false;
        state.weeks = DEFAULT_WEEKS;
        Vec::new()
    }

    pub(crate) fn final_subscribe_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let state = &mut self.state.final_subscribe;
        if state.submitting {
            return Vec::new();
        }
        if state.completed {
            if is_enter(key) || is_esc(key) {
                return self.final_switch();
            }
            return Vec::new();
        }
        if is_increment(key) {
            state.weeks = (state.weeks + 1).min(MAX_WEEKS);
            Vec::new()
        } else if is_decrement(key) {
            state.weeks = state.weeks.saturating_sub(1).max(MIN_WEEKS);
            Vec::new()
        } else if is_enter(key) {
            self.create_recurring()
        } else if is_esc(key) {
            self.final_switch()
        } else {
            Vec::new()
        }
    }

    fn recurring_inputs(&self) -> Vec<SubscriptionInput> {
        let state = &self.state.final_subscribe;
        let (Some(address_id), Some(card_id), Some(order)) =
            (&state.address_id, &state.card_id, &self.data.order)
        else {
            return Vec::new();
        };
        order
            .items
            .iter()
            .filter_map(|item| {
                Some(SubscriptionInput {
                    product_variant_id: item.product_variant_id.clone()?,
                    quantity: item.quantity,
                    address_id: address_id.clone(),
                    card_id: card_id.clone(),
                    schedule: Some(Schedule::Weekly {
                        interval: state.weeks,
                    }),
                })
            })
            .collect()
    }

    fn create_recurring(&mut self) -> Vec<Command> {
        let inputs = self.recurring_inputs();
        let Some(api) = self.api() else {
            return Vec::new();
        };
        if inputs.is_empty() {
            return self.final_switch();
        }
        info!(
            items = inputs.len(),
            weeks = self.state.final_subscribe.weeks,
            "creating recurring order"
        );
        self.state.final_subscribe.submitting = true;
        vec![Command::new("subscription.recurring", async move {
            let result = async {
                for input in &inputs {
                    api.subscription_create(input).await?;
                }
                api.subscription_list().await
            }
            .await;
            Msg::RecurringCreated(result)
        })]
    }

    pub(crate) fn recurring_created(
        &mut self,
        result: Result<Vec<Subscription>, ApiError>,
    ) -> Vec<Command> {
        self.state.final_subscribe.submitting = false;
        match result {
            Ok(subscriptions) => {
                self.data.subscriptions = subscriptions;
                self.state.final_subscribe.completed = true;
                Vec::new()
            }
            Err(error) => self.report_error(error),
        }
    }

    pub(crate) fn final_subscribe_view(&self, _width: u16) -> Vec<Line<'static>> {
        let state = &self.state.final_subscribe;
        if state.completed {
            return vec![
                Line::styled("you're subscribed!", self.theme.selected()),
                Line::default(),
                Line::styled(
                    "manage subscriptions any time from your account.",
                    self.theme.muted(),
                ),
                Line::default(),
                key_hints(&[("enter", "continue")], &self.theme),
            ];
        }
        if state.submitting {
            return vec![Line::styled("setting up your subscription...", self.theme.muted())];
        }
        vec![
            Line::styled("order placed!", self.theme.selected()),
            Line::default(),
            Line::styled("want this delivered on repeat?", self.theme.base()),
            Line::default(),
            Line::from(vec![
                Span::styled("every ", self.theme.muted()),
                Span::styled("- ", self.theme.muted()),
                Span::styled(state.weeks.to_string(), self.theme.bold()),
                Span::styled(" +", self.theme.muted()),
                Span::styled(
                    if state.weeks == 1 { " week" } else { " weeks" },
                    self.theme.muted(),
                ),
            ]),
            Line::default(),
            key_hints(&[("enter", "subscribe"), ("esc", "no thanks")], &self.theme),
        ]
    }
}
