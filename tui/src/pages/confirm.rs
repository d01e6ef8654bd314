use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{ApiError, Cart, Order, Subscription, SubscriptionInput, find_variant};
use tracing::info;

use crate::command::Command;
use crate::keys::{is_enter, is_esc};
use crate::msg::Msg;
use crate::page::Page;
use crate::pages::payment::card_lines;
use crate::pages::shipping::address_lines;
use crate::session::Session;
use crate::text::{format_usd, key_hints, spread};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ConfirmState {
    pub submitting: bool,
}

impl Session {
    /// Address and card chosen for the current checkout.
    fn checkout_choices(&self) -> (Option<String>, Option<String>) {
        if self.is_subscribing() {
            let subscribe = &self.state.subscribe;
            (subscribe.address_id.clone(), subscribe.card_id.clone())
        } else {
            let cart = &self.data.cart;
            (cart.address_id.clone(), cart.card_id.clone())
        }
    }

    pub(crate) fn confirm_switch(&mut self) -> Vec<Command> {
        let (Some(_), Some(_)) = self.checkout_choices() else {
            return Vec::new();
        };
        self.switch_page(Page::Confirm);
        self.state.confirm.submitting = false;
        Vec::new()
    }

    pub(crate) fn confirm_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        if self.state.confirm.submitting {
            return Vec::new();
        }
        if is_enter(key) {
            self.place_order()
        } else if is_esc(key) {
            self.payment_switch()
        } else {
            self.state.body.handle_scroll_key(key);
            Vec::new()
        }
    }

    fn place_order(&mut self) -> Vec<Command> {
        let Some(api) = self.api() else {
            return Vec::new();
        };
        let (Some(address_id), Some(card_id)) = self.checkout_choices() else {
            return Vec::new();
        };
        if !self.is_subscribing() {
            info!(items = self.data.cart.item_count(), "placing order");
            self.state.confirm.submitting = true;
            return vec![Command::new("cart.convert", async move {
                Msg::OrderPlaced(api.cart_convert().await)
            })];
        }

        let Some(product_variant_id) = self.state.subscribe.variant_id.clone() else {
            return Vec::new();
        };
        info!(%product_variant_id, "placing subscription");
        self.state.confirm.submitting = true;
        let input = SubscriptionInput {
            product_variant_id,
            quantity: 1,
            address_id,
            card_id,
            schedule: None,
        };
        vec![Command::new("subscription.create", async move {
            let result = async {
                api.subscription_create(&input).await?;
                api.subscription_list().await
            }
            .await;
            Msg::SubscriptionPlaced(result)
        })]
    }

    pub(crate) fn order_placed(&mut self, result: Result<Order, ApiError>) -> Vec<Command> {
        self.state.confirm.submitting = false;
        let order = match result {
            Ok(order) => order,
            Err(error) => return self.report_error(error),
        };
        info!(order = %order.id, total = order.total(), "order placed");
        let (address_id, card_id) = self.checkout_choices();
        self.data.orders.insert(0, order.clone());
        self.data.order = Some(order);
        self.replace_cart(Cart::default());
        let offer = &mut self.state.final_subscribe;
        offer.address_id = address_id;
        offer.card_id = card_id;
        offer.completed = false;
        if self.page != Page::Confirm {
            return Vec::new();
        }
        self.final_subscribe_switch()
    }

    pub(crate) fn subscription_placed(
        &mut self,
        result: Result<Vec<Subscription>, ApiError>,
    ) -> Vec<Command> {
        self.state.confirm.submitting = false;
        let subscriptions = match result {
            Ok(subscriptions) => subscriptions,
            Err(error) => return self.report_error(error),
        };
        info!("subscription placed");
        self.data.subscriptions = subscriptions;
        self.data.order = None;
        self.state.subscribe = Default::default();
        self.state.final_subscribe.completed = true;
        if self.page != Page::Confirm {
            return Vec::new();
        }
        self.final_subscribe_switch()
    }

    pub(crate) fn confirm_view(&self, width: u16) -> Vec<Line<'static>> {
        let (address_id, card_id) = self.checkout_choices();
        let mut lines = Vec::new();

        if self.is_subscribing() {
            let variant = self
                .state
                .subscribe
                .variant_id
                .as_deref()
                .and_then(|id| find_variant(&self.data.products, id));
            if let Some((product, variant)) = variant {
                lines.push(spread(
                    vec![
                        Span::styled(product.name.clone(), self.theme.bold()),
                        Span::styled(format!(" {}", variant.name), self.theme.muted()),
                    ],
                    vec![Span::styled(
                        format!("{}/mo", format_usd(variant.price)),
                        self.theme.base(),
                    )],
                    width,
                ));
            }
        } else {
            let cart = &self.data.cart;
            for item in &cart.items {
                let name = find_variant(&self.data.products, &item.product_variant_id)
                    .map(|(product, variant)| format!("{} {}", product.name, variant.name))
                    .unwrap_or_else(|| item.product_variant_id.clone());
                lines.push(spread(
                    vec![
                        Span::styled(format!("{}x ", item.quantity), self.theme.muted()),
                        Span::styled(name, self.theme.base()),
                    ],
                    vec![Span::styled(format_usd(item.subtotal), self.theme.base())],
                    width,
                ));
            }
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("subtotal: ", self.theme.muted()),
                Span::styled(format_usd(cart.subtotal), self.theme.base()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("shipping: ", self.theme.muted()),
                Span::styled(format_usd(cart.shipping_cost()), self.theme.base()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("total: ", self.theme.muted()),
                Span::styled(format_usd(cart.total()), self.theme.bold()),
            ]));
            if let Some(shipping) = &cart.shipping {
                let service = [shipping.service.as_deref(), shipping.timeframe.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(", ");
                if !service.is_empty() {
                    lines.push(Line::styled(service, self.theme.muted()));
                }
            }
        }

        lines.push(Line::default());
        lines.push(Line::styled("ship to", self.theme.accent()));
        if let Some(address) = address_id
            .as_deref()
            .and_then(|id| self.data.addresses.iter().find(|address| address.id == id))
        {
            lines.extend(address_lines(address, false, &self.theme));
        }
        lines.push(Line::default());
        lines.push(Line::styled("pay with", self.theme.accent()));
        if let Some(card) = card_id
            .as_deref()
            .and_then(|id| self.data.cards.iter().find(|card| card.id == id))
        {
            lines.extend(card_lines(card, false, &self.theme));
        }
        lines.push(Line::default());
        if self.state.confirm.submitting {
            lines.push(Line::styled("placing order...", self.theme.muted()));
        } else {
            lines.push(key_hints(&[("press enter", "to confirm")], &self.theme));
        }
        lines
    }
}
