//! Page controllers. Each page adds `*_switch`, `*_update` and `*_view` methods to
//! [`Session`], plus handlers for the command results it issues.

pub(crate) mod about;
pub(crate) mod account;
pub(crate) mod apps;
pub(crate) mod cart;
pub(crate) mod confirm;
pub(crate) mod faq;
pub(crate) mod final_page;
pub(crate) mod final_subscribe;
pub(crate) mod menu;
pub(crate) mod orders;
pub(crate) mod payment;
pub(crate) mod shipping;
pub(crate) mod shop;
pub(crate) mod splash;
pub(crate) mod subscribe;
pub(crate) mod subscriptions;
pub(crate) mod tokens;

use ratatui::text::Line;
use shopterm_api::ApiError;
use tracing::info;

use crate::command::Command;
use crate::msg::{Collection, Msg, Resource};
use crate::page::Page;
use crate::session::Session;

impl Session {
    /// Content of the single scroll region of pages that are not split in two.
    pub(crate) fn body_view(&self, width: u16) -> Vec<Line<'static>> {
        match self.page {
            Page::Splash => self.splash_view(width, self.layout.content_height),
            Page::Shop | Page::Account => Vec::new(),
            Page::Cart => self.cart_view(width),
            Page::Subscribe => self.subscribe_view(width),
            Page::Shipping => self.shipping_view(width),
            Page::Payment => self.payment_view(width),
            Page::Confirm => self.confirm_view(width),
            Page::FinalSubscribe => self.final_subscribe_view(width),
            Page::Final => self.final_view(width),
            Page::Menu => self.menu_view(width),
        }
    }

    /// Delete an account resource, then relist its collection.
    pub(crate) fn delete_resource(&mut self, resource: Resource, id: String) -> Vec<Command> {
        let Some(api) = self.api() else {
            return Vec::new();
        };
        info!(?resource, %id, "deleting");
        vec![Command::new("resource.delete", async move {
            let result = async {
                let collection = match resource {
                    Resource::Address => {
                        api.address_delete(&id).await?;
                        Collection::Addresses(api.address_list().await?)
                    }
                    Resource::Card => {
                        api.card_delete(&id).await?;
                        Collection::Cards(api.card_list().await?)
                    }
                    Resource::Subscription => {
                        api.subscription_delete(&id).await?;
                        Collection::Subscriptions(api.subscription_list().await?)
                    }
                    Resource::Token => {
                        api.token_delete(&id).await?;
                        Collection::Tokens(api.token_list().await?)
                    }
                    Resource::App => {
                        api.app_delete(&id).await?;
                        Collection::Apps(api.app_list().await?)
                    }
                };
                Ok::<_, ApiError>(collection)
            }
            .await;
            Msg::Deleted { resource, result }
        })]
    }

    pub(crate) fn deleted(
        &mut self,
        resource: Resource,
        result: Result<Collection, ApiError>,
    ) -> Vec<Command> {
        let state = &mut self.state;
        for list in [
            &mut state.shipping.list,
            &mut state.payment.list,
            &mut state.account.addresses,
            &mut state.account.cards,
            &mut state.subscriptions.list,
            &mut state.tokens.list,
            &mut state.apps.list,
        ] {
            list.finish();
        }
        match result {
            Ok(collection) => {
                info!(?resource, "deleted");
                match collection {
                    Collection::Addresses(addresses) => {
                        let subscribe = &mut self.state.subscribe;
                        if subscribe
                            .address_id
                            .as_ref()
                            .is_some_and(|id| !addresses.iter().any(|address| &address.id == id))
                        {
                            subscribe.address_id = None;
                        }
                        self.data.addresses = addresses;
                    }
                    Collection::Cards(cards) => {
                        let subscribe = &mut self.state.subscribe;
                        if subscribe
                            .card_id
                            .as_ref()
                            .is_some_and(|id| !cards.iter().any(|card| &card.id == id))
                        {
                            subscribe.card_id = None;
                        }
                        self.data.cards = cards;
                    }
                    Collection::Subscriptions(subscriptions) => {
                        self.data.subscriptions = subscriptions;
                    }
                    Collection::Tokens(tokens) => self.data.tokens = tokens,
                    Collection::Apps(apps) => self.data.apps = apps,
                }
                self.clamp_lists();
                Vec::new()
            }
            Err(error) => self.report_error(error),
        }
    }

    /// Keep every selection within its collection.
    pub(crate) fn clamp_lists(&mut self) {
        let data = &self.data;
        let state = &mut self.state;
        state.shipping.list.clamp(data.addresses.len());
        state.payment.list.clamp(data.cards.len());
        state.account.addresses.clamp(data.addresses.len());
        state.account.cards.clamp(data.cards.len());
        state.subscriptions.list.clamp(data.subscriptions.len());
        state.tokens.list.clamp(data.tokens.len());
        state.apps.list.clamp(data.apps.len());
        state.orders.clamp(data.orders.len());
    }
}
