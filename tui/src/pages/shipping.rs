use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{Address, AddressInput, ApiError};
use tracing::debug;

use crate::command::Command;
use crate::form::{Field, Form, FormEvent};
use crate::keys::is_esc;
use crate::msg::{AddressSelected, Msg, Resource};
use crate::page::Page;
use crate::selection::{ListAction, SelectionList};
use crate::session::Session;
use crate::text::boxed;
use crate::theme::Theme;
use crate::validate::{ValidationError, required};

/// Rendered height of an address box.
pub(crate) const ADDRESS_HEIGHT: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShippingView {
    List,
    Form,
}

#[derive(Debug, Clone)]
pub(crate) struct ShippingState {
    pub view: ShippingView,
    pub list: SelectionList,
    pub form: Form,
    pub submitting: bool,
}

impl Default for ShippingState {
    fn default() -> Self {
        Self {
            view: ShippingView::List,
            list: SelectionList::with_add_slot(),
            form: address_form(),
            submitting: false,
        }
    }
}

fn address_form() -> Form {
    Form::new(vec![
        Field::new("name", "name")
            .placeholder("jane doe")
            .validate_with(required),
        Field::new("street1", "street")
            .placeholder("123 main st")
            .validate_with(required),
        Field::new("street2", "street 2").placeholder("apt 4 (optional)"),
        Field::new("city", "city").validate_with(required),
        Field::new("province", "state / province").placeholder("(optional)"),
        Field::new("country", "country")
            .default_value("US")
            .max_len(2)
            .validate_with(required),
        Field::new("phone", "phone").placeholder("required outside the US"),
        Field::new("zip", "postal code").validate_with(required),
    ])
}

impl Session {
    pub(crate) fn shipping_switch(&mut self) -> Vec<Command> {
        self.switch_page(Page::Shipping);
        let count = self.data.addresses.len();
        let current = if self.is_subscribing() {
            self.state.subscribe.address_id.clone()
        } else {
            self.data.cart.address_id.clone()
        };
        let state = &mut self.state.shipping;
        state.submitting = false;
        state.list.reset();
        state.form.reset();
        state.view = if count == 0 {
            ShippingView::Form
        } else {
            ShippingView::List
        };
        let index = current
            .and_then(|id| self.data.addresses.iter().position(|address| address.id == id))
            .unwrap_or(0);
        state.list.select(index, count);
        Vec::new()
    }

    pub(crate) fn shipping_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        if self.state.shipping.submitting {
            return Vec::new();
        }
        match self.state.shipping.view {
            ShippingView::Form => self.shipping_form_update(key),
            ShippingView::List => self.shipping_list_update(key),
        }
    }

    fn shipping_list_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.data.addresses.len();
        match self.state.shipping.list.handle_key(key, count) {
            ListAction::Moved => {
                let target = u16::try_from(self.state.shipping.list.selected())
                    .unwrap_or(u16::MAX)
                    * ADDRESS_HEIGHT;
                self.state.body.reveal(target, ADDRESS_HEIGHT);
                Vec::new()
            }
            ListAction::Select(index) => {
                let Some(address) = self.data.addresses.get(index) else {
                    return Vec::new();
                };
                let address_id = address.id.clone();
                self.select_address(address_id)
            }
            ListAction::Add => {
                self.state.shipping.form.reset();
                self.state.shipping.view = ShippingView::Form;
                self.state.body.goto_top();
                Vec::new()
            }
            ListAction::DeleteConfirmed(index) => {
                let Some(address) = self.data.addresses.get(index) else {
                    return Vec::new();
                };
                let id = address.id.clone();
                self.state.shipping.list.start();
                self.delete_resource(Resource::Address, id)
            }
            ListAction::DeletePending(_) | ListAction::DeleteCancelled => Vec::new(),
            ListAction::Ignored => {
                if is_esc(key) {
                    self.shipping_back()
                } else {
                    self.state.body.handle_paging_key(key);
                    Vec::new()
                }
            }
        }
    }

    fn shipping_form_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        if is_esc(key) {
            if self.data.addresses.is_empty() {
                return self.shipping_back();
            }
            self.state.shipping.view = ShippingView::List;
            return Vec::new();
        }
        match self.state.shipping.form.handle_key(key) {
            FormEvent::Submit => self.submit_address(),
            FormEvent::None | FormEvent::Edited => Vec::new(),
        }
    }

    fn shipping_back(&mut self) -> Vec<Command> {
        if !self.is_subscribing() {
            return self.cart_switch();
        }
        let single = self
            .state
            .subscribe
            .product
            .as_ref()
            .is_some_and(|product| product.variants.len() == 1);
        if single {
            self.subscribe_cancel()
        } else {
            self.switch_page(Page::Subscribe);
            Vec::new()
        }
    }

    fn select_address(&mut self, address_id: String) -> Vec<Command> {
        if self.is_subscribing() {
            self.state.subscribe.address_id = Some(address_id);
            return self.payment_switch();
        }
        let Some(api) = self.api() else {
            return Vec::new();
        };
        self.state.shipping.submitting = true;
        self.state.shipping.list.start();
        vec![Command::new("cart.set_address", async move {
            let result = async {
                api.cart_set_address(&address_id).await?;
                let cart = api.cart_get().await?;
                Ok::<_, ApiError>(AddressSelected {
                    address_id,
                    addresses: None,
                    cart: Some(cart),
                })
            }
            .await;
            Msg::AddressSelected(result)
        })]
    }

    fn submit_address(&mut self) -> Vec<Command> {
        let form = &mut self.state.shipping.form;
        let country = form.value("country").to_uppercase();
        let phone = form.optional("phone");
        if country != "US" && phone.is_none() {
            form.reject(ValidationError::PhoneRequired);
            return Vec::new();
        }
        let input = AddressInput {
            name: form.value("name").to_owned(),
            street1: form.value("street1").to_owned(),
            street2: form.optional("street2"),
            city: form.value("city").to_owned(),
            province: form.optional("province"),
            country,
            zip: form.value("zip").to_owned(),
            phone,
        };
        let Some(api) = self.api() else {
            self.state.shipping.form.idle();
            return Vec::new();
        };
        let attach = !self.is_subscribing();
        self.state.shipping.submitting = true;
        debug!(attach, "creating address");
        vec![Command::new("address.create", async move {
            let result = async {
                let address_id = api.address_create(&input).await?;
                let addresses = api.address_list().await?;
                let cart = if attach {
                    api.cart_set_address(&address_id).await?;
                    Some(api.cart_get().await?)
                } else {
                    None
                };
                Ok::<_, ApiError>(AddressSelected {
                    address_id,
                    addresses: Some(addresses),
                    cart,
                })
            }
            .await;
            Msg::AddressSelected(result)
        })]
    }

    pub(crate) fn address_selected(
        &mut self,
        result: Result<AddressSelected, ApiError>,
    ) -> Vec<Command> {
        let state = &mut self.state.shipping;
        state.submitting = false;
        state.list.finish();
        let selected = match result {
            Ok(selected) => selected,
            Err(error) => {
                self.state.shipping.form.fail();
                return self.report_error(error);
            }
        };
        self.state.shipping.form.complete();
        if let Some(addresses) = selected.addresses {
            self.data.addresses = addresses;
            self.clamp_lists();
        }
        if let Some(cart) = selected.cart {
            self.replace_cart(cart);
        }
        if self.is_subscribing() {
            self.state.subscribe.address_id = Some(selected.address_id);
        }
        if self.page != Page::Shipping {
            return Vec::new();
        }
        self.payment_switch()
    }

    pub(crate) fn shipping_view(&self, width: u16) -> Vec<Line<'static>> {
        let state = &self.state.shipping;
        if state.submitting && !self.is_subscribing() {
            return vec![Line::styled("calculating shipping costs...", self.theme.muted())];
        }
        match state.view {
            ShippingView::Form => {
                let columns = self.layout.breakpoint.is_split();
                state.form.view(width, columns, &self.theme)
            }
            ShippingView::List => {
                let mut lines = Vec::new();
                for (index, address) in self.data.addresses.iter().enumerate() {
                    let selected = index == state.list.selected();
                    let content = if state.list.deleting() == Some(index) {
                        delete_prompt(&address.name, &self.theme)
                    } else {
                        address_lines(address, selected, &self.theme)
                    };
                    lines.extend(boxed(content, width, self.theme.border(selected)));
                }
                let add_selected = state.list.is_add_slot(self.data.addresses.len());
                let style = if add_selected {
                    self.theme.selected()
                } else {
                    self.theme.muted()
                };
                lines.extend(boxed(
                    vec![Line::styled("+ add new address", style)],
                    width,
                    self.theme.border(add_selected),
                ));
                lines
            }
        }
    }
}

/// Three lines describing an address.
pub(crate) fn address_lines(address: &Address, selected: bool, theme: &Theme) -> Vec<Line<'static>> {
    let name_style = if selected { theme.selected() } else { theme.bold() };
    let mut street = address.street1.clone();
    if let Some(street2) = &address.street2 {
        street.push_str(", ");
        street.push_str(street2);
    }
    let region = match &address.province {
        Some(province) => format!("{}, {} {} {}", address.city, province, address.zip, address.country),
        None => format!("{} {} {}", address.city, address.zip, address.country),
    };
    vec![
        Line::styled(address.name.clone(), name_style),
        Line::styled(street, theme.base()),
        Line::styled(region, theme.muted()),
    ]
}

/// Replaces an address's lines while a deletion awaits confirmation.
pub(crate) fn delete_prompt(name: &str, theme: &Theme) -> Vec<Line<'static>> {
    vec![
        Line::styled(name.to_owned(), theme.bold()),
        Line::styled("delete this?", theme.warning()),
        confirm_hint(theme),
    ]
}

pub(crate) fn confirm_hint(theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled("y", theme.bold()),
        Span::styled(" confirm  ", theme.muted()),
        Span::styled("any key", theme.bold()),
        Span::styled(" cancel", theme.muted()),
    ])
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::form::FormStatus;
    use crate::keys::{ch, key};
    use crate::testing::{FakeShop, address, loaded_session, plain_lines, product};

    async fn session_at_shipping(shop: &FakeShop) -> Session {
        shop.set_products(vec![product("cron", false)]);
        let (session, _) = loaded_session(shop, 120, 40).await;
        let (session, commands) = session.press(ch('+'));
        let session = session.run_all(commands).await;
        let (session, _) = session.press(ch('c'));
        let (session, _) = session.press(key(KeyCode::Enter));
        assert_eq!(session.page(), Page::Shipping);
        session
    }

    #[tokio::test]
    async fn new_address_is_created_and_attached() {
        let shop = FakeShop::new();
        let session = session_at_shipping(&shop).await;
        assert_eq!(session.state.shipping.view, ShippingView::Form);

        let (session, commands) =
            session.fill_form(&["jane doe", "1 main st", "", "brooklyn", "ny", "", "", "11201"]);
        assert_eq!(commands.len(), 1);
        let text = plain_lines(&session.shipping_view(60)).join("\n");
        assert!(text.contains("calculating shipping costs..."));

        let session = session.run_all(commands).await;
        assert_eq!(session.page(), Page::Payment);
        assert_eq!(session.data.addresses.len(), 1);
        let address_id = session.data.addresses[0].id.clone();
        assert_eq!(session.cart().address_id.as_deref(), Some(address_id.as_str()));
        assert_eq!(session.cart().shipping_cost(), 500);
    }

    #[tokio::test]
    async fn returning_to_shipping_clears_a_pending_submit() {
        let shop = FakeShop::new();
        let session = session_at_shipping(&shop).await;
        let (mut session, commands) =
            session.fill_form(&["jane doe", "1 main st", "", "brooklyn", "ny", "", "", "11201"]);
        assert_eq!(commands.len(), 1);
        assert!(session.state.shipping.submitting);

        session.cart_switch();
        session.shipping_switch();
        let state = &session.state.shipping;
        assert!(!state.submitting);
        assert_eq!(state.form.status(), FormStatus::Idle);
        assert_eq!(state.form.value("name"), "");
    }

    #[tokio::test]
    async fn missing_fields_keep_the_form_open() {
        let shop = FakeShop::new();
        let session = session_at_shipping(&shop).await;
        let (session, commands) = session.fill_form(&["jane doe", "", "", "", "", "", "", ""]);
        assert!(commands.is_empty());
        assert_eq!(session.page(), Page::Shipping);
        assert_eq!(
            session.state.shipping.form.error(),
            Some(&ValidationError::Required("street"))
        );
    }

    #[tokio::test]
    async fn international_orders_need_a_phone() {
        let shop = FakeShop::new();
        let mut session = session_at_shipping(&shop).await;
        let form = &mut session.state.shipping.form;
        for (name, value) in [
            ("name", "jo"),
            ("street1", "1 rue"),
            ("city", "paris"),
            ("country", "fr"),
            ("zip", "75001"),
        ] {
            form.set_value(name, value);
        }
        let commands = session.submit_address();
        assert!(commands.is_empty());
        assert_eq!(
            session.state.shipping.form.error(),
            Some(&ValidationError::PhoneRequired)
        );

        session.state.shipping.form.set_value("phone", "+33 1 23 45 67 89");
        assert!(session.state.shipping.form.submit());
        let commands = session.submit_address();
        assert_eq!(commands.len(), 1);
    }

    #[tokio::test]
    async fn existing_address_list_selects_and_deletes() {
        let shop = FakeShop::new();
        shop.set_addresses(vec![address("home"), address("work")]);
        let session = session_at_shipping(&shop).await;
        assert_eq!(session.state.shipping.view, ShippingView::List);

        let (session, _) = session.press(key(KeyCode::Down));
        let (session, commands) = session.press(ch('d'));
        assert!(commands.is_empty());
        let text = plain_lines(&session.shipping_view(60)).join("\n");
        assert!(text.contains("delete this?"));
        let (session, commands) = session.press(ch('y'));
        let session = session.run_all(commands).await;
        assert_eq!(session.data.addresses.len(), 1);
        assert_eq!(session.state.shipping.list.selected(), 1);

        let (session, _) = session.press(key(KeyCode::Up));
        let (session, commands) = session.press(key(KeyCode::Enter));
        let session = session.run_all(commands).await;
        assert_eq!(session.page(), Page::Payment);
        assert_eq!(session.cart().address_id.as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn result_after_leaving_does_not_navigate() {
        let shop = FakeShop::new();
        shop.set_addresses(vec![address("home")]);
        let session = session_at_shipping(&shop).await;
        let (mut session, mut commands) = session.press(key(KeyCode::Enter));
        let msg = commands.remove(0).run().await;
        session.cart_switch();
        let (session, _) = session.update(msg);
        assert_eq!(session.page(), Page::Cart);
        assert_eq!(session.cart().address_id.as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn esc_returns_to_cart() {
        let shop = FakeShop::new();
        shop.set_addresses(vec![address("home")]);
        let session = session_at_shipping(&shop).await;
        let (session, _) = session.press(key(KeyCode::Esc));
        assert_eq!(session.page(), Page::Cart);
    }
}
