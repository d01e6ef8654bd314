use std::time::Duration;

use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{ApiError, Card, CardDetails, Profile};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::form::{Field, Form, FormEvent};
use crate::keys::{is_char, is_esc};
use crate::msg::{CardSelected, Msg, Resource};
use crate::page::Page;
use crate::pages::shipping::confirm_hint;
use crate::selection::{ListAction, SelectionList};
use crate::session::Session;
use crate::text::{boxed, format_usd, key_hints, paragraph};
use crate::theme::Theme;
use crate::validate::{
    card_number, clean_card_number, digits, digits_between, email, month, required,
};

/// Rendered height of a card box.
pub(crate) const CARD_HEIGHT: u16 = 4;
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaymentView {
    List,
    Form,
    /// Waiting for a card added through a hosted payment link.
    Link,
}

#[derive(Debug, Clone)]
pub(crate) struct PaymentState {
    pub view: PaymentView,
    pub list: SelectionList,
    pub form: Form,
    pub submitting: bool,
    pub generating: bool,
    pub link: Option<String>,
    pub polling: bool,
    /// Bumped whenever a payment link starts or stops; results from older links are dropped.
    pub link_generation: u64,
}

impl Default for PaymentState {
    fn default() -> Self {
        Self {
            view: PaymentView::List,
            list: SelectionList::with_add_slot(),
            form: card_form(),
            submitting: false,
            generating: false,
            link: None,
            polling: false,
            link_generation: 0,
        }
    }
}

impl PaymentState {
    fn stop_link(&mut self) {
        self.polling = false;
        self.link = None;
        self.link_generation += 1;
    }
}

fn card_form() -> Form {
    Form::new(vec![
        Field::new("name", "name on card").validate_with(required),
        Field::new("email", "email")
            .placeholder("for receipts")
            .validate_with(required)
            .validate_with(email),
        Field::new("number", "card number")
            .placeholder("4242 4242 4242 4242")
            .max_len(23)
            .validate_with(card_number),
        Field::new("month", "exp month")
            .placeholder("MM")
            .max_len(2)
            .validate_with(digits::<2>)
            .validate_with(month),
        Field::new("year", "exp year")
            .placeholder("YY")
            .max_len(2)
            .validate_with(digits::<2>),
        Field::new("cvc", "cvc")
            .max_len(4)
            .validate_with(digits_between::<3, 4>),
        Field::new("zip", "billing postal code").validate_with(required),
    ])
}

impl Session {
    pub(crate) fn payment_switch(&mut self) -> Vec<Command> {
        if self.data.cart.is_empty() && !self.is_subscribing() {
            return Vec::new();
        }
        self.switch_page(Page::Payment);
        let count = self.data.cards.len();
        let current = if self.is_subscribing() {
            self.state.subscribe.card_id.clone()
        } else {
            self.data.cart.card_id.clone()
        };
        let index = current
            .and_then(|id| self.data.cards.iter().position(|card| card.id == id))
            .unwrap_or(0);
        let state = &mut self.state.payment;
        state.view = PaymentView::List;
        state.submitting = false;
        state.generating = false;
        state.stop_link();
        state.form.reset();
        state.list.reset();
        state.list.select(index, count);
        Vec::new()
    }

    pub(crate) fn payment_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let state = &self.state.payment;
        if state.submitting || state.generating {
            return Vec::new();
        }
        match state.view {
            PaymentView::List => self.payment_list_update(key),
            PaymentView::Form => {
                if is_esc(key) {
                    self.state.payment.view = PaymentView::List;
                    return Vec::new();
                }
                match self.state.payment.form.handle_key(key) {
                    FormEvent::Submit => self.submit_card(),
                    FormEvent::None | FormEvent::Edited => Vec::new(),
                }
            }
            PaymentView::Link => {
                if is_esc(key) {
                    info!("payment link abandoned");
                    let state = &mut self.state.payment;
                    state.stop_link();
                    state.view = PaymentView::List;
                } else {
                    self.state.body.handle_paging_key(key);
                }
                Vec::new()
            }
        }
    }

    fn payment_list_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.data.cards.len();
        match self.state.payment.list.handle_key(key, count) {
            ListAction::Moved => {
                let target =
                    u16::try_from(self.state.payment.list.selected()).unwrap_or(u16::MAX) * CARD_HEIGHT;
                self.state.body.reveal(target, CARD_HEIGHT);
                Vec::new()
            }
            ListAction::Select(index) => match self.data.cards.get(index) {
                Some(card) => {
                    let card_id = card.id.clone();
                    self.select_card(card_id)
                }
                None => Vec::new(),
            },
            ListAction::Add => {
                self.open_card_form();
                Vec::new()
            }
            ListAction::DeleteConfirmed(index) => match self.data.cards.get(index) {
                Some(card) => {
                    let id = card.id.clone();
                    self.state.payment.list.start();
                    self.delete_resource(Resource::Card, id)
                }
                None => Vec::new(),
            },
            ListAction::DeletePending(_) | ListAction::DeleteCancelled => Vec::new(),
            ListAction::Ignored => {
                if is_esc(key) {
                    self.shipping_switch()
                } else if is_char(key, 'b') {
                    self.start_payment_link()
                } else {
                    self.state.body.handle_paging_key(key);
                    Vec::new()
                }
            }
        }
    }

    fn open_card_form(&mut self) {
        let user = self.data.profile.as_ref().map(|profile| &profile.user);
        let name = user.and_then(|user| user.name.clone()).unwrap_or_default();
        let email = user.and_then(|user| user.email.clone()).unwrap_or_default();
        let form = &mut self.state.payment.form;
        form.reset();
        form.set_value("name", name);
        form.set_value("email", email);
        self.state.payment.view = PaymentView::Form;
        self.state.body.goto_top();
    }

    fn select_card(&mut self, card_id: String) -> Vec<Command> {
        if self.is_subscribing() {
            self.state.subscribe.card_id = Some(card_id);
            return self.confirm_switch();
        }
        let Some(api) = self.api() else {
            return Vec::new();
        };
        self.state.payment.submitting = true;
        self.state.payment.list.start();
        vec![Command::new("cart.set_card", async move {
            let result = api.cart_set_card(&card_id).await.map(|()| CardSelected {
                card_id,
                cards: None,
            });
            Msg::CardSelected(result)
        })]
    }

    fn submit_card(&mut self) -> Vec<Command> {
        let Some(api) = self.api() else {
            self.state.payment.form.idle();
            return Vec::new();
        };
        let form = &mut self.state.payment.form;
        let details = CardDetails {
            name: form.value("name").to_owned(),
            number: clean_card_number(form.value("number")),
            exp_month: form.value("month").parse().unwrap_or_default(),
            exp_year: form.value("year").parse().unwrap_or_default(),
            cvc: form.value("cvc").to_owned(),
            zip: form.value("zip").to_owned(),
        };
        let name = form.value("name").to_owned();
        let email = form.value("email").to_owned();
        form.clear("number");
        form.clear("cvc");
        self.state.payment.submitting = true;

        let tokenizer = self.services.tokenizer.clone();
        let attach = !self.is_subscribing();
        let card_api = api.clone();
        let mut commands = vec![Command::new("card.create", async move {
            let result = async {
                let token = tokenizer.tokenize(details).await?;
                let card_id = card_api.card_create(&token).await?;
                let cards = card_api.card_list().await?;
                if attach {
                    card_api.cart_set_card(&card_id).await?;
                }
                Ok::<_, ApiError>(CardSelected {
                    card_id,
                    cards: Some(cards),
                })
            }
            .await;
            Msg::CardSelected(result)
        })];

        if self.profile_differs(&name, &email) {
            debug!("updating profile from card form");
            commands.push(Command::new("profile.update", async move {
                Msg::ProfileUpdated(api.profile_update(&name, &email).await)
            }));
        }
        commands
    }

    fn profile_differs(&self, name: &str, email: &str) -> bool {
        let Some(profile) = &self.data.profile else {
            return true;
        };
        profile.user.name.as_deref() != Some(name) || profile.user.email.as_deref() != Some(email)
    }

    pub(crate) fn card_selected(&mut self, result: Result<CardSelected, ApiError>) -> Vec<Command> {
        self.state.payment.submitting = false;
        self.state.payment.list.finish();
        let selected = match result {
            Ok(selected) => selected,
            Err(error) => {
                self.state.payment.form.fail();
                return self.report_error(error);
            }
        };
        self.state.payment.form.complete();
        if let Some(cards) = selected.cards {
            self.data.cards = cards;
            self.clamp_lists();
        }
        if self.is_subscribing() {
            self.state.subscribe.card_id = Some(selected.card_id);
        } else {
            self.data.cart.card_id = Some(selected.card_id);
        }
        if self.page != Page::Payment {
            return Vec::new();
        }
        self.confirm_switch()
    }

    pub(crate) fn profile_updated(&mut self, result: Result<Profile, ApiError>) -> Vec<Command> {
        match result {
            Ok(profile) => {
                self.data.profile = Some(profile);
                Vec::new()
            }
            Err(error) => self.report_error(error),
        }
    }

    fn start_payment_link(&mut self) -> Vec<Command> {
        let Some(api) = self.api() else {
            return Vec::new();
        };
        let state = &mut self.state.payment;
        state.link_generation += 1;
        state.generating = true;
        state.polling = true;
        state.view = PaymentView::Link;
        let generation = state.link_generation;
        vec![Command::new("card.collect", async move {
            Msg::PaymentLinkCreated {
                generation,
                result: api.card_collect().await,
            }
        })]
    }

    pub(crate) fn payment_link_created(
        &mut self,
        generation: u64,
        result: Result<String, ApiError>,
    ) -> Vec<Command> {
        if generation != self.state.payment.link_generation {
            debug!(generation, "dropping superseded payment link");
            return Vec::new();
        }
        self.state.payment.generating = false;
        match result {
            Ok(url) => {
                info!("payment link created");
                self.state.payment.link = Some(url);
                self.poll_cards(None)
            }
            Err(error) => {
                self.state.payment.stop_link();
                self.state.payment.view = PaymentView::List;
                self.report_error(error)
            }
        }
    }

    fn poll_cards(&self, delay: Option<Duration>) -> Vec<Command> {
        let Some(api) = self.api() else {
            return Vec::new();
        };
        let card_count = self.data.cards.len();
        let generation = self.state.payment.link_generation;
        let poll = async move {
            Msg::PaymentLinkPolled {
                generation,
                card_count,
                result: api.card_list().await,
            }
        };
        let command = match delay {
            Some(delay) => Command::after("card.poll", delay, poll),
            None => Command::new("card.poll", poll),
        };
        vec![command]
    }

    pub(crate) fn payment_link_polled(
        &mut self,
        generation: u64,
        card_count: usize,
        result: Result<Vec<Card>, ApiError>,
    ) -> Vec<Command> {
        let state = &self.state.payment;
        if self.page != Page::Payment
            || state.view != PaymentView::Link
            || !state.polling
            || generation != state.link_generation
        {
            debug!("dropping payment link poll");
            return Vec::new();
        }
        let cards = match result {
            Ok(cards) => cards,
            Err(error) => {
                warn!(%error, "polling for new card failed");
                return self.poll_cards(Some(POLL_INTERVAL));
            }
        };
        if cards.len() <= card_count {
            return self.poll_cards(Some(POLL_INTERVAL));
        }

        info!("card added through payment link");
        let Some(card_id) = cards.last().map(|card| card.id.clone()) else {
            return Vec::new();
        };
        self.data.cards = cards;
        let count = self.data.cards.len();
        let state = &mut self.state.payment;
        state.stop_link();
        state.view = PaymentView::List;
        state.list.select(count - 1, count);
        self.select_card(card_id)
    }

    fn costs_line(&self) -> Line<'static> {
        let cart = &self.data.cart;
        Line::from(vec![
            Span::styled("subtotal: ", self.theme.muted()),
            Span::styled(format_usd(cart.subtotal), self.theme.base()),
            Span::styled(", shipping: ", self.theme.muted()),
            Span::styled(format_usd(cart.shipping_cost()), self.theme.base()),
            Span::styled(", total: ", self.theme.muted()),
            Span::styled(format_usd(cart.total()), self.theme.bold()),
        ])
    }

    pub(crate) fn payment_view(&self, width: u16) -> Vec<Line<'static>> {
        let state = &self.state.payment;
        let mut lines = Vec::new();
        if !self.is_subscribing() {
            lines.push(self.costs_line());
            lines.push(Line::default());
        }
        if state.submitting {
            lines.push(Line::styled("verifying payment details...", self.theme.muted()));
            return lines;
        }
        if state.generating {
            lines.push(Line::styled("generating payment link...", self.theme.muted()));
            return lines;
        }
        match state.view {
            PaymentView::Form => {
                let columns = self.layout.breakpoint.is_split();
                lines.extend(state.form.view(width, columns, &self.theme));
            }
            PaymentView::Link => {
                lines.push(Line::styled("open this link to add a card:", self.theme.base()));
                lines.push(Line::default());
                if let Some(link) = &state.link {
                    lines.extend(paragraph(link, width, self.theme.accent()));
                }
                lines.push(Line::default());
                lines.push(Line::styled("waiting for your card...", self.theme.muted()));
                lines.push(key_hints(&[("esc", "cancel")], &self.theme));
            }
            PaymentView::List => {
                for (index, card) in self.data.cards.iter().enumerate() {
                    let selected = index == state.list.selected();
                    let content = if state.list.deleting() == Some(index) {
                        card_delete_prompt(&self.theme)
                    } else {
                        card_lines(card, selected, &self.theme)
                    };
                    lines.extend(boxed(content, width, self.theme.border(selected)));
                }
                let add_selected = state.list.is_add_slot(self.data.cards.len());
                let style = if add_selected {
                    self.theme.selected()
                } else {
                    self.theme.muted()
                };
                lines.extend(boxed(
                    vec![Line::styled("+ add new card", style)],
                    width,
                    self.theme.border(add_selected),
                ));
                lines.push(key_hints(&[("b", "add a card in your browser")], &self.theme));
            }
        }
        lines
    }
}

/// Masked number and expiry of a saved card.
pub(crate) fn card_lines(card: &Card, selected: bool, theme: &Theme) -> Vec<Line<'static>> {
    let style = if selected { theme.selected() } else { theme.bold() };
    vec![
        Line::from(vec![
            Span::styled(format!("{} ", card.brand.to_lowercase()), style),
            Span::styled(format!("**** **** **** {}", card.last4), theme.base()),
        ]),
        Line::styled(format!("expires {}", card.expiration), theme.muted()),
    ]
}

/// Replaces a card's lines while a deletion awaits confirmation.
pub(crate) fn card_delete_prompt(theme: &Theme) -> Vec<Line<'static>> {
    vec![
        Line::styled("delete this card?", theme.warning()),
        confirm_hint(theme),
    ]
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::form::FormStatus;
    use crate::keys::{ch, key};
    use crate::testing::{FakeShop, address, card, loaded_session, plain_lines, product};

    async fn session_at_payment(shop: &FakeShop) -> Session {
        shop.set_products(vec![product("cron", false)]);
        shop.set_addresses(vec![address("home")]);
        let (session, _) = loaded_session(shop, 120, 40).await;
        let (session, commands) = session.press(ch('+'));
        let session = session.run_all(commands).await;
        let (session, _) = session.press(ch('c'));
        let (session, _) = session.press(key(KeyCode::Enter));
        let (session, commands) = session.press(key(KeyCode::Enter));
        let session = session.run_all(commands).await;
        assert_eq!(session.page(), Page::Payment);
        session
    }

    #[tokio::test]
    async fn empty_cart_cannot_reach_payment() {
        let shop = FakeShop::new();
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        let commands = session.payment_switch();
        assert!(commands.is_empty());
        assert_eq!(session.page(), Page::Shop);
    }

    #[tokio::test]
    async fn shows_costs_and_saved_cards() {
        let shop = FakeShop::new();
        shop.set_cards(vec![card("visa", "4242")]);
        let session = session_at_payment(&shop).await;
        let text = plain_lines(&session.payment_view(60)).join("\n");
        assert!(text.contains("subtotal: $22.00, shipping: $5.00, total: $27.00"));
        assert!(text.contains("**** **** **** 4242"));
        assert!(text.contains("expires 12/30"));
    }

    #[tokio::test]
    async fn new_card_is_tokenized_and_attached() {
        let shop = FakeShop::new();
        let session = session_at_payment(&shop).await;
        let (session, _) = session.press(key(KeyCode::Enter));
        assert_eq!(session.state.payment.view, PaymentView::Form);

        let (session, commands) = session.fill_form(&[
            "",
            "",
            "4242 4242 4242 4242",
            "12",
            "30",
            "123",
            "11201",
        ]);
        let labels: Vec<_> = commands.iter().map(Command::label).collect();
        assert_eq!(labels, vec!["card.create"]);
        assert_eq!(session.state.payment.form.value("number"), "");
        assert_eq!(session.state.payment.form.value("cvc"), "");
        let text = plain_lines(&session.payment_view(60)).join("\n");
        assert!(text.contains("verifying payment details..."));

        let session = session.run_all(commands).await;
        assert_eq!(session.page(), Page::Confirm);
        assert_eq!(session.data.cards.len(), 1);
        assert_eq!(shop.tokenized(), vec!["4242424242424242".to_owned()]);
        assert_eq!(session.cart().card_id, Some(session.data.cards[0].id.clone()));
    }

    #[tokio::test]
    async fn edited_contact_details_update_the_profile() {
        let shop = FakeShop::new();
        let session = session_at_payment(&shop).await;
        let (session, _) = session.press(key(KeyCode::Enter));
        let (session, commands) = session.fill_form(&[
            "x",
            "",
            "4242424242424242",
            "01",
            "31",
            "999",
            "10001",
        ]);
        let labels: Vec<_> = commands.iter().map(Command::label).collect();
        assert_eq!(labels, vec!["card.create", "profile.update"]);
        let session = session.run_all(commands).await;
        let name = session.data.profile.as_ref().and_then(|p| p.user.name.clone());
        assert_eq!(name.as_deref(), Some("jane doex"));
    }

    #[tokio::test]
    async fn declined_card_keeps_form_and_shows_error() {
        let shop = FakeShop::new();
        shop.fail_next("tokenize", "your card was declined");
        let session = session_at_payment(&shop).await;
        let (session, _) = session.press(key(KeyCode::Enter));
        let (session, commands) =
            session.fill_form(&["", "", "4242424242424242", "12", "30", "123", "11201"]);
        let session = session.run_all(commands).await;
        assert_eq!(session.page(), Page::Payment);
        assert_eq!(session.state.payment.view, PaymentView::Form);
        assert_eq!(session.error(), Some("your card was declined"));
    }

    #[tokio::test(start_paused = true)]
    async fn payment_link_polls_until_a_card_appears() {
        let shop = FakeShop::new();
        let session = session_at_payment(&shop).await;
        let (session, commands) = session.press(ch('b'));
        assert_eq!(session.state.payment.view, PaymentView::Link);
        let text = plain_lines(&session.payment_view(60)).join("\n");
        assert!(text.contains("generating payment link..."));

        let msg = commands.into_iter().next().unwrap().run().await;
        let (session, commands) = session.update(msg);
        assert!(session.state.payment.link.is_some());
        let poll = commands.into_iter().next().unwrap().run().await;
        let (session, commands) = session.update(poll);
        assert_eq!(commands[0].label(), "card.poll");
        assert_eq!(session.state.payment.view, PaymentView::Link);

        shop.set_cards(vec![card("visa", "4242")]);
        let session = session.run_all(commands).await;
        assert_eq!(session.page(), Page::Confirm);
        assert_eq!(session.state.payment.list.selected(), 0);
        assert_eq!(session.cart().card_id.as_deref(), Some("visa-4242"));
    }

    #[tokio::test]
    async fn leaving_the_link_view_stops_polling() {
        let shop = FakeShop::new();
        let session = session_at_payment(&shop).await;
        let (session, commands) = session.press(ch('b'));
        let msg = commands.into_iter().next().unwrap().run().await;
        let (session, commands) = session.update(msg);
        let (session, _) = session.press(key(KeyCode::Esc));
        assert_eq!(session.state.payment.view, PaymentView::List);

        shop.set_cards(vec![card("visa", "4242")]);
        let poll = commands.into_iter().next().unwrap().run().await;
        let (session, commands) = session.update(poll);
        assert!(commands.is_empty());
        assert_eq!(session.page(), Page::Payment);
        assert!(session.data.cards.is_empty());
    }

    #[tokio::test]
    async fn returning_to_payment_clears_in_flight_work() {
        let shop = FakeShop::new();
        let session = session_at_payment(&shop).await;
        let (session, _) = session.press(key(KeyCode::Enter));
        let (mut session, commands) =
            session.fill_form(&["", "", "4242424242424242", "12", "30", "123", "11201"]);
        assert_eq!(commands.len(), 1);
        assert!(session.state.payment.submitting);

        session.cart_switch();
        session.payment_switch();
        let state = &session.state.payment;
        assert_eq!(state.view, PaymentView::List);
        assert!(!state.submitting);
        assert_eq!(state.form.status(), FormStatus::Idle);

        let (mut session, commands) = session.press(ch('b'));
        assert_eq!(commands.len(), 1);
        assert!(session.state.payment.generating);
        session.cart_switch();
        session.payment_switch();
        let state = &session.state.payment;
        assert!(!state.generating);
        assert!(!state.polling);
        assert!(state.link.is_none());
    }

    #[tokio::test]
    async fn reopening_the_link_view_drops_the_old_poll() {
        let shop = FakeShop::new();
        let session = session_at_payment(&shop).await;
        let (session, commands) = session.press(ch('b'));
        let msg = commands.into_iter().next().unwrap().run().await;
        let (session, first_polls) = session.update(msg);
        let (session, _) = session.press(key(KeyCode::Esc));

        let (session, commands) = session.press(ch('b'));
        let msg = commands.into_iter().next().unwrap().run().await;
        let (session, second_polls) = session.update(msg);
        assert_eq!(session.state.payment.view, PaymentView::Link);
        assert!(session.state.payment.polling);

        let old_tick = first_polls.into_iter().next().unwrap().run().await;
        let (session, commands) = session.update(old_tick);
        assert!(commands.is_empty());

        let new_tick = second_polls.into_iter().next().unwrap().run().await;
        let (_, commands) = session.update(new_tick);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].label(), "card.poll");
    }
}
