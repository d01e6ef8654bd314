use crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::Line;

use crate::command::Command;
use crate::keys::{is_enter, is_esc, is_next, is_previous, plain};
use crate::layout::Panes;
use crate::msg::Resource;
use crate::page::Page;
use crate::pages::payment::{CARD_HEIGHT, card_delete_prompt, card_lines};
use crate::pages::shipping::{ADDRESS_HEIGHT, address_lines, delete_prompt};
use crate::pages::subscriptions::SUBSCRIPTION_HEIGHT;
use crate::selection::{ListAction, SelectionList};
use crate::session::Session;
use crate::text::boxed;
use crate::viewport::ViewportPair;

const MENU_PADDING: u16 = 4;
/// Title and blank line above every section's items.
const SECTION_HEADER: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccountSection {
    Orders,
    Subscriptions,
    Tokens,
    Apps,
    Addresses,
    Cards,
    Faq,
    About,
}

impl AccountSection {
    pub const ALL: [AccountSection; 8] = [
        AccountSection::Orders,
        AccountSection::Subscriptions,
        AccountSection::Tokens,
        AccountSection::Apps,
        AccountSection::Addresses,
        AccountSection::Cards,
        AccountSection::Faq,
        AccountSection::About,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AccountSection::Orders => "order history",
            AccountSection::Subscriptions => "subscriptions",
            AccountSection::Tokens => "access tokens",
            AccountSection::Apps => "apps (oauth 2.0)",
            AccountSection::Addresses => "addresses",
            AccountSection::Cards => "payment methods",
            AccountSection::Faq => "faq",
            AccountSection::About => "about",
        }
    }

    fn command(self) -> &'static str {
        match self {
            AccountSection::Orders => "orders",
            AccountSection::Subscriptions => "subscriptions",
            AccountSection::Tokens => "tokens",
            AccountSection::Apps => "apps",
            AccountSection::Addresses => "addresses",
            AccountSection::Cards => "cards",
            AccountSection::Faq => "faq",
            AccountSection::About => "about",
        }
    }

    /// The section whose command name starts with `prefix`.
    pub fn matching(prefix: &str) -> Option<Self> {
        if prefix.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|section| section.command().starts_with(prefix))
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|section| *section == self)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct AccountState {
    pub selected: usize,
    /// Keys go to the selected section rather than the section menu.
    pub focused: bool,
    pub viewports: Option<ViewportPair>,
    pub addresses: SelectionList,
    pub cards: SelectionList,
}

impl Default for AccountState {
    fn default() -> Self {
        Self {
            selected: 0,
            focused: false,
            viewports: None,
            addresses: SelectionList::new(),
            cards: SelectionList::new(),
        }
    }
}

impl AccountState {
    pub fn section(&self) -> AccountSection {
        AccountSection::ALL
            .get(self.selected)
            .copied()
            .unwrap_or(AccountSection::Orders)
    }
}

impl Session {
    pub(crate) fn account_switch(&mut self) -> Vec<Command> {
        self.switch_page(Page::Account);
        self.state.account.focused = false;
        self.state.account.addresses.reset();
        self.state.account.cards.reset();
        self.state.orders.viewing = None;
        self.state.tokens.reset();
        self.state.apps.reset();
        self.state.subscriptions.list.reset();
        if let Some(pair) = self.state.account.viewports.as_mut() {
            pair.detail.goto_top();
        }
        Vec::new()
    }

    /// Select a section and hand it the keyboard.
    pub(crate) fn account_focus(&mut self, section: AccountSection) {
        self.account_select(section.index());
        self.state.account.focused = true;
    }

    pub(crate) fn subscription_manage_switch(&mut self, index: usize) -> Vec<Command> {
        let commands = self.account_switch();
        self.account_focus(AccountSection::Subscriptions);
        let count = self.data.subscriptions.len();
        self.state.subscriptions.list.select(index, count);
        self.account_reveal(index, SUBSCRIPTION_HEIGHT);
        commands
    }

    pub(crate) fn account_select(&mut self, index: usize) {
        let index = index.min(AccountSection::ALL.len() - 1);
        if index != self.state.account.selected {
            self.state.account.selected = index;
            self.state.orders.viewing = None;
        }
        let target = u16::try_from(index).unwrap_or(u16::MAX);
        if let Some(pair) = self.state.account.viewports.as_mut() {
            pair.menu.reveal(target, 1);
            pair.detail.goto_top();
        }
    }

    /// Scroll the detail pane to show item `index` of the focused section.
    pub(crate) fn account_reveal(&mut self, index: usize, item_height: u16) {
        let target = u16::try_from(index)
            .unwrap_or(u16::MAX)
            .saturating_mul(item_height)
            .saturating_add(SECTION_HEADER);
        if let Some(pair) = self.state.account.viewports.as_mut() {
            pair.detail.reveal(target, item_height);
        }
    }

    pub(crate) fn account_detail_scroll(&mut self, key: &KeyEvent) {
        if let Some(pair) = self.state.account.viewports.as_mut() {
            pair.detail.handle_scroll_key(key);
        }
    }

    /// The focused section is in a nested state that owns esc.
    fn account_is_modal(&self) -> bool {
        match self.state.account.section() {
            AccountSection::Orders => self.state.orders.viewing.is_some(),
            AccountSection::Subscriptions => self.state.subscriptions.list.deleting().is_some(),
            AccountSection::Tokens => self.state.tokens.list.deleting().is_some(),
            AccountSection::Apps => {
                self.state.apps.editing || self.state.apps.list.deleting().is_some()
            }
            AccountSection::Addresses => self.state.account.addresses.deleting().is_some(),
            AccountSection::Cards => self.state.account.cards.deleting().is_some(),
            AccountSection::Faq | AccountSection::About => false,
        }
    }

    pub(crate) fn account_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        if !self.state.account.focused {
            return self.account_menu_update(key);
        }
        if !self.account_is_modal() && is_unfocus(key) {
            self.state.account.focused = false;
            return Vec::new();
        }
        match self.state.account.section() {
            AccountSection::Orders => self.orders_update(key),
            AccountSection::Subscriptions => self.subscriptions_update(key),
            AccountSection::Tokens => self.tokens_update(key),
            AccountSection::Apps => self.apps_update(key),
            AccountSection::Addresses => self.account_addresses_update(key),
            AccountSection::Cards => self.account_cards_update(key),
            AccountSection::Faq | AccountSection::About => {
                self.account_detail_scroll(key);
                Vec::new()
            }
        }
    }

    fn account_menu_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        if is_next(key) {
            self.account_select(self.state.account.selected + 1);
        } else if is_previous(key) {
            self.account_select(self.state.account.selected.saturating_sub(1));
        } else if is_focus(key) {
            self.state.account.focused = true;
        } else if is_esc(key) {
            return self.shop_switch();
        } else if let Some(pair) = self.state.account.viewports.as_mut() {
            pair.detail.handle_paging_key(key);
        }
        Vec::new()
    }

    fn account_addresses_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.data.addresses.len();
        match self.state.account.addresses.handle_key(key, count) {
            ListAction::Moved => {
                let selected = self.state.account.addresses.selected();
                self.account_reveal(selected, ADDRESS_HEIGHT);
                Vec::new()
            }
            ListAction::DeleteConfirmed(index) => match self.data.addresses.get(index) {
                Some(address) => {
                    let id = address.id.clone();
                    self.state.account.addresses.start();
                    self.delete_resource(Resource::Address, id)
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn account_cards_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.data.cards.len();
        match self.state.account.cards.handle_key(key, count) {
            ListAction::Moved => {
                let selected = self.state.account.cards.selected();
                self.account_reveal(selected, CARD_HEIGHT);
                Vec::new()
            }
            ListAction::DeleteConfirmed(index) => match self.data.cards.get(index) {
                Some(card) => {
                    let id = card.id.clone();
                    self.state.account.cards.start();
                    self.delete_resource(Resource::Card, id)
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    pub(crate) fn account_menu_width(&self) -> u16 {
        let longest = AccountSection::ALL
            .iter()
            .map(|section| section.label().len())
            .max()
            .unwrap_or(0);
        u16::try_from(longest)
            .unwrap_or(u16::MAX)
            .saturating_add(MENU_PADDING)
    }

    pub(crate) fn account_panes(&self) -> Panes {
        let menu_lines = u16::try_from(AccountSection::ALL.len()).unwrap_or(u16::MAX);
        self.layout.panes(self.account_menu_width(), menu_lines)
    }

    pub(crate) fn account_menu_view(&self) -> Vec<Line<'static>> {
        AccountSection::ALL
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let style = if index != self.state.account.selected {
                    self.theme.base()
                } else if self.state.account.focused {
                    self.theme.accent()
                } else {
                    self.theme.selected()
                };
                Line::styled(section.label(), style)
            })
            .collect()
    }

    pub(crate) fn account_detail_view(&self, width: u16) -> Vec<Line<'static>> {
        let section = self.state.account.section();
        let mut lines = vec![
            Line::styled(section.label(), self.theme.bold()),
            Line::default(),
        ];
        let body = match section {
            AccountSection::Orders => self.orders_view(width),
            AccountSection::Subscriptions => self.subscriptions_view(width),
            AccountSection::Tokens => self.tokens_view(width),
            AccountSection::Apps => self.apps_view(width),
            AccountSection::Addresses => self.account_addresses_view(width),
            AccountSection::Cards => self.account_cards_view(width),
            AccountSection::Faq => self.faq_view(width),
            AccountSection::About => self.about_view(width),
        };
        lines.extend(body);
        lines
    }

    fn account_addresses_view(&self, width: u16) -> Vec<Line<'static>> {
        if self.data.addresses.is_empty() {
            return vec![Line::styled("no saved addresses", self.theme.muted())];
        }
        let list = &self.state.account.addresses;
        let mut lines = Vec::new();
        for (index, address) in self.data.addresses.iter().enumerate() {
            let selected = self.state.account.focused && index == list.selected();
            let content = if list.deleting() == Some(index) {
                delete_prompt(&address.name, &self.theme)
            } else {
                address_lines(address, selected, &self.theme)
            };
            lines.extend(boxed(content, width, self.theme.border(selected)));
        }
        lines
    }

    fn account_cards_view(&self, width: u16) -> Vec<Line<'static>> {
        if self.data.cards.is_empty() {
            return vec![Line::styled("no saved payment methods", self.theme.muted())];
        }
        let list = &self.state.account.cards;
        let mut lines = Vec::new();
        for (index, card) in self.data.cards.iter().enumerate() {
            let selected = self.state.account.focused && index == list.selected();
            let content = if list.deleting() == Some(index) {
                card_delete_prompt(&self.theme)
            } else {
                card_lines(card, selected, &self.theme)
            };
            lines.extend(boxed(content, width, self.theme.border(selected)));
        }
        lines
    }
}

fn is_focus(key: &KeyEvent) -> bool {
    is_enter(key) || matches!(plain(key), Some(KeyCode::Right | KeyCode::Char('l')))
}

fn is_unfocus(key: &KeyEvent) -> bool {
    is_esc(key) || matches!(plain(key), Some(KeyCode::Left | KeyCode::Char('h')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{ch, key};
    use crate::testing::{FakeShop, address, card, loaded_session, plain_lines};

    #[test]
    fn sections_match_command_prefixes() {
        assert_eq!(AccountSection::matching("order"), Some(AccountSection::Orders));
        assert_eq!(AccountSection::matching("sub"), Some(AccountSection::Subscriptions));
        assert_eq!(AccountSection::matching("a"), Some(AccountSection::Apps));
        assert_eq!(AccountSection::matching("faq"), Some(AccountSection::Faq));
        assert_eq!(AccountSection::matching("bogus"), None);
        assert_eq!(AccountSection::matching(""), None);
    }

    #[tokio::test]
    async fn focus_and_unfocus_sections() {
        let shop = FakeShop::new();
        let (session, _) = loaded_session(&shop, 120, 40).await;
        let (session, _) = session.press(ch('a'));
        assert_eq!(session.page(), Page::Account);
        assert!(session.has_menu());

        let (session, _) = session.press(key(KeyCode::Down));
        assert_eq!(session.state.account.section(), AccountSection::Subscriptions);
        let (session, _) = session.press(key(KeyCode::Right));
        assert!(session.state.account.focused);
        let (session, _) = session.press(ch('h'));
        assert!(!session.state.account.focused);
        let (session, _) = session.press(key(KeyCode::Esc));
        assert_eq!(session.page(), Page::Shop);
    }

    #[tokio::test]
    async fn delete_saved_card_from_account() {
        let shop = FakeShop::new();
        shop.set_cards(vec![card("visa", "4242"), card("amex", "0005")]);
        shop.set_addresses(vec![address("home")]);
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        session.account_switch();
        session.account_focus(AccountSection::Cards);

        let (session, _) = session.press(key(KeyCode::Down));
        let (session, _) = session.press(ch('x'));
        let text = plain_lines(&session.account_detail_view(60)).join("\n");
        assert!(text.contains("delete this card?"));

        // esc cancels the pending deletion instead of leaving the section.
        let (session, _) = session.press(key(KeyCode::Esc));
        assert!(session.state.account.focused);
        assert_eq!(session.state.account.cards.deleting(), None);

        let (session, _) = session.press(ch('x'));
        let (session, commands) = session.press(ch('y'));
        let session = session.run_all(commands).await;
        assert_eq!(session.data.cards.len(), 1);
        assert_eq!(session.data.cards[0].last4, "4242");
        assert_eq!(session.state.account.cards.selected(), 0);
    }

    #[tokio::test]
    async fn long_sections_scroll_to_the_selection() {
        let shop = FakeShop::new();
        shop.set_addresses((0..10).map(|index| address(&format!("home-{index}"))).collect());
        let (mut session, _) = loaded_session(&shop, 120, 24).await;
        session.account_switch();
        session.account_focus(AccountSection::Addresses);
        let mut session = session.update(crate::msg::Msg::Resize { width: 120, height: 24 }).0;
        for _ in 0..6 {
            session = session.press(key(KeyCode::Down)).0;
        }
        let pair = session.state.account.viewports.unwrap();
        let target = 6 * ADDRESS_HEIGHT + SECTION_HEADER;
        assert!(pair.detail.y_offset() + pair.detail.height() >= target + ADDRESS_HEIGHT);
        assert!(pair.detail.y_offset() <= target);
    }
}
