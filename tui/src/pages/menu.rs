use crossterm::event::KeyEvent;
use ratatui::text::Line;

use crate::command::Command;
use crate::keys::{is_enter, is_esc, is_next, is_previous};
use crate::page::Page;
use crate::pages::account::AccountSection;
use crate::session::Session;

/// Full-screen picker over the menu of the page it was opened from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MenuState {
    pub selected: usize,
    pub return_to: Page,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            selected: 0,
            return_to: Page::Shop,
        }
    }
}

impl Session {
    pub(crate) fn menu_switch(&mut self) -> Vec<Command> {
        let selected = match self.page {
            Page::Account => self.state.account.selected,
            _ => self.state.shop.selected,
        };
        self.state.menu = MenuState {
            selected,
            return_to: self.page,
        };
        self.switch_page(Page::Menu);
        Vec::new()
    }

    fn menu_len(&self) -> usize {
        match self.state.menu.return_to {
            Page::Account => AccountSection::ALL.len(),
            _ => self.data.products.len(),
        }
    }

    pub(crate) fn menu_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        let count = self.menu_len();
        let menu = &mut self.state.menu;
        if is_next(key) {
            menu.selected = (menu.selected + 1).min(count.saturating_sub(1));
            let target = u16::try_from(menu.selected).unwrap_or(u16::MAX);
            self.state.body.reveal(target, 1);
            Vec::new()
        } else if is_previous(key) {
            menu.selected = menu.selected.saturating_sub(1);
            let target = u16::try_from(menu.selected).unwrap_or(u16::MAX);
            self.state.body.reveal(target, 1);
            Vec::new()
        } else if is_enter(key) {
            let selected = menu.selected;
            match menu.return_to {
                Page::Account => {
                    self.switch_page(Page::Account);
                    self.account_focus(AccountSection::ALL[selected.min(count - 1)]);
                    Vec::new()
                }
                _ => {
                    let commands = self.shop_switch();
                    self.shop_select(selected);
                    commands
                }
            }
        } else if is_esc(key) {
            let page = menu.return_to;
            self.switch_page(page);
            Vec::new()
        } else {
            Vec::new()
        }
    }

    pub(crate) fn menu_view(&self, _width: u16) -> Vec<Line<'static>> {
        let labels: Vec<String> = match self.state.menu.return_to {
            Page::Account => AccountSection::ALL
                .iter()
                .map(|section| section.label().to_owned())
                .collect(),
            _ => self
                .data
                .products
                .iter()
                .map(|product| product.name.clone())
                .collect(),
        };
        labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| {
                if index == self.state.menu.selected {
                    Line::styled(format!("> {label}"), self.theme.selected())
                } else {
                    Line::styled(format!("  {label}"), self.theme.base())
                }
            })
            .collect()
    }
}
