use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{ApiError, NewToken, Token};
use tracing::info;

use crate::command::Command;
use crate::msg::{Msg, Resource};
use crate::pages::shipping::confirm_hint;
use crate::selection::{ListAction, SelectionList};
use crate::session::Session;
use crate::text::{boxed, paragraph};

pub(crate) const TOKEN_HEIGHT: u16 = 4;

#[derive(Debug, Clone)]
pub(crate) struct TokensState {
    pub list: SelectionList,
    pub generating: bool,
    /// Shown once, right after creation.
    pub new_token: Option<NewToken>,
}

impl Default for TokensState {
    fn default() -> Self {
        Self {
            list: SelectionList::with_add_slot(),
            generating: false,
            new_token: None,
        }
    }
}

impl TokensState {
    pub fn reset(&mut self) {
        self.list.reset();
        self.generating = false;
        self.new_token = None;
    }
}

impl Session {
    pub(crate) fn tokens_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        if self.state.tokens.generating {
            return Vec::new();
        }
        let count = self.data.tokens.len();
        match self.state.tokens.list.handle_key(key, count) {
            ListAction::Moved => {
                let selected = self.state.tokens.list.selected();
                self.account_reveal(selected, TOKEN_HEIGHT);
                Vec::new()
            }
            ListAction::Add => self.generate_token(),
            ListAction::DeleteConfirmed(index) => match self.data.tokens.get(index) {
                Some(token) => {
                    let id = token.id.clone();
                    self.state.tokens.new_token = None;
                    self.state.tokens.list.start();
                    self.delete_resource(Resource::Token, id)
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

    fn generate_token(&mut self) -> Vec<Command> {
        let Some(api) = self.api() else {
            return Vec::new();
        };
        self.state.tokens.generating = true;
        self.state.tokens.new_token = None;
        vec![Command::new("token.create", async move {
            let result = async {
                let token = api.token_create().await?;
                let tokens = api.token_list().await?;
                Ok::<_, ApiError>((token, tokens))
            }
            .await;
            Msg::TokenCreated(result)
        })]
    }

    pub(crate) fn token_created(
        &mut self,
        result: Result<(NewToken, Vec<Token>), ApiError>,
    ) -> Vec<Command> {
        self.state.tokens.generating = false;
        match result {
            Ok((token, tokens)) => {
                info!(token = %token.id, "access token created");
                self.data.tokens = tokens;
                self.clamp_lists();
                self.state.tokens.new_token = Some(token);
                Vec::new()
            }
            Err(error) => self.report_error(error),
        }
    }

    pub(crate) fn tokens_view(&self, width: u16) -> Vec<Line<'static>> {
        let state = &self.state.tokens;
        let focused = self.state.account.focused;
        let mut lines = Vec::new();
        for (index, token) in self.data.tokens.iter().enumerate() {
            let selected = focused && index == state.list.selected();
            let content = if state.list.deleting() == Some(index) {
                vec![
                    Line::styled("revoke this token?", self.theme.warning()),
                    confirm_hint(&self.theme),
                ]
            } else {
                let style = if selected {
                    self.theme.selected()
                } else {
                    self.theme.bold()
                };
                vec![
                    Line::styled(token.token.clone(), style),
                    Line::styled(
                        format!("created {}", token.created.as_deref().unwrap_or("-")),
                        self.theme.muted(),
                    ),
                ]
            };
            lines.extend(boxed(content, width, self.theme.border(selected)));
        }
        let add_selected = focused && state.list.is_add_slot(self.data.tokens.len());
        let label = if state.generating {
            "generating..."
        } else {
            "+ generate new token"
        };
        let style = if add_selected {
            self.theme.selected()
        } else {
            self.theme.muted()
        };
        lines.extend(boxed(
            vec![Line::styled(label, style)],
            width,
            self.theme.border(add_selected),
        ));

        if let Some(token) = &state.new_token {
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("new token ", self.theme.accent()),
                Span::styled("(will not be shown again)", self.theme.warning()),
            ]));
            lines.extend(paragraph(&token.token, width, self.theme.bold()));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::keys::key;
    use crate::pages::account::AccountSection;
    use crate::testing::{FakeShop, loaded_session, plain_lines};

    #[tokio::test]
    async fn new_token_is_shown_once() {
        let shop = FakeShop::new();
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        session.account_switch();
        session.account_focus(AccountSection::Tokens);

        let (session, commands) = session.press(key(KeyCode::Enter));
        assert!(session.state.tokens.generating);
        let session = session.run_all(commands).await;
        assert_eq!(session.data.tokens.len(), 1);
        let text = plain_lines(&session.tokens_view(60)).join("\n");
        assert!(text.contains("(will not be shown again)"));
        assert!(text.contains("secret-token-1"));

        let (session, _) = session.press(crate::keys::ch('s'));
        let (session, _) = session.press(crate::keys::ch('a'));
        let text = plain_lines(&session.tokens_view(60)).join("\n");
        assert!(!text.contains("secret-token-1"));
    }
}
