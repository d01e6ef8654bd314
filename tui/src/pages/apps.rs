use crossterm::event::KeyEvent;
use ratatui::text::{Line, Span};
use shopterm_api::{ApiError, App, AppInput, NewApp};
use tracing::info;

use crate::command::Command;
use crate::form::{Field, Form, FormEvent};
use crate::keys::is_esc;
use crate::msg::{Msg, Resource};
use crate::pages::shipping::confirm_hint;
use crate::selection::{ListAction, SelectionList};
use crate::session::Session;
use crate::text::boxed;
use crate::validate::required;

pub(crate) const APP_HEIGHT: u16 = 5;

#[derive(Debug, Clone)]
pub(crate) struct AppsState {
    pub list: SelectionList,
    /// The create form has the keyboard.
    pub editing: bool,
    pub form: Form,
    pub submitting: bool,
    /// Credentials of the app just created, shown once.
    pub new_app: Option<NewApp>,
}

impl Default for AppsState {
    fn default() -> Self {
        Self {
            list: SelectionList::with_add_slot(),
            editing: false,
            form: app_form(),
            submitting: false,
            new_app: None,
        }
    }
}

impl AppsState {
    pub fn reset(&mut self) {
        self.list.reset();
        self.editing = false;
        self.submitting = false;
        self.form.reset();
        self.new_app = None;
    }
}

fn app_form() -> Form {
    Form::new(vec![
        Field::new("name", "app name")
            .placeholder("my terminal app")
            .validate_with(required),
        Field::new("redirect_uri", "redirect uri")
            .placeholder("https://example.com/callback")
            .validate_with(required),
    ])
}

impl Session {
    pub(crate) fn apps_update(&mut self, key: &KeyEvent) -> Vec<Command> {
        if self.state.apps.submitting {
            return Vec::new();
        }
        if self.state.apps.editing {
            if is_esc(key) {
                self.state.apps.editing = false;
                return Vec::new();
            }
            return match self.state.apps.form.handle_key(key) {
                FormEvent::Submit => self.create_app(),
                FormEvent::None | FormEvent::Edited => Vec::new(),
            };
        }
        let count = self.data.apps.len();
        match self.state.apps.list.handle_key(key, count) {
            ListAction::Moved => {
                let selected = self.state.apps.list.selected();
                self.account_reveal(selected, APP_HEIGHT);
                Vec::new()
            }
            ListAction::Add => {
                let state = &mut self.state.apps;
                state.form.reset();
                state.editing = true;
                state.new_app = None;
                Vec::new()
            }
            ListAction::DeleteConfirmed(index) => match self.data.apps.get(index) {
                Some(app) => {
                    let id = app.id.clone();
                    self.state.apps.new_app = None;
                    self.state.apps.list.start();
                    self.delete_resource(Resource::App, id)
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

    fn create_app(&mut self) -> Vec<Command> {
        let Some(api) = self.api() else {
            self.state.apps.form.idle();
            return Vec::new();
        };
        let form = &self.state.apps.form;
        let input = AppInput {
            name: form.value("name").to_owned(),
            redirect_uri: form.value("redirect_uri").to_owned(),
        };
        self.state.apps.submitting = true;
        vec![Command::new("app.create", async move {
            let result = async {
                let app = api.app_create(&input).await?;
                let apps = api.app_list().await?;
                Ok::<_, ApiError>((app, apps))
            }
            .await;
            Msg::AppCreated(result)
        })]
    }

    pub(crate) fn app_created(
        &mut self,
        result: Result<(NewApp, Vec<App>), ApiError>,
    ) -> Vec<Command> {
        self.state.apps.submitting = false;
        match result {
            Ok((app, apps)) => {
                info!(app = %app.id, "oauth app created");
                self.data.apps = apps;
                self.clamp_lists();
                let state = &mut self.state.apps;
                state.form.complete();
                state.editing = false;
                state.new_app = Some(app);
                Vec::new()
            }
            Err(error) => {
                self.state.apps.form.fail();
                self.report_error(error)
            }
        }
    }

    pub(crate) fn apps_view(&self, width: u16) -> Vec<Line<'static>> {
        let state = &self.state.apps;
        if state.editing {
            let mut lines = state.form.view(width, false, &self.theme);
            if state.submitting {
                lines.push(Line::styled("creating app...", self.theme.muted()));
            }
            return lines;
        }
        let focused = self.state.account.focused;
        let mut lines = Vec::new();
        for (index, app) in self.data.apps.iter().enumerate() {
            let selected = focused && index == state.list.selected();
            let name_style = if selected {
                self.theme.selected()
            } else {
                self.theme.bold()
            };
            let content = if state.list.deleting() == Some(index) {
                vec![
                    Line::styled(app.name.clone(), name_style),
                    Line::styled("delete this app?", self.theme.warning()),
                    confirm_hint(&self.theme),
                ]
            } else {
                vec![
                    Line::styled(app.name.clone(), name_style),
                    Line::styled(format!("client id {}", app.id), self.theme.muted()),
                    Line::styled(format!("redirect {}", app.redirect_uri), self.theme.muted()),
                ]
            };
            lines.extend(boxed(content, width, self.theme.border(selected)));
        }
        let add_selected = focused && state.list.is_add_slot(self.data.apps.len());
        let style = if add_selected {
            self.theme.selected()
        } else {
            self.theme.muted()
        };
        lines.extend(boxed(
            vec![Line::styled("+ create new app", style)],
            width,
            self.theme.border(add_selected),
        ));

        if let Some(app) = &state.new_app {
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled("client secret ", self.theme.accent()),
                Span::styled("(will not be shown again)", self.theme.warning()),
            ]));
            lines.push(Line::styled(app.secret.clone(), self.theme.bold()));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::form::FormStatus;
    use crate::keys::{ch, key};
    use crate::pages::account::AccountSection;
    use crate::testing::{FakeShop, loaded_session, plain_lines};

    #[tokio::test]
    async fn create_app_captures_text_until_done() {
        let shop = FakeShop::new();
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        session.account_switch();
        session.account_focus(AccountSection::Apps);

        let (session, _) = session.press(key(KeyCode::Enter));
        assert!(session.state.apps.editing);
        assert!(session.is_capturing_text());
        assert!(!session.has_menu());

        // Header keys are typed into the form while editing.
        let (session, commands) = session.fill_form(&["quasar", "https://q.sh/cb"]);
        assert_eq!(session.page(), crate::page::Page::Account);
        assert_eq!(commands.len(), 1);
        let session = session.run_all(commands).await;
        assert!(!session.state.apps.editing);
        assert_eq!(session.data.apps[0].name, "quasar");
        let text = plain_lines(&session.apps_view(60)).join("\n");
        assert!(text.contains("(will not be shown again)"));
        assert!(text.contains("app-secret-1"));
    }

    #[tokio::test]
    async fn esc_cancels_editing_then_unfocuses() {
        let shop = FakeShop::new();
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        session.account_switch();
        session.account_focus(AccountSection::Apps);
        let (session, _) = session.press(key(KeyCode::Enter));
        let (session, _) = session.press(ch('x'));
        let (session, _) = session.press(key(KeyCode::Esc));
        assert!(!session.state.apps.editing);
        assert!(session.state.account.focused);
        let (session, _) = session.press(key(KeyCode::Esc));
        assert!(!session.state.account.focused);
    }

    #[tokio::test]
    async fn leaving_account_abandons_the_create_form() {
        let shop = FakeShop::new();
        let (mut session, _) = loaded_session(&shop, 120, 40).await;
        session.account_switch();
        session.account_focus(AccountSection::Apps);
        let (session, _) = session.press(key(KeyCode::Enter));
        let (mut session, commands) = session.fill_form(&["quasar", "https://q.sh/cb"]);
        assert_eq!(commands.len(), 1);
        assert!(session.state.apps.submitting);

        session.shop_switch();
        session.account_switch();
        let state = &session.state.apps;
        assert!(!state.editing);
        assert!(!state.submitting);
        assert_eq!(state.form.status(), FormStatus::Idle);
        assert!(state.new_app.is_none());
    }
}
