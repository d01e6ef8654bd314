use ratatui::text::{Line, Span};

use crate::session::Session;
use crate::text::paragraph;

impl Session {
    pub(crate) fn about_view(&self, width: u16) -> Vec<Line<'static>> {
        let mut lines = paragraph(
            &format!(
                "{} is a coffee shop you reach over ssh. browse, order and manage \
                 subscriptions without leaving the terminal.",
                self.services.shop_name
            ),
            width,
            self.theme.base(),
        );
        lines.push(Line::default());
        let identity = if self.identity.anonymous {
            Span::styled("anonymous session", self.theme.warning())
        } else {
            Span::styled(self.identity.fingerprint.clone(), self.theme.muted())
        };
        lines.push(Line::from(vec![
            Span::styled("signed in as ", self.theme.muted()),
            identity,
        ]));
        if let Some(email) = self
            .data
            .profile
            .as_ref()
            .and_then(|profile| profile.user.email.clone())
        {
            lines.push(Line::styled(email, self.theme.muted()));
        }
        lines
    }
}
