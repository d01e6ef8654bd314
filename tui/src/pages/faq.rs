use ratatui::text::Line;
use serde::Deserialize;

use crate::session::Session;
use crate::text::paragraph;

/// A question and answer shown in the account's faq section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

impl Session {
    pub(crate) fn faq_view(&self, width: u16) -> Vec<Line<'static>> {
        if self.services.faqs.is_empty() {
            return vec![Line::styled("nothing here yet", self.theme.muted())];
        }
        let mut lines = Vec::new();
        for faq in self.services.faqs.iter() {
            lines.extend(paragraph(&faq.question, width, self.theme.accent()));
            lines.extend(paragraph(&faq.answer, width, self.theme.base()));
            lines.push(Line::default());
        }
        lines
    }
}
