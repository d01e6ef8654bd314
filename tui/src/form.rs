use crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::{Line, Span};

use crate::keys::plain;
use crate::theme::Theme;
use crate::validate::{ValidationError, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Idle,
    Validating,
    Submitting,
    Submitted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    None,
    Edited,
    Submit,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub value: String,
    default: &'static str,
    max_len: Option<usize>,
    validators: Vec<Validator>,
    pub error: Option<ValidationError>,
}

impl Field {
    pub fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            placeholder: "",
            value: String::new(),
            default: "",
            max_len: None,
            validators: Vec::new(),
            error: None,
        }
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = value;
        self.value = value.to_owned();
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    fn validate(&mut self) -> bool {
        self.error = self
            .validators
            .iter()
            .find_map(|validator| validator(self.label, self.value.trim()).err());
        self.error.is_none()
    }
}

/// Text input buffers with focus, validation and submission status.
#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<Field>,
    focused: usize,
    status: FormStatus,
    error: Option<ValidationError>,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            focused: 0,
            status: FormStatus::Idle,
            error: None,
        }
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn is_submitting(&self) -> bool {
        self.status == FormStatus::Submitting
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.trim())
            .unwrap_or_default()
    }

    /// The trimmed value, or `None` when blank.
    pub fn optional(&self, name: &str) -> Option<String> {
        let value = self.value(name);
        (!value.is_empty()).then(|| value.to_owned())
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        if let Some(field) = self.fields.iter_mut().find(|field| field.name == name) {
            field.value = value.into();
        }
    }

    pub fn clear(&mut self, name: &str) {
        self.set_value(name, String::new());
    }

    /// Restore defaults and return to idle.
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value = field.default.to_owned();
            field.error = None;
        }
        self.focused = 0;
        self.status = FormStatus::Idle;
        self.error = None;
    }

    /// Back to idle, keeping values.
    pub fn idle(&mut self) {
        self.status = FormStatus::Idle;
    }

    pub fn complete(&mut self) {
        self.status = FormStatus::Submitted;
    }

    pub fn fail(&mut self) {
        self.status = FormStatus::Failed;
    }

    /// Report an error that involves more than one field.
    pub fn reject(&mut self, error: ValidationError) {
        self.error = Some(error);
        self.status = FormStatus::Failed;
    }

    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
            .or_else(|| self.fields.iter().find_map(|field| field.error.as_ref()))
    }

    /// Validate every field. On success the form is submitting.
    pub fn submit(&mut self) -> bool {
        if self.is_submitting() {
            return false;
        }
        self.status = FormStatus::Validating;
        self.error = None;
        let mut first_invalid = None;
        for (index, field) in self.fields.iter_mut().enumerate() {
            if !field.validate() && first_invalid.is_none() {
                first_invalid = Some(index);
            }
        }
        match first_invalid {
            Some(index) => {
                self.focused = index;
                self.status = FormStatus::Failed;
                false
            }
            None => {
                self.status = FormStatus::Submitting;
                true
            }
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> FormEvent {
        if self.is_submitting() {
            return FormEvent::None;
        }
        let Some(code) = plain(key) else {
            return FormEvent::None;
        };
        let last = self.fields.len().saturating_sub(1);
        match code {
            KeyCode::Tab | KeyCode::Down => {
                self.focused = (self.focused + 1).min(last);
                FormEvent::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focused = self.focused.saturating_sub(1);
                FormEvent::None
            }
            KeyCode::Enter if self.focused < last => {
                self.focused += 1;
                FormEvent::None
            }
            KeyCode::Enter => {
                if self.submit() {
                    FormEvent::Submit
                } else {
                    FormEvent::None
                }
            }
            KeyCode::Backspace => {
                self.edit(|field| {
                    field.value.pop();
                });
                FormEvent::Edited
            }
            KeyCode::Char(ch) => {
                self.edit(|field| {
                    if field.max_len.is_none_or(|max| field.value.chars().count() < max) {
                        field.value.push(ch);
                    }
                });
                FormEvent::Edited
            }
            _ => FormEvent::None,
        }
    }

    fn edit(&mut self, edit: impl FnOnce(&mut Field)) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            edit(field);
            field.error = None;
        }
        self.error = None;
        if self.status != FormStatus::Idle {
            self.status = FormStatus::Idle;
        }
    }

    /// Render fields stacked, or in two columns when `columns` is set.
    pub fn view(&self, width: u16, columns: bool, theme: &Theme) -> Vec<Line<'static>> {
        let blocks: Vec<Vec<Line<'static>>> = self
            .fields
            .iter()
            .enumerate()
            .map(|(index, field)| self.field_view(field, index == self.focused, theme))
            .collect();

        let mut lines = Vec::new();
        if columns {
            let column_width = usize::from(width / 2);
            for pair in blocks.chunks(2) {
                let left = &pair[0];
                let right = pair.get(1);
                let height = left.len().max(right.map_or(0, Vec::len));
                for row in 0..height {
                    let mut spans = Vec::new();
                    let left_line = left.get(row).cloned().unwrap_or_default();
                    let padding = column_width.saturating_sub(left_line.width());
                    spans.extend(left_line.spans);
                    spans.push(Span::raw(" ".repeat(padding)));
                    if let Some(line) = right.and_then(|right| right.get(row)) {
                        spans.extend(line.spans.clone());
                    }
                    lines.push(Line::from(spans));
                }
            }
        } else {
            for block in blocks {
                lines.extend(block);
            }
        }

        if let Some(error) = &self.error {
            lines.push(Line::styled(error.to_string(), theme.error()));
        }
        lines
    }

    fn field_view(&self, field: &Field, focused: bool, theme: &Theme) -> Vec<Line<'static>> {
        let label_style = if focused { theme.selected() } else { theme.muted() };
        let mut input = vec![Span::styled(
            if focused { "> " } else { "  " },
            theme.accent(),
        )];
        if field.value.is_empty() {
            if focused {
                input.push(Span::styled("█", theme.accent()));
            }
            input.push(Span::styled(field.placeholder, theme.muted()));
        } else {
            input.push(Span::styled(field.value.clone(), theme.base()));
            if focused {
                input.push(Span::styled("█", theme.accent()));
            }
        }
        let mut lines = vec![Line::styled(field.label, label_style), Line::from(input)];
        match &field.error {
            Some(error) => lines.push(Line::styled(format!("  {error}"), theme.warning())),
            None => lines.push(Line::default()),
        }
        lines
    }
}
