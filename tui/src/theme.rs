use ratatui::style::{Color, Modifier, Style};

const DEFAULT_HIGHLIGHT: Color = Color::Rgb(0xFF, 0x5C, 0x00);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    highlight: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            highlight: DEFAULT_HIGHLIGHT,
        }
    }
}

impl Theme {
    /// Theme highlighted with a product's `#rrggbb` tag color, if it parses.
    pub fn from_hex(hex: Option<&str>) -> Self {
        Self {
            highlight: hex.and_then(parse_hex).unwrap_or(DEFAULT_HIGHLIGHT),
        }
    }

    pub fn highlight(&self) -> Color {
        self.highlight
    }

    pub fn base(&self) -> Style {
        Style::new().fg(Color::White)
    }

    pub fn muted(&self) -> Style {
        Style::new().fg(Color::DarkGray)
    }

    pub fn accent(&self) -> Style {
        Style::new().fg(self.highlight)
    }

    pub fn selected(&self) -> Style {
        self.accent().add_modifier(Modifier::BOLD)
    }

    pub fn bold(&self) -> Style {
        self.base().add_modifier(Modifier::BOLD)
    }

    pub fn error(&self) -> Style {
        Style::new().fg(Color::White).bg(Color::Red)
    }

    pub fn warning(&self) -> Style {
        Style::new().fg(Color::Yellow)
    }

    pub fn border(&self, selected: bool) -> Style {
        if selected {
            self.accent()
        } else {
            self.muted()
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_colors() {
        assert_eq!(
            Theme::from_hex(Some("#1E90FF")).highlight(),
            Color::Rgb(0x1E, 0x90, 0xFF)
        );
        assert_eq!(Theme::from_hex(Some("blue")).highlight(), DEFAULT_HIGHLIGHT);
        assert_eq!(Theme::from_hex(None).highlight(), DEFAULT_HIGHLIGHT);
    }
}
