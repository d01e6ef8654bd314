use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::theme::Theme;

/// Format cents as dollars, e.g. `1700` -> `$17.00`.
pub fn format_usd(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

pub fn display_width(text: &str) -> usize {
    Span::raw(text).width()
}

/// Greedy word wrap on display width. Words longer than `width` are split.
pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_owned();
            while display_width(&word) > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let split = split_at_width(&word, width);
                let rest = word.split_off(split);
                lines.push(word);
                word = rest;
            }
            let needed = if line.is_empty() {
                display_width(&word)
            } else {
                display_width(&line) + 1 + display_width(&word)
            };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

fn split_at_width(word: &str, width: usize) -> usize {
    let mut used = 0;
    for (index, ch) in word.char_indices() {
        let ch_width = display_width(ch.encode_utf8(&mut [0; 4]));
        if used + ch_width > width {
            return index.max(ch.len_utf8());
        }
        used += ch_width;
    }
    word.len()
}

/// Wrap text into styled lines.
pub fn paragraph(text: &str, width: u16, style: Style) -> Vec<Line<'static>> {
    word_wrap(text, usize::from(width))
        .into_iter()
        .map(|line| Line::styled(line, style))
        .collect()
}

/// Surround `content` with a rounded border `width` columns wide.
pub fn boxed(content: Vec<Line<'static>>, width: u16, border: Style) -> Vec<Line<'static>> {
    let width = usize::from(width.max(4));
    let inner = width - 4;
    let rule = "─".repeat(width - 2);
    let mut lines = Vec::with_capacity(content.len() + 2);
    lines.push(Line::styled(format!("╭{rule}╮"), border));
    for line in content {
        let padding = inner.saturating_sub(line.width());
        let mut spans = vec![Span::styled("│ ", border)];
        spans.extend(line.spans);
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(" │", border));
        lines.push(Line::from(spans));
    }
    lines.push(Line::styled(format!("╰{rule}╯"), border));
    lines
}

/// A row of `key label` hints, e.g. `↑/↓ products  c cart`.
pub fn key_hints<K, L>(hints: &[(K, L)], theme: &Theme) -> Line<'static>
where
    K: AsRef<str>,
    L: AsRef<str>,
{
    let mut spans = Vec::new();
    for (index, (key, label)) in hints.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(key.as_ref().to_owned(), theme.bold()));
        let label = label.as_ref();
        if !label.is_empty() {
            spans.push(Span::styled(format!(" {label}"), theme.muted()));
        }
    }
    Line::from(spans)
}

/// Center a line within `width` columns.
pub fn centered(line: Line<'static>, width: u16) -> Line<'static> {
    let padding = usize::from(width).saturating_sub(line.width()) / 2;
    let mut spans = vec![Span::raw(" ".repeat(padding))];
    spans.extend(line.spans);
    Line::from(spans)
}

/// Render `left` and `right` on one line, pushed to opposite edges.
pub fn spread(left: Vec<Span<'static>>, right: Vec<Span<'static>>, width: u16) -> Line<'static> {
    let used: usize = left.iter().chain(right.iter()).map(Span::width).sum();
    let gap = usize::from(width).saturating_sub(used).max(1);
    let mut spans = left;
    spans.push(Span::raw(" ".repeat(gap)));
    spans.extend(right);
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dollars() {
        assert_eq!(format_usd(1700), "$17.00");
        assert_eq!(format_usd(5), "$0.05");
        assert_eq!(format_usd(2250), "$22.50");
    }

    #[test]
    fn wraps_words() {
        assert_eq!(
            word_wrap("the quick brown fox jumps", 10),
            vec!["the quick", "brown fox", "jumps"]
        );
        assert_eq!(word_wrap("a\n\nb", 10), vec!["a", "", "b"]);
    }

    #[test]
    fn splits_long_words() {
        assert_eq!(
            word_wrap("https://example.com/pay", 10),
            vec!["https://ex", "ample.com/", "pay"]
        );
    }

    #[test]
    fn boxes_pad_to_width() {
        let lines = boxed(vec![Line::raw("hi")], 8, Style::new());
        let rendered: Vec<String> = lines.iter().map(|line| line.to_string()).collect();
        assert_eq!(rendered, vec!["╭──────╮", "│ hi   │", "╰──────╯"]);
    }
}
