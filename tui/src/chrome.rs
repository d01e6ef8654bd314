use ratatui::style::Style;
use ratatui::text::{Line, Span};
use shopterm_api::Region;

use crate::layout::Breakpoint;
use crate::page::Page;
use crate::pages::account::AccountSection;
use crate::pages::payment::PaymentView;
use crate::pages::shipping::ShippingView;
use crate::session::Session;
use crate::text::{centered, format_usd, key_hints, spread, word_wrap};
use crate::theme::Theme;

const TAGLINE: &str = "free shipping on US orders over $40";
const ERROR_HINT: &str = "esc";

/// Header, breadcrumbs and footer around the page body, rebuilt after every update.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub header: Vec<Line<'static>>,
    pub breadcrumbs: Vec<Line<'static>>,
    pub footer: Vec<Line<'static>>,
}

impl Chrome {
    pub fn height(&self) -> u16 {
        let lines = self.header.len() + self.breadcrumbs.len() + self.footer.len();
        u16::try_from(lines).unwrap_or(u16::MAX)
    }
}

pub(crate) fn build(session: &Session) -> Chrome {
    if session.page == Page::Splash || session.layout.breakpoint == Breakpoint::Undersized {
        return Chrome::default();
    }
    let width = session.layout.content_width;
    Chrome {
        header: header(session, width),
        breadcrumbs: breadcrumbs(session),
        footer: footer(session, width),
    }
}

fn header(session: &Session, width: u16) -> Vec<Line<'static>> {
    let theme = &session.theme;
    let small = session.layout.breakpoint == Breakpoint::Small;
    let cart = &session.data.cart;
    let cart_label = format!(
        "{} [{}]",
        format_usd(cart.subtotal),
        cart.item_count()
    );
    let tabs = [
        ("s", "shop", session.page == Page::Shop),
        ("a", "account", session.page == Page::Account),
        ("c", "cart", session.page.is_checkout()),
    ];

    let mut right = Vec::new();
    for (index, (key, label, active)) in tabs.into_iter().enumerate() {
        if index > 0 {
            right.push(Span::raw("  "));
        }
        right.push(Span::styled(key, theme.bold()));
        let label = match (key, small) {
            ("c", true) => format!(" {cart_label}"),
            ("c", false) => format!(" {label} {cart_label}"),
            (_, true) => String::new(),
            (_, false) => format!(" {label}"),
        };
        let style = if active { theme.accent() } else { theme.muted() };
        right.push(Span::styled(label, style));
    }
    let left = vec![Span::styled(session.services.shop_name.to_string(), theme.selected())];
    vec![spread(left, right, width), Line::default()]
}

fn breadcrumbs(session: &Session) -> Vec<Line<'static>> {
    let selected = match session.page {
        Page::Cart | Page::Subscribe => 0,
        Page::Shipping => 1,
        Page::Payment => 2,
        Page::Confirm => 3,
        _ => return Vec::new(),
    };
    let first = if session.is_subscribing() {
        "subscribe"
    } else {
        "cart"
    };
    let labels = if session.layout.breakpoint.is_split() {
        [first, "shipping", "payment", "confirmation"]
    } else {
        [first, "ship", "pay", "confirm"]
    };
    let theme = &session.theme;
    let mut spans = vec![Span::raw(" ")];
    for (index, label) in labels.into_iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled("/", theme.base()));
        }
        let style = if index == selected {
            theme.accent()
        } else {
            theme.base()
        };
        spans.push(Span::styled(label, style));
    }
    vec![Line::from(spans), Line::default()]
}

fn footer(session: &Session, width: u16) -> Vec<Line<'static>> {
    let theme = &session.theme;
    let mut lines = vec![Line::default()];
    match &session.error {
        Some(message) => lines.extend(error_banner(message, width, theme)),
        None => lines.push(centered(Line::styled(TAGLINE, theme.muted()), width)),
    }

    if session.layout.breakpoint == Breakpoint::Small && session.has_menu {
        lines.push(centered(key_hints(&[("m", "menu")], theme), width));
        return lines;
    }
    let mut spans = Vec::new();
    if session.page == Page::Shop {
        let indicator = match session.region {
            Region::Na => "🇺🇸 (US)",
            Region::Eu => "🇪🇺 (EU)",
        };
        spans.push(Span::styled("r", theme.bold()));
        spans.push(Span::styled(format!(" {indicator}"), theme.muted()));
        spans.push(Span::raw("    "));
    }
    spans.extend(key_hints(&hints(session), theme).spans);
    lines.push(centered(Line::from(spans), width));
    lines
}

/// Wrapped message on an error background with the dismiss key on the right.
fn error_banner(message: &str, width: u16, theme: &Theme) -> Vec<Line<'static>> {
    let hint_width = ERROR_HINT.len() + 2;
    let text_width = usize::from(width).saturating_sub(hint_width + 2).max(1);
    let style = theme.error();
    word_wrap(message, text_width)
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let hint = if index == 0 { ERROR_HINT } else { "" };
            banner_line(text, hint, width, style)
        })
        .collect()
}

fn banner_line(text: String, hint: &str, width: u16, style: Style) -> Line<'static> {
    let text = format!(" {text}");
    let hint = format!("{hint:>3} ");
    let used = crate::text::display_width(&text) + hint.len();
    let gap = usize::from(width).saturating_sub(used);
    Line::from(vec![
        Span::styled(text, style),
        Span::styled(" ".repeat(gap), style),
        Span::styled(hint, style.add_modifier(ratatui::style::Modifier::BOLD)),
    ])
}

fn hints(session: &Session) -> Vec<(&'static str, &'static str)> {
    let state = &session.state;
    match session.page {
        Page::Splash => Vec::new(),
        Page::Shop => vec![("+/-", "qty"), ("c", "cart"), ("q", "quit")],
        Page::Cart => vec![("esc", "back"), ("+/-", "qty"), ("enter", "checkout")],
        Page::Subscribe => vec![("esc", "back"), ("↑/↓", "variants"), ("enter", "next")],
        Page::Shipping => match state.shipping.view {
            ShippingView::List => vec![
                ("esc", "back"),
                ("↑/↓", "addresses"),
                ("x/del", "remove"),
                ("enter", "select"),
            ],
            ShippingView::Form => vec![("esc", "back"), ("tab", "next"), ("enter", "submit")],
        },
        Page::Payment => match state.payment.view {
            PaymentView::List => vec![
                ("esc", "back"),
                ("↑/↓", "cards"),
                ("x/del", "remove"),
                ("enter", "select"),
            ],
            PaymentView::Form => vec![("esc", "back"), ("tab", "next"), ("enter", "submit")],
            PaymentView::Link => vec![("esc", "back")],
        },
        Page::Confirm => vec![("esc", "back"), ("enter", "next")],
        Page::FinalSubscribe if state.final_subscribe.completed => vec![("enter", "continue")],
        Page::FinalSubscribe => vec![("+/-", "schedule"), ("enter", "subscribe"), ("esc", "skip")],
        Page::Final => vec![("enter", "continue")],
        Page::Menu => vec![("↑/↓", "navigate"), ("enter", "select"), ("esc", "back")],
        Page::Account if !state.account.focused => vec![("↑/↓", "navigate"), ("enter", "select")],
        Page::Account => match state.account.section() {
            AccountSection::Orders if state.orders.viewing.is_some() => {
                vec![("esc", "back to orders")]
            }
            AccountSection::Orders => {
                vec![("↑/↓", "navigate"), ("enter", "view details"), ("esc", "back")]
            }
            AccountSection::Apps if state.apps.editing => {
                vec![("esc", "back"), ("tab", "next"), ("enter", "submit")]
            }
            AccountSection::Faq | AccountSection::About => vec![("↑/↓", "scroll"), ("esc", "back")],
            _ => vec![("↑/↓", "navigate"), ("x/del", "remove"), ("esc", "back")],
        },
    }
}
