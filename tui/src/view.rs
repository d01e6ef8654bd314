use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Paragraph, Wrap};

use crate::layout::{Breakpoint, Panes};
use crate::page::Page;
use crate::session::Session;
use crate::viewport::ViewportPair;

const UNDERSIZED_MESSAGE: &str = "resize your terminal";
/// Enough rows for the message one word per line.
const UNDERSIZED_ROWS: u16 = 3;

/// Render the session into one frame.
pub fn draw(frame: &mut Frame<'_>, session: &Session) {
    let area = frame.area();
    let layout = session.layout;
    if layout.breakpoint == Breakpoint::Undersized {
        let message = Paragraph::new(UNDERSIZED_MESSAGE)
            .style(session.theme.base())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        let top = area.y + (area.height / 2).saturating_sub(1);
        let rows = Rect::new(area.x, top, area.width, UNDERSIZED_ROWS).intersection(area);
        frame.render_widget(message, rows);
        return;
    }

    let container = centered_rect(area, layout.container_width, layout.container_height);
    if session.page == Page::Splash {
        let lines = session.splash_view(container.width, container.height);
        frame.render_widget(Paragraph::new(Text::from(lines)), container);
        return;
    }

    let chrome = &session.chrome;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(len(chrome.header.len())),
            Constraint::Length(len(chrome.breadcrumbs.len())),
            Constraint::Min(0),
            Constraint::Length(len(chrome.footer.len())),
        ])
        .split(container);
    let inner = |rect: Rect| rect.inner(Margin::new(2, 0));

    frame.render_widget(Paragraph::new(Text::from(chrome.header.clone())), inner(rows[0]));
    frame.render_widget(
        Paragraph::new(Text::from(chrome.breadcrumbs.clone())),
        inner(rows[1]),
    );
    frame.render_widget(Paragraph::new(Text::from(chrome.footer.clone())), inner(rows[3]));

    let body = inner(rows[2]);
    match session.page {
        Page::Shop => {
            if let Some(pair) = &session.state.shop.viewports {
                let panes = session.shop_panes();
                let menu = session.shop_menu_view();
                let detail = session.shop_detail_view(panes.detail.width);
                draw_panes(frame, body, panes, pair, menu, detail);
            }
        }
        Page::Account => {
            if let Some(pair) = &session.state.account.viewports {
                let panes = session.account_panes();
                let menu = session.account_menu_view();
                let detail = session.account_detail_view(panes.detail.width);
                draw_panes(frame, body, panes, pair, menu, detail);
            }
        }
        _ => {
            let lines = session.body_view(layout.content_width);
            let offset = session.state.body.y_offset();
            frame.render_widget(Paragraph::new(Text::from(lines)).scroll((offset, 0)), body);
        }
    }
}

fn draw_panes(
    frame: &mut Frame<'_>,
    area: Rect,
    panes: Panes,
    pair: &ViewportPair,
    menu: Vec<Line<'static>>,
    detail: Vec<Line<'static>>,
) {
    let (direction, menu_size) = if panes.split {
        (Direction::Horizontal, panes.menu.width)
    } else {
        (Direction::Vertical, panes.menu.height)
    };
    let regions = Layout::default()
        .direction(direction)
        .constraints([Constraint::Length(menu_size), Constraint::Min(0)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Text::from(menu)).scroll((pair.menu.y_offset(), 0)),
        regions[0],
    );
    frame.render_widget(
        Paragraph::new(Text::from(detail)).scroll((pair.detail.y_offset(), 0)),
        regions[1],
    );
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn len(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX)
}
