//! Bottom status bar: key hints on the left, the latest status message and
//! error count on the right.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, Panel, StatusLevel};
use crate::theme;

const TABLE_HINTS: &str = " 1-6 panels  j/k scroll  e errors  q quit";
const EXPORT_HINTS: &str = " Tab panels  d download  g generate  b browser  e errors  q quit";

fn level_style(level: StatusLevel) -> ratatui::style::Style {
    match level {
        StatusLevel::Info => theme::accent(),
        StatusLevel::Warning => theme::warning(),
        StatusLevel::Error => theme::negative(),
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let [left, right] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(64), Constraint::Min(10)])
        .areas(area);

    let hints = match app.active_panel {
        Panel::Export => EXPORT_HINTS,
        _ => TABLE_HINTS,
    };
    f.render_widget(Paragraph::new(Span::styled(hints, theme::muted())), left);

    let mut spans: Vec<Span> = Vec::new();
    if app.export.in_progress {
        spans.push(Span::styled("exporting... ", theme::warning()));
    }
    if let Some((msg, level)) = &app.status_message {
        spans.push(Span::styled(msg.as_str(), level_style(*level)));
    }
    if !app.error_history.is_empty() {
        spans.push(Span::styled(
            format!("  [{} errors] ", app.error_history.len()),
            theme::negative(),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Right),
        right,
    );
}
