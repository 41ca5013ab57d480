//! Export panel: target id entry, download/generate actions, export log.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let export = &app.export;
    let mut lines: Vec<Line> = Vec::new();

    let latest = match app.dashboard.latest_for_export() {
        Some(id) => Span::styled(id.to_string(), theme::accent()),
        None => Span::styled("unknown", theme::warning()),
    };
    lines.push(Line::from(vec![
        Span::styled("Latest event: ", theme::muted()),
        latest,
        Span::styled("   Download mode: ", theme::muted()),
        Span::styled(
            if export.use_browser {
                "browser".to_string()
            } else {
                format!("save to {}", app.config.report_dir.display())
            },
            theme::neutral(),
        ),
    ]));
    lines.push(Line::from(""));

    lines.push(Line::from(vec![
        Span::styled("Target event id: ", theme::muted()),
        Span::styled("> ", theme::accent()),
        Span::styled(export.input.as_str(), theme::accent_bold()),
        Span::styled("_", theme::accent()),
    ]));
    lines.push(Line::from(Span::styled(
        "  [0-9]type [Backspace]delete [Esc]clear [d]ownload reports [g]enerate reports [b]rowser toggle",
        theme::muted(),
    )));
    if export.in_progress {
        lines.push(Line::from(Span::styled("  Export running...", theme::warning())));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Export log", theme::accent_bold())));
    if export.log.is_empty() {
        lines.push(Line::from(Span::styled("  Nothing exported yet.", theme::muted())));
    }
    let room = area.height.saturating_sub(lines.len() as u16) as usize;
    for entry in export.log.iter().take(room) {
        let style = if entry.ok {
            theme::positive()
        } else {
            theme::negative()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", entry.timestamp.format("%H:%M:%S")), theme::muted()),
            Span::styled(entry.text.as_str(), style),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}
