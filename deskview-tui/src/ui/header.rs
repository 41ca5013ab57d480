//! Header: latest event id, refresh countdown, base URL.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let header = &app.dashboard.header;
    let latest = match header.latest.data() {
        Some(id) => Span::styled(id.to_string(), theme::accent_bold()),
        None => Span::styled("-", theme::muted()),
    };
    let stale_note = if header.latest.is_stale() {
        Span::styled(" (stale)", theme::warning())
    } else {
        Span::raw("")
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(" DeskView ", theme::accent_bold()),
            Span::styled("| Latest event: ", theme::muted()),
            latest,
            stale_note,
            Span::styled("  | Next refresh in ", theme::muted()),
            Span::styled(format!("{}s", header.countdown.remaining()), theme::neutral()),
            Span::styled(format!("  | {}", app.config.base_url), theme::muted()),
        ]),
        Line::from(Span::styled(
            format!(
                " Data automatically refreshes every {} seconds",
                app.config.refresh_secs()
            ),
            theme::muted(),
        )),
    ];

    f.render_widget(Paragraph::new(lines), area);
}
