//! Overlay widgets: error history, download confirmation.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use deskview_core::{EventId, ReportKind};

use crate::app::{AppState, ERROR_HISTORY_CAP};
use crate::theme;
use crate::ui::centered_rect;

/// Error history, newest first. `error_scroll` is the first row shown.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let title = format!(
        " Errors: {} of max {ERROR_HISTORY_CAP}  [j/k] scroll  [Esc] close ",
        app.error_history.len()
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(Span::styled(title, theme::negative()));

    if app.error_history.is_empty() {
        let empty = Paragraph::new(Span::styled("Nothing has failed yet.", theme::muted()))
            .block(block);
        f.render_widget(empty, popup);
        return;
    }

    let rows: Vec<Row> = app
        .error_history
        .iter()
        .skip(app.error_scroll)
        .map(|err| {
            let detail = if err.context.is_empty() {
                err.message.clone()
            } else {
                format!("{} ({})", err.message, err.context)
            };
            Row::new(vec![
                Cell::from(err.timestamp.format("%H:%M:%S").to_string()).style(theme::muted()),
                Cell::from(err.category.label()).style(theme::warning()),
                Cell::from(detail).style(theme::text()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Min(20),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Time", "Kind", "Message"])
                .style(theme::accent().add_modifier(Modifier::BOLD)),
        )
        .column_spacing(2)
        .block(block);
    f.render_widget(table, popup);
}

/// Confirmation before five reports are downloaded or opened.
pub fn render_confirm_download(f: &mut Frame, area: Rect, app: &AppState, target: EventId) {
    let popup = centered_rect(60, 50, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::warning())
        .title(" Download Reports [y]es [n]o ")
        .title_style(theme::warning());

    let action = if app.export.use_browser {
        "open in your browser as separate tabs or downloads; allow pop-ups for this site"
    } else {
        "be saved under the report directory"
    };

    let mut text = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Event ", theme::muted()),
            Span::styled(target.to_string(), theme::accent_bold()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} reports will {action}:", ReportKind::ALL.len()),
            theme::text(),
        )),
    ];
    for kind in ReportKind::ALL {
        text.push(Line::from(Span::styled(
            format!("  • {}", kind.default_filename(target)),
            theme::muted(),
        )));
    }
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press y to continue, n to cancel.",
        theme::neutral(),
    )));

    let para = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(para, popup);
}
