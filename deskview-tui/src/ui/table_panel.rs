//! Panels 1–5: one polled snapshot rendered as a table.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use deskview_core::format::column_widths;
use deskview_runner::ViewId;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState, view: ViewId) {
    let Some(table) = app.dashboard.table(view) else {
        return;
    };
    let (rows, updated_at) = app.dashboard.freshness(view);
    let mut lines: Vec<Line> = Vec::new();

    // Summary line
    let mut summary = vec![
        Span::styled(format!("{rows} rows"), theme::accent()),
        Span::styled(
            match updated_at {
                Some(t) => format!("  updated {}", t.format("%H:%M:%S")),
                None => "  waiting for first refresh".to_string(),
            },
            theme::muted(),
        ),
    ];
    if let Some(err) = app.dashboard.last_error(view) {
        summary.push(Span::styled(format!("  stale: {err}"), theme::warning()));
    }
    summary.push(Span::styled("  [j/k]scroll [g/G]top/bottom", theme::muted()));
    lines.push(Line::from(summary));
    lines.push(Line::from(""));

    if table.rows.is_empty() {
        lines.push(Line::from(Span::styled("No records.", theme::muted())));
        f.render_widget(Paragraph::new(lines), area);
        return;
    }

    let widths = column_widths(table.headers, &table.rows);
    let is_money = |col: usize| table.money_columns.contains(&col);

    // Column headers
    let header_spans: Vec<Span> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| Span::styled(pad(h, widths[i], is_money(i)), theme::accent_bold()))
        .collect();
    lines.push(Line::from(header_spans));

    // Visible rows
    let visible_height = area.height.saturating_sub(3) as usize;
    let start = app.scroll[view_index(view)].min(table.rows.len().saturating_sub(1));
    let end = (start + visible_height).min(table.rows.len());

    for row in &table.rows[start..end] {
        let spans: Vec<Span> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let style = if is_money(i) {
                    theme::money_cell(cell)
                } else {
                    theme::text()
                };
                Span::styled(pad(cell, widths[i], is_money(i)), style)
            })
            .collect();
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn view_index(view: ViewId) -> usize {
    ViewId::TABLES.iter().position(|v| *v == view).unwrap_or(0)
}

/// Money right-aligned, everything else left-aligned, two spaces between columns.
fn pad(cell: &str, width: usize, right: bool) -> String {
    if right {
        format!("{cell:>width$}  ")
    } else {
        format!("{cell:<width$}  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_aligns() {
        assert_eq!(pad("1.00", 6, true), "  1.00  ");
        assert_eq!(pad("DK", 4, false), "DK    ");
    }

    #[test]
    fn table_views_map_to_scroll_slots() {
        assert_eq!(view_index(ViewId::Cash), 0);
        assert_eq!(view_index(ViewId::Exclusions), 4);
    }
}
