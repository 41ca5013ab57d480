//! Keyboard input dispatch: overlays → global keys → panel-specific handlers.
//!
//! On the Export panel digits type into the target id, so panel switching
//! there is Tab/BackTab only.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Overlay, Panel};

const PAGE: isize = 10;

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay.clone() {
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::ConfirmDownload(target) => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => app.confirm_download(target),
                KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => {
                    app.decline_download(target)
                }
                _ => {}
            }
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('e') => {
            app.overlay = Overlay::ErrorHistory;
            app.error_scroll = 0;
            return;
        }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel = app.active_panel.prev();
            } else {
                app.active_panel = app.active_panel.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        KeyCode::Char(c @ '1'..='6') if app.active_panel != Panel::Export => {
            if let Some(panel) = c.to_digit(10).and_then(|d| Panel::from_index(d as usize - 1)) {
                app.active_panel = panel;
            }
            return;
        }
        _ => {}
    }

    // 3. Panel-specific keys.
    match app.active_panel {
        Panel::Export => handle_export_key(app, key),
        _ => handle_table_key(app, key),
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_table_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_by(-1),
        KeyCode::PageDown => app.scroll_by(PAGE),
        KeyCode::PageUp => app.scroll_by(-PAGE),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to(true),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to(false),
        _ => {}
    }
}

fn handle_export_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if c.is_ascii_digit() => app.export.push_digit(c),
        KeyCode::Backspace => {
            app.export.input.pop();
        }
        KeyCode::Esc => app.export.input.clear(),
        KeyCode::Char('d') | KeyCode::Enter => app.submit_download(),
        KeyCode::Char('g') => app.submit_generate(),
        KeyCode::Char('b') => {
            app.export.use_browser = !app.export.use_browser;
            let mode = if app.export.use_browser {
                "Downloads open in the browser"
            } else {
                "Downloads save to the report directory"
            };
            app.set_status(mode);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_app;
    use crate::worker::WorkerCommand;
    use chrono::Local;
    use crossterm::event::KeyEventState;
    use deskview_core::EventId;
    use deskview_runner::{PollUpdate, Snapshot, ViewId};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_str(app: &mut AppState, s: &str) {
        for c in s.chars() {
            handle_key(app, press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn number_keys_switch_panels() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('3')));
        assert_eq!(app.active_panel, Panel::Bonds);
        handle_key(&mut app, press(KeyCode::Char('6')));
        assert_eq!(app.active_panel, Panel::Export);
    }

    #[test]
    fn digits_on_export_panel_edit_input() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.active_panel = Panel::Export;
        type_str(&mut app, "12");
        assert_eq!(app.active_panel, Panel::Export);
        assert_eq!(app.export.input, "12");
        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.export.input, "1");
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.active_panel, Panel::Cash);
    }

    #[test]
    fn confirm_overlay_flow() {
        let (mut app, cmd_rx, _resp_tx) = test_app();
        app.apply_poll(PollUpdate {
            view: ViewId::Exporter,
            seq: 0,
            received_at: Local::now(),
            result: Ok(Snapshot::LatestEvent(EventId(10))),
        });
        app.active_panel = Panel::Export;
        type_str(&mut app, "5d");
        assert_eq!(app.overlay, Overlay::ConfirmDownload(EventId(5)));

        // q inside the overlay declines instead of quitting.
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(app.running);
        assert_eq!(app.overlay, Overlay::None);
        assert!(cmd_rx.try_recv().is_err());

        type_str(&mut app, "d");
        handle_key(&mut app, press(KeyCode::Char('y')));
        assert_eq!(
            cmd_rx.try_recv().unwrap(),
            WorkerCommand::Download {
                target: EventId(5),
                browser: false
            }
        );
    }

    #[test]
    fn browser_toggle() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        app.active_panel = Panel::Export;
        type_str(&mut app, "b");
        assert!(app.export.use_browser);
    }

    #[test]
    fn error_overlay_opens_and_closes() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('e')));
        assert_eq!(app.overlay, Overlay::ErrorHistory);
        handle_key(&mut app, press(KeyCode::Esc));
        assert_eq!(app.overlay, Overlay::None);
    }

    #[test]
    fn q_quits() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn table_scroll_is_clamped() {
        let (mut app, _cmd_rx, _resp_tx) = test_app();
        handle_key(&mut app, press(KeyCode::Char('j')));
        assert_eq!(app.scroll[0], 0);
        handle_key(&mut app, press(KeyCode::Char('k')));
        assert_eq!(app.scroll[0], 0);
    }
}
