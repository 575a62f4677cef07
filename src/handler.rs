use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Rows moved per mouse wheel notch
const WHEEL_STEP: i32 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => handle_paste(app, &text),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.poll_tasks().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
        InputMode::FilePrompt => handle_file_prompt(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('o') => {
            app.input_mode = InputMode::FilePrompt;
        }
        KeyCode::Char('u') => app.start_upload(),
        KeyCode::Char('x') => app.deselect_file(),
        KeyCode::Char('r') => app.refresh_status(),
        KeyCode::Char('C') => app.clear_chat(),

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_by(-1),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        _ => {}
    }
}

/// Cursor editing shared by the question input and the file prompt
fn edit_line(text: &mut String, cursor: &mut usize, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = text.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = text.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = text.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // Shift+Enter inserts a line break instead of sending
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.insert(byte_pos, '\n');
                app.input_cursor += 1;
            } else {
                app.send_question();
            }
        }
        _ => edit_line(&mut app.input, &mut app.input_cursor, key),
    }
}

fn handle_file_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.file_input.clear();
            app.file_cursor = 0;
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.select_file_from_prompt(),
        _ => edit_line(&mut app.file_input, &mut app.file_cursor, key),
    }
}

fn handle_paste(app: &mut App, text: &str) {
    match app.input_mode {
        InputMode::Editing => insert_text(&mut app.input, &mut app.input_cursor, text),
        InputMode::FilePrompt => {
            // Paths dropped into a terminal often arrive quoted
            let path = text.trim().trim_matches(|c| c == '\'' || c == '"');
            insert_text(&mut app.file_input, &mut app.file_cursor, path);
        }
        InputMode::Normal => {}
    }
}

fn insert_text(target: &mut String, cursor: &mut usize, text: &str) {
    let byte_pos = char_to_byte_index(target, *cursor);
    target.insert_str(byte_pos, text);
    *cursor += text.chars().count();
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_by(WHEEL_STEP),
        MouseEventKind::ScrollUp => app.scroll_by(-WHEEL_STEP),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use docchat_core::testing::{status, ScriptedService};
    use docchat_core::{Config, DocumentService};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, press(KeyCode::Char(c)));
        }
    }

    fn new_app(service: &Arc<ScriptedService>) -> App {
        App::new(
            Arc::clone(service) as Arc<dyn DocumentService>,
            "http://127.0.0.1:3001".to_string(),
            &Config::new(),
        )
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn test_editing_keys() {
        let mut text = String::new();
        let mut cursor = 0;
        for c in "abc".chars() {
            edit_line(&mut text, &mut cursor, press(KeyCode::Char(c)));
        }
        edit_line(&mut text, &mut cursor, press(KeyCode::Left));
        edit_line(&mut text, &mut cursor, press(KeyCode::Backspace));
        assert_eq!(text, "ac");
        assert_eq!(cursor, 1);

        edit_line(&mut text, &mut cursor, press(KeyCode::Home));
        edit_line(&mut text, &mut cursor, press(KeyCode::Delete));
        assert_eq!(text, "c");

        edit_line(&mut text, &mut cursor, press(KeyCode::End));
        edit_line(&mut text, &mut cursor, press(KeyCode::Char('é')));
        assert_eq!(text, "cé");
        assert_eq!(cursor, 2);
    }

    #[tokio::test]
    async fn test_enter_sends_when_ready() {
        let service = Arc::new(ScriptedService::new());
        service.push_status(Ok(status(true)));
        let mut app = new_app(&service);
        app.session.check_status().await;

        handle_key(&mut app, press(KeyCode::Char('i')));
        assert_eq!(app.input_mode, InputMode::Editing);
        type_text(&mut app, "What is the revenue?");
        handle_key(&mut app, press(KeyCode::Enter));

        assert!(app.input.is_empty());
        assert!(app.session.is_asking());
        assert_eq!(app.session.conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_enter_with_blank_input_does_nothing() {
        let service = Arc::new(ScriptedService::new());
        service.push_status(Ok(status(true)));
        let mut app = new_app(&service);
        app.session.check_status().await;
        app.input_mode = InputMode::Editing;

        type_text(&mut app, "   ");
        handle_key(&mut app, press(KeyCode::Enter));

        assert!(!app.session.is_asking());
        assert!(app.session.conversation().is_empty());
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let service = Arc::new(ScriptedService::new());
        let mut app = new_app(&service);
        app.input_mode = InputMode::Editing;

        type_text(&mut app, "ab");
        handle_key(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));

        assert_eq!(app.input, "ab\n");
        assert_eq!(app.input_cursor, 3);
    }

    #[test]
    fn test_file_prompt_flow() {
        let service = Arc::new(ScriptedService::new());
        let mut app = new_app(&service);

        handle_key(&mut app, press(KeyCode::Char('o')));
        assert_eq!(app.input_mode, InputMode::FilePrompt);
        handle_paste(&mut app, "'/tmp/My Report.pdf'\n");
        assert_eq!(app.file_input, "/tmp/My Report.pdf");
        handle_key(&mut app, press(KeyCode::Enter));

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(
            app.session.pending_upload().map(|f| f.file_name.as_str()),
            Some("My Report.pdf")
        );

        handle_key(&mut app, press(KeyCode::Char('x')));
        assert!(app.session.pending_upload().is_none());
    }

    #[test]
    fn test_quit_keys() {
        let service = Arc::new(ScriptedService::new());
        let mut app = new_app(&service);
        app.input_mode = InputMode::Editing;

        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.input, "q");

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}
