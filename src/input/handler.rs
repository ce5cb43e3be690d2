use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::keybindings::{Action, KeyBindings};
use crate::app::state::{AppState, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Quit,
    Action(Action),
    Char(char),
    Backspace,
}

pub fn handle_input(event: Event, state: &AppState, bindings: &KeyBindings) -> InputResult {
    match event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
            handle_key(key_event, state, bindings)
        }
        _ => InputResult::Continue,
    }
}

fn handle_key(key: KeyEvent, state: &AppState, bindings: &KeyBindings) -> InputResult {
    if is_ctrl_c(&key) {
        return InputResult::Quit;
    }

    // Any key closes the help overlay
    if state.show_help {
        return InputResult::Action(Action::Back);
    }

    // Confirmation prompt swallows everything else
    if state.pending.is_some() {
        return handle_confirm_input(key);
    }

    match state.mode {
        Mode::Search { .. } => handle_search_input(key),
        Mode::Reader if state.reader.preview.is_some() => handle_preview_input(key, bindings),
        Mode::Reader if state.reader.attachments.is_some() => handle_attachments_input(key),
        Mode::Reader => handle_reader_input(key, bindings),
        Mode::Inbox => match bindings.get(&key) {
            Some(Action::Quit) => InputResult::Quit,
            Some(action) => InputResult::Action(action),
            None => InputResult::Continue,
        },
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn handle_confirm_input(key: KeyEvent) -> InputResult {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            InputResult::Action(Action::Confirm)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            InputResult::Action(Action::Cancel)
        }
        _ => InputResult::Continue,
    }
}

fn handle_search_input(key: KeyEvent) -> InputResult {
    match key.code {
        KeyCode::Enter => InputResult::Action(Action::Confirm),
        KeyCode::Esc => InputResult::Action(Action::Cancel),
        KeyCode::Backspace => InputResult::Backspace,
        KeyCode::Char(c) => InputResult::Char(c),
        _ => InputResult::Continue,
    }
}

fn handle_reader_input(key: KeyEvent, bindings: &KeyBindings) -> InputResult {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => return InputResult::Action(Action::ToggleExpand),
        KeyCode::Char('a') => return InputResult::Action(Action::Attachments),
        _ => {}
    }
    // In reader: q and Esc return to the list instead of quitting
    match bindings.get(&key) {
        Some(Action::Quit) | Some(Action::Back) => InputResult::Action(Action::Back),
        Some(
            action @ (Action::Up
            | Action::Down
            | Action::PageUp
            | Action::PageDown
            | Action::Top
            | Action::Bottom
            | Action::ToggleRead
            | Action::Help),
        ) => InputResult::Action(action),
        _ => InputResult::Continue,
    }
}

fn handle_attachments_input(key: KeyEvent) -> InputResult {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => InputResult::Action(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => InputResult::Action(Action::Up),
        KeyCode::Enter | KeyCode::Char('d') => InputResult::Action(Action::Download),
        KeyCode::Char('v') => InputResult::Action(Action::Preview),
        KeyCode::Esc | KeyCode::Char('a') | KeyCode::Char('q') => InputResult::Action(Action::Back),
        _ => InputResult::Continue,
    }
}

fn handle_preview_input(key: KeyEvent, bindings: &KeyBindings) -> InputResult {
    match bindings.get(&key) {
        Some(Action::Quit) | Some(Action::Back) => InputResult::Action(Action::Back),
        Some(
            action @ (Action::Up | Action::Down | Action::PageUp | Action::PageDown | Action::Top),
        ) => InputResult::Action(action),
        _ => InputResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::reader::{AttachmentPreview, AttachmentsModal};
    use crate::app::store::tests::loaded;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn state() -> AppState {
        let mut state = AppState::new(vec!["Personal".to_string()], 0);
        state.store.replace_threads(vec![loaded("a", 1)]);
        state
    }

    #[test]
    fn test_q_quits_from_inbox_but_not_reader() {
        let bindings = KeyBindings::new();
        let mut state = state();
        assert_eq!(
            handle_input(press(KeyCode::Char('q')), &state, &bindings),
            InputResult::Quit
        );

        state.mode = Mode::Reader;
        assert_eq!(
            handle_input(press(KeyCode::Char('q')), &state, &bindings),
            InputResult::Action(Action::Back)
        );
    }

    #[test]
    fn test_search_mode_captures_text() {
        let bindings = KeyBindings::new();
        let mut state = state();
        state.mode = Mode::Search {
            input: String::new(),
            previous: String::new(),
        };

        assert_eq!(
            handle_input(press(KeyCode::Char('q')), &state, &bindings),
            InputResult::Char('q')
        );
        assert_eq!(
            handle_input(press(KeyCode::Backspace), &state, &bindings),
            InputResult::Backspace
        );
        assert_eq!(
            handle_input(press(KeyCode::Esc), &state, &bindings),
            InputResult::Action(Action::Cancel)
        );
    }

    #[test]
    fn test_pending_prompt_maps_yes_no() {
        let bindings = KeyBindings::new();
        let mut state = state();
        state.stage(crate::app::undo::DestructiveAction::Trash);

        assert_eq!(
            handle_input(press(KeyCode::Char('y')), &state, &bindings),
            InputResult::Action(Action::Confirm)
        );
        assert_eq!(
            handle_input(press(KeyCode::Char('n')), &state, &bindings),
            InputResult::Action(Action::Cancel)
        );
        assert_eq!(
            handle_input(press(KeyCode::Char('j')), &state, &bindings),
            InputResult::Continue
        );
    }

    #[test]
    fn test_reader_keys_switch_with_overlays() {
        let bindings = KeyBindings::new();
        let mut state = state();
        state.mode = Mode::Reader;

        assert_eq!(
            handle_input(press(KeyCode::Enter), &state, &bindings),
            InputResult::Action(Action::ToggleExpand)
        );
        assert_eq!(
            handle_input(press(KeyCode::Char('a')), &state, &bindings),
            InputResult::Action(Action::Attachments)
        );
        // Trash is an inbox-only key
        assert_eq!(
            handle_input(press(KeyCode::Char('d')), &state, &bindings),
            InputResult::Continue
        );

        state.reader.attachments = Some(AttachmentsModal::default());
        assert_eq!(
            handle_input(press(KeyCode::Char('d')), &state, &bindings),
            InputResult::Action(Action::Download)
        );
        assert_eq!(
            handle_input(press(KeyCode::Char('v')), &state, &bindings),
            InputResult::Action(Action::Preview)
        );
        assert_eq!(
            handle_input(press(KeyCode::Char('a')), &state, &bindings),
            InputResult::Action(Action::Back)
        );

        state.reader.preview = Some(AttachmentPreview::default());
        assert_eq!(
            handle_input(press(KeyCode::Char('v')), &state, &bindings),
            InputResult::Continue
        );
        assert_eq!(
            handle_input(press(KeyCode::Char('j')), &state, &bindings),
            InputResult::Action(Action::Down)
        );
    }

    #[test]
    fn test_any_key_closes_help() {
        let bindings = KeyBindings::new();
        let mut state = state();
        assert_eq!(
            handle_input(press(KeyCode::Char('?')), &state, &bindings),
            InputResult::Action(Action::Help)
        );

        state.show_help = true;
        assert_eq!(
            handle_input(press(KeyCode::Char('q')), &state, &bindings),
            InputResult::Action(Action::Back)
        );
        assert_eq!(
            handle_input(press(KeyCode::Char('z')), &state, &bindings),
            InputResult::Action(Action::Back)
        );
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let bindings = KeyBindings::new();
        let mut state = state();
        state.mode = Mode::Search {
            input: String::new(),
            previous: String::new(),
        };
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(handle_input(ctrl_c, &state, &bindings), InputResult::Quit);
    }
}
