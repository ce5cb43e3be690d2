use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Navigation
    Up,
    Down,
    Top,
    Bottom,
    PageUp,
    PageDown,

    // Actions
    Open,
    Back,
    Quit,
    ToggleRead,
    ToggleSelect,
    ClearSelection,
    Archive,
    Trash,
    DeletePermanently,
    Undo,
    Refresh,
    Search,
    Help,

    // Reader
    ToggleExpand,
    Attachments,
    Download,
    Preview,

    // Prompts
    Confirm,
    Cancel,
}

pub struct KeyBindings {
    bindings: HashMap<KeyEvent, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    /// Vim keys and arrow keys side by side
    pub fn new() -> Self {
        let mut map = HashMap::new();

        // Navigation
        map.insert(key('j'), Action::Down);
        map.insert(key('k'), Action::Up);
        map.insert(key_code(KeyCode::Down), Action::Down);
        map.insert(key_code(KeyCode::Up), Action::Up);
        map.insert(key('g'), Action::Top);
        map.insert(shift_key('G'), Action::Bottom);
        map.insert(key_code(KeyCode::Home), Action::Top);
        map.insert(key_code(KeyCode::End), Action::Bottom);
        map.insert(ctrl_key('d'), Action::PageDown);
        map.insert(ctrl_key('u'), Action::PageUp);
        map.insert(key_code(KeyCode::PageDown), Action::PageDown);
        map.insert(key_code(KeyCode::PageUp), Action::PageUp);

        // Actions
        map.insert(key_code(KeyCode::Enter), Action::Open);
        map.insert(key('q'), Action::Quit);
        map.insert(ctrl_key('c'), Action::Quit);
        map.insert(key_code(KeyCode::Esc), Action::Back);
        map.insert(key('m'), Action::ToggleRead);
        map.insert(shift_key('U'), Action::ToggleRead);
        map.insert(key('x'), Action::ToggleSelect);
        map.insert(key(' '), Action::ToggleSelect);
        map.insert(shift_key('X'), Action::ClearSelection);
        map.insert(key('a'), Action::Archive);
        map.insert(key('e'), Action::Archive);
        map.insert(key('d'), Action::Trash);
        map.insert(key('#'), Action::Trash);
        map.insert(shift_key('D'), Action::DeletePermanently);
        map.insert(key('u'), Action::Undo);
        map.insert(key('r'), Action::Refresh);
        map.insert(ctrl_key('r'), Action::Refresh);
        map.insert(key('/'), Action::Search);
        // Terminals disagree on whether '?' carries SHIFT
        map.insert(key('?'), Action::Help);
        map.insert(shift_key('?'), Action::Help);

        Self { bindings: map }
    }

    pub fn get(&self, event: &KeyEvent) -> Option<Action> {
        self.bindings.get(event).copied()
    }
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn shift_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::SHIFT)
}

fn ctrl_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}
