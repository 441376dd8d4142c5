use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Actions the console reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleAction {
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    Quit,
}

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Pager,
    Tail,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, ConsoleAction>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('q')), ConsoleAction::Quit);
        global.insert(KeyBinding::new(KeyCode::Esc), ConsoleAction::Quit);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), ConsoleAction::Quit);
        bindings.insert(KeyContext::Global, global);

        // Pager bindings - less-like navigation
        let mut pager = HashMap::new();
        pager.insert(KeyBinding::new(KeyCode::Char(' ')), ConsoleAction::NextPage);
        pager.insert(KeyBinding::new(KeyCode::Enter), ConsoleAction::NextPage);
        pager.insert(KeyBinding::new(KeyCode::Char('j')), ConsoleAction::NextPage);
        pager.insert(KeyBinding::new(KeyCode::Down), ConsoleAction::NextPage);
        pager.insert(KeyBinding::new(KeyCode::PageDown), ConsoleAction::NextPage);
        pager.insert(KeyBinding::ctrl(KeyCode::Char('f')), ConsoleAction::NextPage);
        pager.insert(KeyBinding::new(KeyCode::Char('b')), ConsoleAction::PrevPage);
        pager.insert(KeyBinding::new(KeyCode::Char('k')), ConsoleAction::PrevPage);
        pager.insert(KeyBinding::new(KeyCode::Up), ConsoleAction::PrevPage);
        pager.insert(KeyBinding::new(KeyCode::PageUp), ConsoleAction::PrevPage);
        pager.insert(KeyBinding::ctrl(KeyCode::Char('b')), ConsoleAction::PrevPage);
        pager.insert(KeyBinding::new(KeyCode::Char('g')), ConsoleAction::FirstPage);
        pager.insert(KeyBinding::new(KeyCode::Home), ConsoleAction::FirstPage);
        pager.insert(KeyBinding::shift(KeyCode::Char('G')), ConsoleAction::LastPage);
        pager.insert(KeyBinding::new(KeyCode::End), ConsoleAction::LastPage);
        bindings.insert(KeyContext::Pager, pager);

        // Tail mode only stops
        bindings.insert(KeyContext::Tail, HashMap::new());

        Self { bindings }
    }

    /// Get action for a key event in the given context
    pub fn get_action(&self, context: KeyContext, event: &KeyEvent) -> Option<ConsoleAction> {
        let binding = KeyBinding::from_event(event);

        // Check context-specific bindings first
        if let Some(context_bindings) = self.bindings.get(&context) {
            if let Some(action) = context_bindings.get(&binding) {
                return Some(*action);
            }
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)
            .and_then(|b| b.get(&binding))
            .copied()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
