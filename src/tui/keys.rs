use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::modal::{BusSignal, Signal};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub description: String,
}

impl KeyBinding {
    pub fn new(key: KeyCode, modifiers: KeyModifiers, description: &str) -> Self {
        Self {
            key,
            modifiers,
            description: description.to_string(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.modifiers == event.modifiers
    }
}

/// What a key press asks the modal layer to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Publish on the global bus (submit/reject the active dialog)
    Bus(BusSignal),
    /// Raise a content signal on the active dialog
    Content(Signal),
}

/// Modal key mappings
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub submit: KeyBinding,
    pub reject: KeyBinding,
    pub next: KeyBinding,
    pub previous: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            submit: KeyBinding::new(KeyCode::Enter, KeyModifiers::NONE, "Submit dialog"),
            reject: KeyBinding::new(KeyCode::Esc, KeyModifiers::NONE, "Reject dialog"),
            next: KeyBinding::new(KeyCode::Tab, KeyModifiers::NONE, "Next step"),
            previous: KeyBinding::new(KeyCode::BackTab, KeyModifiers::SHIFT, "Previous step"),
        }
    }
}

impl KeyMap {
    pub fn action(&self, event: &KeyEvent) -> Option<KeyAction> {
        if self.submit.matches(event) {
            Some(KeyAction::Bus(BusSignal::Submit))
        } else if self.reject.matches(event) {
            Some(KeyAction::Bus(BusSignal::Reject))
        } else if self.next.matches(event) {
            Some(KeyAction::Content(Signal::Next))
        } else if self.previous.matches(event) {
            Some(KeyAction::Content(Signal::Previous))
        } else {
            None
        }
    }

    /// Get help text for all key bindings
    pub fn help_text(&self) -> String {
        [&self.submit, &self.reject, &self.next, &self.previous]
            .iter()
            .map(|binding| binding.description.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse a key name such as `enter`, `esc`, `tab` or `backtab`
pub fn parse_key(name: &str) -> Option<KeyEvent> {
    let (code, modifiers) = match name.trim().to_ascii_lowercase().as_str() {
        "enter" | "return" => (KeyCode::Enter, KeyModifiers::NONE),
        "esc" | "escape" => (KeyCode::Esc, KeyModifiers::NONE),
        "tab" => (KeyCode::Tab, KeyModifiers::NONE),
        "backtab" | "shift+tab" => (KeyCode::BackTab, KeyModifiers::SHIFT),
        _ => return None,
    };
    Some(KeyEvent::new(code, modifiers))
}
