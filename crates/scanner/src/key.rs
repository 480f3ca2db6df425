//! Key events as delivered by the host window.

use chrono::{DateTime, Utc};

/// A key as reported by the host (`KeyboardEvent.key` naming).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A single printable character, including the space bar.
    Char(char),
    /// Carriage return; scanners send it after each label field.
    Enter,
    ArrowUp,
    ArrowDown,
    /// Any other named key (`Shift`, `Tab`, `F1`, ...).
    Named(String),
}

impl Key {
    /// Map a host key name to a [`Key`].
    pub fn from_host(name: &str) -> Self {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::Char(c),
            _ => match name {
                "Enter" => Key::Enter,
                "ArrowUp" => Key::ArrowUp,
                "ArrowDown" => Key::ArrowDown,
                other => Key::Named(other.to_string()),
            },
        }
    }

    /// Keys whose default host handling (scrolling, form submit) must be
    /// suppressed while a scan screen is active.
    pub fn suppresses_default(&self) -> bool {
        matches!(self, Key::Char(' ') | Key::Enter | Key::ArrowUp | Key::ArrowDown)
    }
}

/// Where the host delivered the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrigin {
    /// The page itself (no editable element focused).
    #[default]
    Document,
    /// A text input or text area; the operator is typing, not scanning.
    TextEntry,
}

/// Raw event handed to [`crate::ScanSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostKeyEvent {
    pub key: Key,
    pub origin: KeyOrigin,
}

impl HostKeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            origin: KeyOrigin::Document,
        }
    }

    pub fn in_text_entry(key: Key) -> Self {
        Self {
            key,
            origin: KeyOrigin::TextEntry,
        }
    }
}

/// Timestamped key fed to [`crate::ScanDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub at: DateTime<Utc>,
}

impl KeyEvent {
    pub fn new(key: Key, at: DateTime<Utc>) -> Self {
        Self { key, at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_names_map_to_keys() {
        assert_eq!(Key::from_host("a"), Key::Char('a'));
        assert_eq!(Key::from_host(" "), Key::Char(' '));
        assert_eq!(Key::from_host("é"), Key::Char('é'));
        assert_eq!(Key::from_host("Enter"), Key::Enter);
        assert_eq!(Key::from_host("Shift"), Key::Named("Shift".to_string()));
    }

    #[test]
    fn navigation_keys_are_suppressed() {
        assert!(Key::Char(' ').suppresses_default());
        assert!(Key::ArrowDown.suppresses_default());
        assert!(Key::Enter.suppresses_default());
        assert!(!Key::Char('a').suppresses_default());
        assert!(!Key::Named("Tab".to_string()).suppresses_default());
    }
}
