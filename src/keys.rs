//! Terminal key input for the interactive selection loop.
//!
//! Keys are read one at a time in raw mode so a single keystroke acts
//! without waiting for Enter. The [`KeySource`] trait lets the loop be
//! driven by a scripted sequence in tests.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::warn;

/// A single keystroke, reduced to what the selection loop cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Char(char),
    /// A letter pressed together with Ctrl, always lowercase.
    Ctrl(char),
    Other,
}

pub trait KeySource {
    /// Blocks until the next keystroke.
    fn read_key(&mut self) -> Result<Key>;

    /// Gives the terminal back once no more keys will be read.
    fn release(&mut self) {}
}

/// Keeps the terminal in raw mode while alive.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn acquire() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Reads keys from the controlling terminal.
///
/// Raw mode is entered on the first read and left when this value is
/// dropped, so building one never touches the terminal.
#[derive(Default)]
pub struct TerminalKeys {
    guard: Option<RawModeGuard>,
}

impl TerminalKeys {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeySource for TerminalKeys {
    fn read_key(&mut self) -> Result<Key> {
        if self.guard.is_none() {
            self.guard = Some(RawModeGuard::acquire()?);
        }

        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                return Ok(map_key(key.code, key.modifiers));
            }
        }
    }

    fn release(&mut self) {
        self.guard = None;
    }
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Key {
    match code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Enter => Key::Enter,
        KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => match c.to_ascii_lowercase() {
            // Ctrl+J and Ctrl+M are line feed and carriage return
            'j' | 'm' => Key::Enter,
            c => Key::Ctrl(c),
        },
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    }
}
