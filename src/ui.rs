//! Interactive selection of a corrected command.
//!
//! Renders the current candidate on stderr and maps keystrokes to
//! navigation until the user selects or aborts. stdout stays untouched so
//! the calling shell alias only ever sees the chosen script.

use crate::config::Settings;
use crate::errors::HeckError;
use crate::keys::{Key, KeySource, TerminalKeys};
use crate::selector::CommandSelector;
use crate::types::CorrectedCommand;
use anyhow::Result;
use crossterm::style::{style, Color, Stylize};
use std::io::{self, Write};
use tracing::info;

/// Alias the shell function is installed under when `TF_ALIAS` is unset.
pub const DEFAULT_ALIAS: &str = "heck";

/// Clears the current line and returns the cursor to column 0.
const CLEAR_LINE: &str = "\x1b[1K\r";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Select,
    Abort,
    Previous,
    Next,
}

impl Action {
    /// `None` for keys the loop ignores.
    ///
    /// Vertical movement is bound to arrows, j/k (qwerty) and n/e (colemak).
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Up | Key::Ctrl('n') | Key::Char('k') | Key::Char('e') => Some(Action::Previous),
            Key::Down | Key::Ctrl('p') | Key::Char('j') | Key::Char('n') => Some(Action::Next),
            Key::Ctrl('c') | Key::Char('q') => Some(Action::Abort),
            Key::Enter => Some(Action::Select),
            _ => None,
        }
    }
}

/// Outcome of one interactive selection.
#[derive(Debug, PartialEq)]
pub enum Selection {
    Selected(CorrectedCommand),
    Aborted,
    NoRuleMatched,
}

/// Rendering preferences for the selection prompt.
#[derive(Debug, Clone)]
pub struct Ui {
    no_colors: bool,
    alias: String,
}

impl Ui {
    /// Takes the alias from `TF_ALIAS`, falling back to [`DEFAULT_ALIAS`].
    pub fn new(no_colors: bool) -> Self {
        let alias = std::env::var("TF_ALIAS").unwrap_or_else(|_| DEFAULT_ALIAS.to_string());
        Self { no_colors, alias }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    fn bold(&self, text: &str) -> String {
        if self.no_colors {
            text.to_string()
        } else {
            style(text).bold().to_string()
        }
    }

    fn colored(&self, text: &str, color: Color) -> String {
        if self.no_colors {
            text.to_string()
        } else {
            style(text).with(color).to_string()
        }
    }

    fn side_effect_note(command: &CorrectedCommand) -> &'static str {
        if command.side_effect.is_some() {
            " (+side effect)"
        } else {
            ""
        }
    }

    pub fn failed<W: Write>(&self, message: &str, output: &mut W) -> Result<()> {
        writeln!(output, "{}", self.colored(message, Color::Red))?;
        output.flush()?;
        Ok(())
    }

    pub fn show_corrected_command<W: Write>(&self, command: &CorrectedCommand, output: &mut W) -> Result<()> {
        writeln!(
            output,
            "{}{}",
            self.bold(&command.script),
            Self::side_effect_note(command)
        )?;
        output.flush()?;
        Ok(())
    }

    pub fn confirm_text<W: Write>(&self, command: &CorrectedCommand, output: &mut W) -> Result<()> {
        write!(
            output,
            "{}{}{} [{}/{}/{}/{}]",
            CLEAR_LINE,
            self.bold(&command.script),
            Self::side_effect_note(command),
            self.colored("enter", Color::Green),
            self.colored("↑", Color::Blue),
            self.colored("↓", Color::Blue),
            self.colored("ctrl+c", Color::Red),
        )?;
        output.flush()?;
        Ok(())
    }

    fn nothing_found_message(&self) -> &'static str {
        if self.alias == DEFAULT_ALIAS {
            "No hecks given"
        } else {
            "Nothing found"
        }
    }
}

// =========================================================================
// Core loop with I/O injection (testable)
// =========================================================================

/// Lets the user pick one of `candidates`.
///
/// Returns the first candidate without reading any key when confirmation
/// is disabled.
pub fn select_command_with_io<I, K, W>(
    candidates: I,
    settings: &Settings,
    ui: &Ui,
    keys: &mut K,
    output: &mut W,
) -> Result<Selection>
where
    I: Iterator<Item = CorrectedCommand>,
    K: KeySource,
    W: Write,
{
    let mut selector = match CommandSelector::new(candidates) {
        Ok(selector) => selector,
        Err(HeckError::NoRuleMatched) => {
            ui.failed(ui.nothing_found_message(), output)?;
            return Ok(Selection::NoRuleMatched);
        }
        Err(e) => return Err(e.into()),
    };

    if !settings.require_confirmation {
        ui.show_corrected_command(selector.value(), output)?;
        return Ok(Selection::Selected(selector.into_value()));
    }

    ui.confirm_text(selector.value(), output)?;

    loop {
        let Some(action) = Action::from_key(keys.read_key()?) else {
            continue;
        };

        match action {
            Action::Select => {
                keys.release();
                writeln!(output)?;
                output.flush()?;
                info!("Selected: {}", selector.value().script);
                return Ok(Selection::Selected(selector.into_value()));
            }
            Action::Abort => {
                keys.release();
                ui.failed("\nAborted", output)?;
                return Ok(Selection::Aborted);
            }
            Action::Previous => {
                selector.previous();
                ui.confirm_text(selector.value(), output)?;
            }
            Action::Next => {
                selector.next();
                ui.confirm_text(selector.value(), output)?;
            }
        }
    }
}

// =========================================================================
// Convenience wrapper using the terminal
// =========================================================================

/// Runs the selection against the real terminal, rendering on stderr.
///
/// Raw mode is only entered once a key is actually read. It is left before
/// the final newline is written, so the cursor returns to column 0.
pub fn select_command<I>(candidates: I, settings: &Settings) -> Result<Selection>
where
    I: Iterator<Item = CorrectedCommand>,
{
    let ui = Ui::new(settings.no_colors);
    let mut keys = TerminalKeys::new();
    let mut output = io::stderr();
    select_command_with_io(candidates, settings, &ui, &mut keys, &mut output)
}
