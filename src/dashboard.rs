//! State behind the full-screen dashboard, kept free of terminal types.

use std::collections::VecDeque;

use crate::frame::{Command, Rgb};
use crate::preset::{LevelCycle, Preset};

/// Received lines kept for display.
pub const SCROLLBACK: usize = 500;
/// Brightness change per `+`/`-` key press.
pub const LEVEL_STEP: u8 = 10;

/// What a key press asks the dashboard to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    LevelUp,
    LevelDown,
    NextPreset,
    NextCycleLevel,
    Quit,
}

/// A key press, reduced to what the dashboard reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Esc,
    Other,
}

impl Action {
    /// Maps a key press; `ctrl` is whether Control was held.
    pub fn from_key(key: Key, ctrl: bool) -> Option<Self> {
        match key {
            Key::Esc => Some(Action::Quit),
            Key::Char('c') if ctrl => Some(Action::Quit),
            Key::Char(_) if ctrl => None,
            Key::Char('+' | '=') => Some(Action::LevelUp),
            Key::Char('-' | '_') => Some(Action::LevelDown),
            Key::Char('p') => Some(Action::NextPreset),
            Key::Char('c') => Some(Action::NextCycleLevel),
            Key::Char('q') => Some(Action::Quit),
            Key::Char(_) | Key::Other => None,
        }
    }
}

#[derive(Debug)]
pub struct Dashboard {
    pub port: String,
    pub baud_rate: u32,
    lines: VecDeque<String>,
    level: u8,
    color: Rgb,
    preset: Option<usize>,
    cycle: LevelCycle,
    status: String,
    quit: bool,
}

impl Dashboard {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            lines: VecDeque::with_capacity(SCROLLBACK),
            level: u8::MAX,
            color: Rgb::new(255, 255, 255),
            preset: None,
            cycle: LevelCycle::new(),
            status: String::from("ready"),
            quit: false,
        }
    }

    /// Applies a key action and returns the command to send, if any.
    pub fn apply(&mut self, action: Action) -> Option<Command> {
        let command = match action {
            Action::LevelUp => Command::Level(self.level.saturating_add(LEVEL_STEP)),
            Action::LevelDown => Command::Level(self.level.saturating_sub(LEVEL_STEP)),
            Action::NextCycleLevel => Command::Level(self.cycle.next().unwrap_or(u8::MAX)),
            Action::NextPreset => {
                let next = self.preset.map_or(0, |i| (i + 1) % Preset::ALL.len());
                self.preset = Some(next);
                Command::Color(Preset::ALL[next].color())
            }
            Action::Quit => {
                self.quit = true;
                return None;
            }
        };
        self.record_sent(command);
        Some(command)
    }

    /// Tracks what the lamp was last told.
    pub fn record_sent(&mut self, command: Command) {
        match command {
            Command::Color(color) => self.color = color,
            Command::Level(level) => self.level = level,
        }
        self.status = command.to_string();
    }

    pub fn push_line(&mut self, line: String) {
        if self.lines.len() == SCROLLBACK {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.lines.iter().map(String::as_str)
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn preset(&self) -> Option<Preset> {
        self.preset.map(|i| Preset::ALL[i])
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}
