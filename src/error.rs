//! Error types shared by the library modules.

use std::io;
use std::num::ParseIntError;

use thiserror::Error;

/// Errors raised while turning user text into colors, presets or levels.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// A color needs exactly three components.
    #[error("expected 3 color components, got {0}")]
    ComponentCount(usize),
    /// A component is not a number in 0..=255.
    #[error("invalid color component '{text}': {source}")]
    InvalidComponent {
        text: String,
        #[source]
        source: ParseIntError,
    },
    /// A hex color must be exactly six hex digits.
    #[error("invalid hex color '{0}', expected RRGGBB")]
    InvalidHex(String),
    /// The level is not a number in 0..=255.
    #[error("invalid level '{text}': {source}")]
    InvalidLevel {
        text: String,
        #[source]
        source: ParseIntError,
    },
    /// No preset with this name exists.
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

/// Errors raised by the serial link to the lamp.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The device could not be opened.
    #[error("failed to open serial port '{path}'")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },
    /// A read or write on the open port failed.
    #[error("serial I/O error")]
    Io(#[from] io::Error),
    /// The device closed the stream.
    #[error("serial port closed by the device")]
    Disconnected,
}

/// Errors raised while parsing a shell line.
#[derive(Debug, Error, PartialEq)]
pub enum ShellError {
    #[error("unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),
    #[error("'{command}' expects {expected}")]
    Arity {
        command: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}
