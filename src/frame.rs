//! Commands understood by the lamp and their fixed binary frames.
//!
//! Every frame starts with a one-byte tag followed by the command's
//! parameters, each a single unsigned byte:
//!
//! | Command | Bytes                  |
//! |---------|------------------------|
//! | Color   | `[0x00, r, g, b]`      |
//! | Level   | `[0x01, level]`        |

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Tag byte of the color command.
pub const COLOR_TAG: u8 = 0x00;
/// Tag byte of the level (brightness) command.
pub const LEVEL_TAG: u8 = 0x01;

pub const COLOR_FRAME_LEN: usize = 4;
pub const LEVEL_FRAME_LEN: usize = 2;

const MAX_FRAME_LEN: usize = COLOR_FRAME_LEN;

/// A 24-bit color.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.r, self.g, self.b)
    }
}

/// Parses `R,G,B` (decimal) or `#RRGGBB` / `RRGGBB` (hex).
impl FromStr for Rgb {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            return match parts.as_slice() {
                [r, g, b] => Ok(Rgb::new(component(r)?, component(g)?, component(b)?)),
                _ => Err(ParseError::ComponentCount(parts.len())),
            };
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidHex(s.to_string()));
        }
        // All six characters are ASCII hex digits, so slicing and parsing cannot fail.
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or_default();
        Ok(Rgb::new(channel(0), channel(2), channel(4)))
    }
}

fn component(text: &str) -> Result<u8, ParseError> {
    text.parse::<u8>().map_err(|source| ParseError::InvalidComponent {
        text: text.to_string(),
        source,
    })
}

/// Parses a brightness level in 0..=255.
pub fn parse_level(text: &str) -> Result<u8, ParseError> {
    let text = text.trim();
    text.parse::<u8>().map_err(|source| ParseError::InvalidLevel {
        text: text.to_string(),
        source,
    })
}

/// A command for the lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Color(Rgb),
    Level(u8),
}

impl Command {
    /// Packs the command into its wire frame.
    pub fn frame(&self) -> Frame {
        let mut bytes = [0u8; MAX_FRAME_LEN];
        let len = match *self {
            Command::Color(Rgb { r, g, b }) => {
                bytes = [COLOR_TAG, r, g, b];
                COLOR_FRAME_LEN
            }
            Command::Level(level) => {
                bytes[0] = LEVEL_TAG;
                bytes[1] = level;
                LEVEL_FRAME_LEN
            }
        };
        Frame { bytes, len }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Color(rgb) => write!(f, "Setting color to {rgb}"),
            Command::Level(level) => write!(f, "Setting level: {level}"),
        }
    }
}

/// The encoded bytes of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; MAX_FRAME_LEN],
    len: usize,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Lowercase hex, one byte per group: `00 ff 50 14`.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
