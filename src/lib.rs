//! # Lamp Controller Library
//!
//! Host-side control of a serial-attached lamp microcontroller. The lamp
//! accepts two fixed binary commands, a color (`[0x00, r, g, b]`) and a
//! brightness level (`[0x01, level]`), and answers with newline-terminated
//! text lines that are printed as they arrive.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod frame;
pub mod link;
pub mod preset;
pub mod shell;

pub use config::PortConfig;
pub use error::{LinkError, ParseError, ShellError};
pub use frame::{Command, Frame, Rgb};
pub use link::Lamp;
pub use preset::{LevelCycle, Preset};
