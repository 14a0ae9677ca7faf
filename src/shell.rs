//! Grammar of the interactive shell.
//!
//! One command per line, words separated by whitespace:
//!
//! ```text
//! color 255 80 20      color 255,80,20      color #ff5014
//! preset night         level 220            cycle
//! read                 help                 back | quit | exit
//! ```

use crate::error::ShellError;
use crate::frame::{parse_level, Command, Rgb};
use crate::preset::Preset;

pub const HELP: &str = "\
Commands:
  color R G B | color R,G,B | color #RRGGBB   set the lamp color
  preset NAME                                 set a named color: day, warm-day, afternoon, night
  level N                                     set the brightness, 0-255
  cycle                                       step to the next brightness level
  read                                        print lines the lamp has sent
  help                                        show this list
  back | quit | exit                          leave the shell";

/// A parsed shell line.
#[derive(Debug, PartialEq)]
pub enum Input {
    /// Send a command to the lamp.
    Send(Command),
    /// Send the next level of the brightness cycle.
    Cycle,
    /// Print pending device output.
    Read,
    Help,
    Exit,
}

/// Parses one shell line. Blank lines are `Ok(None)`.
pub fn parse_input(line: &str) -> Result<Option<Input>, ShellError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let input = match verb.to_ascii_lowercase().as_str() {
        "color" => Input::Send(Command::Color(parse_color_args(&args)?)),
        "preset" => match args.as_slice() {
            [name] => Input::Send(Command::Color(name.parse::<Preset>()?.color())),
            _ => {
                return Err(ShellError::Arity {
                    command: "preset",
                    expected: "a preset name",
                })
            }
        },
        "level" => match args.as_slice() {
            [level] => Input::Send(Command::Level(parse_level(level)?)),
            _ => {
                return Err(ShellError::Arity {
                    command: "level",
                    expected: "one value in 0-255",
                })
            }
        },
        "cycle" => no_args("cycle", &args, Input::Cycle)?,
        "read" => no_args("read", &args, Input::Read)?,
        "help" | "?" => Input::Help,
        "back" | "quit" | "exit" => Input::Exit,
        _ => return Err(ShellError::UnknownCommand(verb.to_string())),
    };
    Ok(Some(input))
}

fn parse_color_args(args: &[&str]) -> Result<Rgb, ShellError> {
    match args {
        [single] => Ok(single.parse::<Rgb>()?),
        [r, g, b] => Ok(format!("{r},{g},{b}").parse::<Rgb>()?),
        _ => Err(ShellError::Arity {
            command: "color",
            expected: "R G B, R,G,B or #RRGGBB",
        }),
    }
}

fn no_args(command: &'static str, args: &[&str], input: Input) -> Result<Input, ShellError> {
    if args.is_empty() {
        Ok(input)
    } else {
        Err(ShellError::Arity {
            command,
            expected: "no arguments",
        })
    }
}
