mod tui;

use std::io::{self, BufRead, Read, Write};
use std::process;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::style::{Color, Stylize};
use log::{info, warn};
use serialport::{SerialPort, SerialPortType};

use lamp_ctl::config::{DEFAULT_BAUD_RATE, DEFAULT_PORT};
use lamp_ctl::shell::{self, Input};
use lamp_ctl::{Command, Lamp, LevelCycle, PortConfig, Preset, Rgb};

#[derive(Parser, Debug)]
#[command(version, about = "Send color and brightness commands to a serial lamp", long_about = None)]
struct Cli {
    #[command(flatten)]
    port: PortArgs,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Args, Debug)]
struct PortArgs {
    /// Serial device the lamp is attached to
    #[arg(short, long, env = "LAMP_PORT", default_value = DEFAULT_PORT, global = true)]
    port: String,

    #[arg(short, long, env = "LAMP_BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    baud: u32,

    /// Read timeout in milliseconds
    #[arg(long, env = "LAMP_TIMEOUT_MS", default_value_t = 10, global = true)]
    timeout_ms: u64,

    /// Lock the device against other programs
    #[arg(long, env = "LAMP_EXCLUSIVE", global = true)]
    exclusive: bool,
}

impl PortArgs {
    fn to_config(&self) -> PortConfig {
        PortConfig::new(self.port.as_str(), self.baud)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_exclusive(self.exclusive)
    }
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// List available serial ports
    Ports,
    /// List the named colors
    Presets,
    /// Set the lamp color
    Color {
        /// R G B, R,G,B or #RRGGBB
        #[arg(num_args = 1..=3, required_unless_present = "preset", conflicts_with = "preset")]
        color: Vec<String>,
        /// Use a named color instead
        #[arg(long)]
        preset: Option<Preset>,
        #[command(flatten)]
        after: AfterSend,
    },
    /// Set the lamp brightness
    Level {
        level: u8,
        #[command(flatten)]
        after: AfterSend,
    },
    /// Step through the brightness table
    Cycle {
        /// Pause between levels
        #[arg(long, default_value_t = 2000)]
        delay_ms: u64,
        /// Passes over the table
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        rounds: u16,
        #[command(flatten)]
        after: AfterSend,
    },
    /// Print lines sent by the lamp
    Monitor {
        /// Stop after this many lines
        #[arg(long)]
        lines: Option<usize>,
    },
    /// Type commands interactively
    Shell,
    /// Full-screen dashboard
    Dashboard,
}

#[derive(Args, Debug)]
struct AfterSend {
    /// Exit after sending instead of printing device output
    #[arg(long)]
    no_monitor: bool,
    /// Stop printing device output after this many lines
    #[arg(long)]
    lines: Option<usize>,
    /// Print the frames as hex without opening the port
    #[arg(long)]
    dry_run: bool,
}

// The main entry point for the command-line lamp controller.
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "[ERROR]".red(), e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.port.to_config();
    if !config.is_standard_baud() {
        warn!("{} baud is not a rate the lamp firmware is known to use", config.baud_rate);
    }

    match cli.mode {
        Mode::Ports => list_ports(),
        Mode::Presets => {
            list_presets();
            Ok(())
        }
        Mode::Color { color, preset, after } => {
            let rgb = match preset {
                Some(preset) => preset.color(),
                None => color.join(",").parse::<Rgb>().context("invalid color")?,
            };
            run_send(&config, &[Command::Color(rgb)], Duration::ZERO, &after)
        }
        Mode::Level { level, after } => run_send(&config, &[Command::Level(level)], Duration::ZERO, &after),
        Mode::Cycle {
            delay_ms,
            rounds,
            after,
        } => {
            let commands: Vec<Command> = LevelCycle::rounds(usize::from(rounds)).map(Command::Level).collect();
            run_send(&config, &commands, Duration::from_millis(delay_ms), &after)
        }
        Mode::Monitor { lines } => {
            let mut lamp = open(&config)?;
            monitor(&mut lamp, lines)
        }
        Mode::Shell => run_shell(&config),
        Mode::Dashboard => tui::run(&config),
    }
}

fn open(config: &PortConfig) -> Result<Lamp<Box<dyn SerialPort>>> {
    let lamp = Lamp::open(config)?;
    println!("Connected to {} at {} baud.", config.path, config.baud_rate);
    Ok(lamp)
}

// Sends each command in turn, then follows device output unless told not to.
fn run_send(config: &PortConfig, commands: &[Command], delay: Duration, after: &AfterSend) -> Result<()> {
    if after.dry_run {
        for command in commands {
            print_command(command);
            println!("  [{}]", command.frame());
        }
        return Ok(());
    }

    let mut lamp = open(config)?;
    for (i, command) in commands.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        print_command(command);
        lamp.send(*command).context("failed to write to serial port")?;
        for line in lamp.drain()? {
            print_line(&line);
        }
    }

    if after.no_monitor {
        return Ok(());
    }
    monitor(&mut lamp, after.lines)
}

fn monitor<P: Read + Write>(lamp: &mut Lamp<P>, limit: Option<usize>) -> Result<()> {
    println!("reading responses");
    let seen = lamp.monitor(limit, print_line).context("serial port error")?;
    info!("monitor stopped after {seen} lines");
    Ok(())
}

// Handles the interactive shell.
fn run_shell(config: &PortConfig) -> Result<()> {
    let mut lamp = open(config)?;
    let mut cycle = LevelCycle::new();

    println!("\n--- Shell ---");
    println!("Enter commands, or type 'back' to leave. Type 'help' for a list.");
    prompt()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;

        match shell::parse_input(&line) {
            Ok(Some(Input::Exit)) => break,
            Ok(Some(Input::Help)) => println!("{}", shell::HELP),
            Ok(Some(Input::Send(command))) => {
                print_command(&command);
                lamp.send(command)?;
            }
            Ok(Some(Input::Cycle)) => {
                let command = Command::Level(cycle.next().unwrap_or(u8::MAX));
                print_command(&command);
                lamp.send(command)?;
            }
            // Pending output is printed after every line anyway.
            Ok(Some(Input::Read)) | Ok(None) => (),
            Err(e) => eprintln!("{} {}", "[ERROR]".red(), e),
        }

        for line in lamp.drain()? {
            print_line(&line);
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;
    Ok(())
}

fn list_ports() -> Result<()> {
    let ports = serialport::available_ports().context("could not enumerate serial ports")?;

    if ports.is_empty() {
        eprintln!("{} No serial ports found.", "[WARNING]".yellow());
        return Ok(());
    }

    println!("Available serial ports:");
    for (i, port) in ports.iter().enumerate() {
        match &port.port_type {
            SerialPortType::UsbPort(usb) => {
                let product = usb.product.as_deref().map(|p| format!(", {p}")).unwrap_or_default();
                println!("  {}: {} (USB {:04x}:{:04x}{})", i, port.port_name, usb.vid, usb.pid, product);
            }
            _ => println!("  {}: {}", i, port.port_name),
        }
    }
    Ok(())
}

fn list_presets() {
    println!("Presets:");
    for preset in Preset::ALL {
        let Rgb { r, g, b } = preset.color();
        println!("  {} {:<10} {}, {}, {}", swatch(preset.color()), preset, r, g, b);
    }
}

fn print_command(command: &Command) {
    match command {
        Command::Color(rgb) => println!("{} {}", command, swatch(*rgb)),
        Command::Level(_) => println!("{command}"),
    }
}

fn print_line(line: &str) {
    println!("{line}");
}

fn swatch(Rgb { r, g, b }: Rgb) -> impl std::fmt::Display {
    "    ".on(Color::Rgb { r, g, b })
}
