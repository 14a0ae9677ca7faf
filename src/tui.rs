//! Full-screen dashboard: device output on top of a status line, keys send
//! commands.

use std::io::{self, Read, Stdout, Write};
use std::panic;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};

use lamp_ctl::dashboard::{Action, Dashboard, Key};
use lamp_ctl::{Lamp, PortConfig, Rgb};

type Term = Terminal<CrosstermBackend<Stdout>>;

// How long to wait for a key before polling the port again.
const TICK: Duration = Duration::from_millis(50);

pub fn run(config: &PortConfig) -> Result<()> {
    // Open before touching the terminal so open errors print normally.
    let mut lamp = Lamp::open(config)?;
    let mut dashboard = Dashboard::new(config.path.as_str(), config.baud_rate);

    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut lamp, &mut dashboard);
    let restored = restore_terminal(&mut terminal);
    first_error(result, restored)
}

// A failure inside the loop is reported ahead of one hit while restoring.
fn first_error(result: Result<()>, restored: Result<()>) -> Result<()> {
    result.and(restored)
}

// Leaves raw mode and the alternate screen before the panic message prints.
fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        previous(info);
    }));
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to start terminal")
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn event_loop<P: Read + Write>(terminal: &mut Term, lamp: &mut Lamp<P>, dashboard: &mut Dashboard) -> Result<()> {
    while !dashboard.should_quit() {
        terminal.draw(|frame| render(frame, dashboard))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let code = match key.code {
                        KeyCode::Esc => Key::Esc,
                        KeyCode::Char(c) => Key::Char(c),
                        _ => Key::Other,
                    };
                    let action = Action::from_key(code, key.modifiers.contains(KeyModifiers::CONTROL));
                    if let Some(command) = action.and_then(|action| dashboard.apply(action)) {
                        let frame = lamp.send(command)?;
                        dashboard.set_status(format!("{command}  [{frame}]"));
                    }
                }
            }
        }

        for line in lamp.drain()? {
            dashboard.push_line(line);
        }
    }
    Ok(())
}

fn render(frame: &mut Frame, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3), Constraint::Length(3)])
        .split(frame.size());

    let Rgb { r, g, b } = dashboard.color();
    let preset = dashboard.preset().map_or("-", |preset| preset.name());
    let header = vec![
        Line::from(format!("{} @ {} baud", dashboard.port, dashboard.baud_rate)),
        Line::from(vec![
            Span::raw("color "),
            Span::styled("      ", Style::default().bg(Color::Rgb(r, g, b))),
            Span::raw(format!(" {r}, {g}, {b}   preset {preset}   level {}", dashboard.level())),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title(" Lamp ")),
        chunks[0],
    );

    // Keep the newest lines in view.
    let visible = chunks[1].height.saturating_sub(2) as usize;
    let skip = dashboard.lines().len().saturating_sub(visible);
    let items: Vec<ListItem> = dashboard.lines().skip(skip).map(ListItem::new).collect();
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(" Device output ")),
        chunks[1],
    );

    let key = Style::default().add_modifier(Modifier::BOLD);
    let help = Line::from(vec![
        Span::styled("+/-", key),
        Span::raw(" level  "),
        Span::styled("p", key),
        Span::raw(" preset  "),
        Span::styled("c", key),
        Span::raw(" cycle  "),
        Span::styled("q", key),
        Span::raw(" quit"),
    ]);
    frame.render_widget(
        Paragraph::new(help).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", dashboard.status())),
        ),
        chunks[2],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn loop_error_wins_over_restore_error() {
        let err = first_error(Err(anyhow!("port closed")), Err(anyhow!("restore failed"))).unwrap_err();
        assert_eq!(err.to_string(), "port closed");
    }

    #[test]
    fn restore_error_surfaces_after_clean_loop() {
        let err = first_error(Ok(()), Err(anyhow!("restore failed"))).unwrap_err();
        assert_eq!(err.to_string(), "restore failed");
        assert!(first_error(Ok(()), Ok(())).is_ok());
    }
}
