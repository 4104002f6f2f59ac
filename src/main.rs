use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{io, path::PathBuf, time::Duration};

mod app;
mod chat;
mod config;
mod logging;
mod ui;

use app::App;
use config::Config;

fn cli() -> Command {
    Command::new("chatlayout")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Chat bubble layout demo: sent/received bubbles with date separators")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Read settings from this TOML file instead of the default location"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("TIMESTAMP")
                .help("Timestamp of the first message, e.g. 2020-01-03T10:44:00+0000"),
        )
        .arg(
            Arg::new("repeat")
                .short('r')
                .long("repeat")
                .value_name("COUNT")
                .value_parser(clap::value_parser!(usize))
                .help("How many times the sample conversation repeats"),
        )
        .arg(
            Arg::new("utc")
                .long("utc")
                .action(ArgAction::SetTrue)
                .conflicts_with("tz")
                .help("Show dates and times in UTC"),
        )
        .arg(
            Arg::new("tz")
                .long("tz")
                .value_name("OFFSET")
                .allow_hyphen_values(true)
                .help("Show dates and times at a fixed offset, e.g. +05:30"),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .action(ArgAction::SetTrue)
                .help("Print the rows as plain text and exit"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Debug-level logging"),
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    let dump = matches.get_flag("dump");

    let log_path = logging::init(matches.get_flag("verbose"), dump)?;

    let mut config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(seed) = matches.get_one::<String>("seed") {
        config.seed = seed.clone();
    }
    if let Some(repeat) = matches.get_one::<usize>("repeat") {
        config.repeat_count = *repeat;
    }
    if matches.get_flag("utc") {
        config.time_zone = "utc".to_string();
    } else if let Some(tz) = matches.get_one::<String>("tz") {
        config.time_zone = tz.clone();
    }
    config.validate()?;

    let source = config.source()?;
    let mut app = App::new(&source, &config)?;

    if dump {
        for line in app.transcript() {
            println!("{}", line);
        }
        return Ok(());
    }

    if let Some(path) = &log_path {
        tracing::info!(path = %path.display(), "Starting terminal UI");
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, poll_terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Returned only now so the error reaches a restored terminal on stderr.
    if let Err(err) = &res {
        tracing::error!(error = ?err, "UI loop failed");
    }
    res
}

/// Wait up to `timeout` for the next terminal event.
fn poll_terminal(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

fn run_app<B, F>(terminal: &mut Terminal<B>, app: &mut App, mut next_event: F) -> Result<()>
where
    B: Backend,
    F: FnMut(Duration) -> Result<Option<Event>>,
{
    let poll_rate = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Some(event) = next_event(poll_rate)? {
            app.handle_input(event);
        }

        if app.should_quit {
            tracing::debug!("Quit requested");
            return Ok(());
        }
    }
}
