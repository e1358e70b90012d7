mod events;
mod ui;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use events::{Config, Event, Events};
use minesweep_engine::Difficulty;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use structopt::StructOpt;
use tracing::Level;
use ui::{Action, App};

#[derive(Debug, StructOpt)]
#[structopt(name = "minesweep", about = "Play Minesweeper in the terminal")]
struct Opt {
    /// beginner, intermediate, expert, or 1-3
    #[structopt(short, long, default_value = "beginner")]
    difficulty: Difficulty,

    /// Seed for the first game's mine layout
    #[structopt(short, long)]
    seed: Option<u64>,

    /// Milliseconds between redraws
    #[structopt(long, default_value = "250")]
    tick_rate: u64,

    /// Write logs to this file
    #[structopt(long, parse(from_os_str))]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[structopt(short, long)]
    verbose: bool,
}

fn init_logging(path: &Path, verbose: bool) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();
    Ok(())
}

/// Runs `setup`, calling `undo` if it fails.
fn undo_on_error<T>(setup: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    setup().map_err(|err| {
        undo();
        err
    })
}

fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, events: &Events) -> Result<()> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;

        match events.next()? {
            Event::Input(key) => {
                if app.handle_key(key) == Action::Quit {
                    return Ok(());
                }
            }
            Event::Tick => {}
            Event::Interrupt => return Ok(()),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    if let Some(path) = &opt.log_file {
        init_logging(path, opt.verbose)?;
    }

    let events = Events::with_config(Config {
        tick_rate: Duration::from_millis(opt.tick_rate),
    })
    .context("failed to install interrupt handler")?;
    let mut app = App::new(opt.difficulty, opt.seed);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut terminal = undo_on_error(
        || {
            let mut stdout = io::stdout();
            execute!(stdout, EnterAlternateScreen)?;
            Ok(Terminal::new(CrosstermBackend::new(stdout))?)
        },
        || {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        },
    )
    .context("failed to set up the terminal")?;

    let result = run(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    let board = app.board();
    if let Some(exposed) = board.exposed() {
        println!("{}", if board.won() { "You win!" } else { "You lose!" });
        print!("{exposed}");
    }
    Ok(())
}
