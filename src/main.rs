use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::prelude::*;
use simplelog::{Config, WriteLogger};
use snekpilot::app::App;
use snekpilot::autopilot;
use snekpilot::config::Options;
use snekpilot::input::Command;
use snekpilot::{Engine, FileStore, GridSize, HighScoreStore, MemoryStore};
use std::fs::File;
use std::io::{self, Stdout};
use std::panic;
use std::time::Instant;

/// Board used until the first frame reports the real terminal size.
const STARTING_GRID: GridSize = GridSize::new(20, 20);

fn main() -> Result<(), io::Error> {
    let options = Options::parse();

    // Set up logging before anything else
    WriteLogger::init(
        options.log_level,
        Config::default(),
        File::create(&options.log_file)?,
    )
    .expect("Failed to initialize logger");

    info!("Starting snekpilot");

    // Raw mode owns the terminal, so panic reports go to the log instead.
    panic::set_hook(Box::new(|info| error!("{}", info)));

    let store: Box<dyn HighScoreStore> = if options.no_save {
        Box::new(MemoryStore::default())
    } else {
        let store = FileStore::new(&options.high_score_file);
        info!("High score file {}", store.path().display());
        Box::new(store)
    };
    let mut engine = match options.seed {
        Some(seed) => Engine::seeded(STARTING_GRID, store, seed),
        None => Engine::new(STARTING_GRID, store),
    };
    engine.set_base_interval(options.speed());

    if let Some(name) = &options.autopilot {
        match autopilot::by_name(name, options.autopilot_budget()) {
            Some(pilot) => engine.attach_autopilot(pilot),
            None => {
                error!("Unknown autopilot {}", name);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "unknown autopilot {:?} (known: {})",
                        name,
                        autopilot::known_names().join(", ")
                    ),
                ));
            }
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(engine);
    let result = run(&mut terminal, &mut app);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("Terminal failure: {}", e);
    }
    info!("Final high score {}", app.engine().high_score());
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f, Instant::now()))?;
        if app.should_quit() {
            return Ok(());
        }

        // Wait for input no longer than the next tick is due
        if event::poll(app.poll_timeout(Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = Command::from_key(key) {
                    app.handle(command, Instant::now());
                }
            }
        }

        app.poll_tick(Instant::now());
    }
}
