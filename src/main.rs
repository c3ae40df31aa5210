mod app;
mod config;
mod core;
mod logging;
mod ui;
mod utils;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use crate::app::App;
use crate::core::AppState;

/// Terminal front-end for scripted OS installs to removable disks
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to an alternate configuration file
    config: Option<PathBuf>,

    /// Write logs to this file instead of the default location
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref());
    let config = config::load(cli.config.as_deref());

    // Safety check: Validate terminal size BEFORE entering raw mode or alternate screen.
    let (cols, rows) = crossterm::terminal::size()?;
    if cols == 0 || rows == 0 || cols > 1000 || rows > 1000 {
        anyhow::bail!(
            "Invalid terminal size detected ({}x{}). Please ensure you're running in a valid terminal.",
            cols,
            rows
        );
    }

    // Now safe to setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    // Warn but don't exit; the listing command decides what it can see
    if !utils::is_root() {
        app.push_output(
            "Warning: not running as root. Device listing and installing may fail.".to_string(),
        );
    }

    // Initial device scan
    app.refresh_devices();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    loop {
        app.tick = app.tick.wrapping_add(1);

        // Drain events from the in-flight install
        while let Ok(event) = app.events_rx.try_recv() {
            app.handle_install_event(event);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with timeout for tick
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match &app.state {
                    AppState::Idle => {
                        handle_idle_input(app, key.code);
                    }
                    AppState::ConfirmInstall(_) => {
                        handle_confirm_input(app, key.code);
                    }
                    AppState::Installing => {
                        handle_installing_input(app, key.code);
                    }
                    AppState::Error(_) | AppState::Success(_) => {
                        handle_message_input(app, key.code);
                    }
                }

                if app.should_quit {
                    return Ok(());
                }
            }
        }
    }
}

fn handle_idle_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::Enter => app.enter_confirm_mode(),
        KeyCode::Char('r') => app.refresh_devices(),
        _ => {}
    }
}

fn handle_confirm_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc => app.cancel(),
        KeyCode::Enter => app.start_install(),
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        KeyCode::Char(c) => {
            app.input_buffer.push(c);
        }
        _ => {}
    }
}

fn handle_installing_input(app: &mut App, key: KeyCode) {
    // Everything except cancellation is blocked while the script runs
    if key == KeyCode::Esc {
        app.request_cancel();
    }
}

fn handle_message_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Enter => app.cancel(),
        _ => {}
    }
}
