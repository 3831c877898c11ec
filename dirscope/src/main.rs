//! src/main.rs
//! ============================================================================
//! # dirscope Entry Point
//!
//! Interactive filesystem-size explorer built with ratatui and tokio. The
//! default invocation walks a directory tree showing children ranked by
//! recursive size; `dirscope report` prints a one-shot ranking instead.

use std::{
    io::{self, IsTerminal, Stdout},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend as Backend};
use tokio::{
    signal,
    sync::{Notify, mpsc},
};
use tracing::{error, info, warn};

use dirscope::{
    AppError, AppState, Logger,
    cli::{Cli, Command},
    config::config::Config,
    controller::{actions::Action, event_loop::Controller},
    fs::measure::{self, Measure},
    model::app_state::resolve_start_path,
    persist::store::ScanStore,
    report,
    view::ui::{CHROME_ROWS, View},
};

type AppTerminal = Terminal<Backend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = Cli::parse();

    match cli.command {
        Some(Command::Report(args)) => {
            Logger::init_tracing(args.debug || cli.debug);
            let config: Config = Config::load().await.unwrap_or_else(|e| {
                warn!("Failed to load config, using defaults: {}", e);
                Config::default()
            });
            let measure: Arc<dyn Measure> = measure::create_measure(config.backend);
            let target: PathBuf = resolve_start_path(args.target, &config)?;
            report::run(
                measure,
                &config,
                report::ReportOptions {
                    target,
                    top: args.top,
                    min_size_kb: args.min_size,
                    exclude: args.exclude,
                },
            )
            .await?;
            Ok(())
        }
        None => {
            if !io::stdout().is_terminal() {
                return Err(AppError::NotATty.into());
            }
            let app: App = App::new(cli)
                .await
                .context("Failed to initialize application")?;
            app.run().await.context("Application runtime error")?;
            info!("Application exited cleanly");
            Ok(())
        }
    }
}

/// Application runtime wiring and state
struct App {
    terminal: AppTerminal,
    controller: Controller,
    state: AppState,
    shutdown: Arc<Notify>,
}

impl App {
    /// Initialize the application with all necessary components
    async fn new(cli: Cli) -> Result<Self> {
        // Logging first; file-only so the alternate screen stays clean
        Logger::init_tracing(false);
        info!("Starting dirscope");

        setup_panic_handler();
        let terminal: AppTerminal = setup_terminal().context("Failed to initialize terminal")?;

        let config: Arc<Config> = Arc::new(Config::load().await.unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }));

        let measure: Arc<dyn Measure> = measure::create_measure(config.backend);
        let store: Arc<ScanStore> = Arc::new(
            ScanStore::at_default_location().context("Failed to locate scan store")?,
        );
        let start_path: PathBuf = resolve_start_path(cli.target, &config)?;

        let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();
        let controller: Controller = Controller::new(action_rx);

        let (_cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        let window: usize = rows.saturating_sub(CHROME_ROWS) as usize;

        let mut state: AppState =
            AppState::new(config, measure, store, action_tx, start_path, window);
        state.startup().await;

        let shutdown: Arc<Notify> = Arc::new(Notify::new());

        info!("Application initialization complete");
        Ok(Self {
            terminal,
            controller,
            state,
            shutdown,
        })
    }

    /// Run the main application event loop
    async fn run(mut self) -> Result<()> {
        self.setup_shutdown_handler();
        info!("Starting main event loop");

        loop {
            self.render()?;

            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("Shutdown signal received");
                    break;
                }

                maybe_action = self.controller.next_task_action() => {
                    match maybe_action {
                        Some(action) => self.state.apply(action),
                        None => {
                            info!("Action channel closed");
                            break;
                        }
                    }
                }

                maybe_event = Controller::next_terminal_event() => {
                    if let Some(event) = maybe_event
                        && let Some(action) = Controller::decode(&self.state.nav.mode, event)
                    {
                        if matches!(action, Action::Quit) {
                            info!("Quit action received");
                            break;
                        }
                        self.state.apply(action);
                    }
                }
            }
        }

        info!("Main event loop ended");
        Ok(())
    }

    /// Render the UI if a redraw is needed
    fn render(&mut self) -> Result<()> {
        if self.state.redraw {
            let state: &AppState = &self.state;
            self.terminal
                .draw(|frame: &mut Frame<'_>| {
                    View::redraw(frame, state);
                })
                .context("Failed to draw terminal")?;
            self.state.redraw = false;
        }
        Ok(())
    }

    /// Setup signal handlers for graceful shutdown
    fn setup_shutdown_handler(&self) {
        let shutdown: Arc<Notify> = self.shutdown.clone();

        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C signal");
                    shutdown.notify_one();
                }
                Err(e) => {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
            }
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Err(e) = cleanup_terminal(&mut self.terminal) {
            error!("Failed to cleanup terminal: {}", e);
        }
    }
}

/// Initialize terminal in raw mode with alternate screen
fn setup_terminal() -> Result<AppTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend: Backend<Stdout> = Backend::new(stdout);
    let terminal: Terminal<Backend<Stdout>> =
        Terminal::new(backend).context("Failed to create terminal")?;

    info!("Terminal setup complete");
    Ok(terminal)
}

/// Restore terminal to normal mode
fn cleanup_terminal(terminal: &mut AppTerminal) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;

    terminal.show_cursor().context("Failed to show cursor")?;

    info!("Terminal cleanup complete");
    Ok(())
}

/// Setup panic handler for graceful terminal restoration
fn setup_panic_handler() {
    let original_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);

        error!("Application panicked: {}", panic_info);
        original_hook(panic_info);
    }));
}
