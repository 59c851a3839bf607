mod actions;
mod gateway;
mod state;
mod theme;
mod ui;
mod worker;

use actions::LaunchMode;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use gateway::{GatewayClient, GatewaySettings};
use mc_core::paths::expand_home;
use mc_core::{Config, ShellProbes, StatusProbes};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{App, Effect, FrameMap};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use worker::{AppEvent, Dispatcher, EVENT_QUEUE_CAPACITY};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Parser)]
#[command(name = "mc")]
#[command(about = "Terminal dashboard for a portfolio of projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// TOML config file (default: $XDG_CONFIG_HOME/mission-control/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory the discovery helper scans
    #[arg(long, global = true)]
    projects_root: Option<PathBuf>,
    /// Run discovery even when a cached project list exists
    #[arg(long, global = true)]
    rediscover: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the dashboard (default)
    #[command(alias = "ui")]
    Tui,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let config = Arc::new(load_config(&cli)?);

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_dashboard(config, cli.rediscover).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_file = std::env::var_os("MC_LOG_FILE").and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    match log_file {
        Some(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let home = dirs::home_dir();
    let mut config = match &cli.config {
        Some(path) => {
            if !path.is_file() {
                bail!("config file {} does not exist", path.display());
            }
            Config::load(Some(path), home.as_deref())
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => match Config::load(Config::default_path().as_deref(), home.as_deref()) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "ignoring invalid config file");
                let mut config = Config::defaults(home.as_deref());
                config.apply_env(|key| std::env::var(key).ok(), home.as_deref());
                config
            }
        },
    };
    if let Some(root) = &cli.projects_root {
        config.projects_root = expand_home(&root.to_string_lossy());
    }
    Ok(config)
}

async fn run_dashboard(config: Arc<Config>, rediscover: bool) -> Result<()> {
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let gateway = match GatewaySettings::load(&config.gateway_config) {
        Ok(settings) => Some(Arc::new(GatewayClient::new(settings, config.chat_tool.clone()))),
        Err(err) => {
            info!(%err, "chat gateway unavailable");
            None
        }
    };
    let probes: Arc<dyn StatusProbes> = Arc::new(ShellProbes::from_config(&config));
    let mut dispatcher = Dispatcher::new(config.clone(), tx, probes, gateway, rediscover);

    let mut terminal = setup_terminal().context("failed to initialise terminal")?;
    let height = terminal.size()?.height;
    let mut app = App::new(config.clone(), height);
    dispatcher.execute(app.request_reload());
    dispatcher.ping_gateway();

    let result = run_app(&mut terminal, &mut app, &mut dispatcher, rx, config.tick).await;
    restore_terminal(&mut terminal).context("failed to restore terminal")?;
    result
}

async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    dispatcher: &mut Dispatcher,
    mut rx: mpsc::Receiver<AppEvent>,
    tick: Duration,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let mut frame = FrameMap::default();
        terminal.draw(|f| frame = ui::render(f, app))?;
        app.set_frame(frame);

        let effect = tokio::select! {
            _ = ticker.tick() => None,
            Some(event) = rx.recv() => app.apply_event(event),
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => handle_input(event, app),
                Some(Err(err)) => {
                    warn!(?err, "terminal event stream error");
                    None
                }
                None => Some(Effect::Quit),
            },
        };

        match effect {
            None => {}
            Some(Effect::Quit) => break,
            Some(Effect::Launch {
                action,
                project,
                spec,
            }) if spec.mode == LaunchMode::Foreground => {
                info!(?action, %project, "handing terminal to foreground action");
                // The reader thread would steal the child's keystrokes.
                drop(events);
                suspend_terminal(terminal)?;
                tokio::task::block_in_place(|| actions::run_foreground(&spec));
                resume_terminal(terminal)?;
                events = EventStream::new();
            }
            Some(other) => dispatcher.execute(other),
        }
    }
    Ok(())
}

fn handle_input(event: Event, app: &mut App) -> Option<Effect> {
    match event {
        Event::Key(key) => app.handle_key(key),
        Event::Mouse(mouse) => app.handle_mouse(mouse),
        Event::Resize(_, height) => {
            app.resize(height);
            None
        }
        _ => None,
    }
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn suspend_terminal(terminal: &mut Tui) -> Result<()> {
    restore_terminal(terminal)
}

fn resume_terminal(terminal: &mut Tui) -> Result<()> {
    enable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        EnterAlternateScreen,
        EnableMouseCapture
    )?;
    terminal.clear()?;
    Ok(())
}
