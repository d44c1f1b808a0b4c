pub mod app;
pub mod input;
pub mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser};
use crossterm::event::{self, Event as TermEvent, KeyEventKind};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use murmur_core::backend::{Backend, HttpBackend, MemoryBackend, User};
use murmur_core::config::Config;
use murmur_core::settings::Settings;
use murmur_core::worker::{self, Event};

use app::App;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "murmur", version, about = "Murmur: voice-first to-do list in the terminal")]
pub struct Cli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Path to an alternative config file.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Override a config key, e.g. --set auth_token=tok_123.
    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub set: Vec<KeyVal>,

    /// Run against an in-memory store instead of the hosted backend.
    #[arg(long = "offline")]
    pub offline: bool,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(cli.set.iter().cloned().map(|kv| (kv.key, kv.value)));

    let _log_guard = init_tracing(&cfg, cli.verbose, cli.quiet)?;
    info!(offline = cli.offline, "starting murmur");

    let settings = Settings::load(None).unwrap_or_else(|err| {
        warn!(error = %err, "failed to load settings, using defaults");
        Settings::default()
    });

    let backend: Arc<dyn Backend> = if cli.offline {
        Arc::new(MemoryBackend::new(User {
            id: "local".to_string(),
            email: Some("local@this-device".to_string()),
        }))
    } else {
        Arc::new(HttpBackend::new(&cfg.backend_url, &cfg.auth_token))
    };

    let worker = worker::spawn(backend, cfg.language.clone()).context("failed to spawn backend worker")?;

    let mut terminal = ui::init_terminal()?;
    let app = App::new(worker.commands.clone(), settings);
    let result = event_loop(&mut terminal, app, &worker.events);

    ui::restore_terminal()?;
    worker.shutdown();
    info!("murmur stopped");

    result
}

fn event_loop(
    terminal: &mut ui::Tui,
    mut app: App,
    events: &Receiver<Event>,
) -> anyhow::Result<()> {
    while app.running {
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }
        app.tick();

        terminal.draw(|frame| ui::render(frame, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let TermEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    input::handle_key(&mut app, key);
                }
            }
        }
    }
    Ok(())
}

fn init_tracing(
    cfg: &Config,
    verbose: u8,
    quiet: u8,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let log_path = cfg.log_file_path();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    // The terminal belongs to the UI; logs go to a file.
    let (writer, guard) = tracing_appender::non_blocking(file);
    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(guard)
}
