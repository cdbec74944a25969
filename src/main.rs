mod account;
mod app;
mod assistant;
mod config;
mod data;
mod event;
mod gateway;
mod store;
mod ui;
mod util;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::app::App;
use crate::config::Config;
use crate::data::refresh::{RefreshOrchestrator, RefreshOutcome};
use crate::data::repository::{Endpoints, ReadingRepository};
use crate::gateway::{GatewayConfig, HttpGateway};
use crate::store::{Preferences, API_URL_KEY};
use crate::util::{format_value, with_unit};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = Config::parse();

    init_logging(&config.log_path(), &config.log_level)?;
    log::info!("aquamon {} starting", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .wrap_err("failed to start async runtime")?;

    let prefs = Preferences::open(config.state_path());
    if config.once {
        return print_latest(&config, &prefs, &runtime);
    }

    let mut app = App::new(&config, prefs, runtime.handle().clone());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = app.run(&mut terminal);

    // Restore the terminal even when the loop failed.
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    runtime.shutdown_timeout(std::time::Duration::from_millis(500));
    log::info!("aquamon exiting");
    result
}

/// The dashboard owns the terminal, so logs go to a file. `AQUAMON_LOG`
/// overrides `--log-level`.
fn init_logging(path: &Path, level: &str) -> color_eyre::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("failed to create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;

    env_logger::Builder::new()
        .parse_filters(level)
        .parse_env("AQUAMON_LOG")
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn print_latest(
    config: &Config,
    prefs: &Preferences,
    runtime: &tokio::runtime::Runtime,
) -> color_eyre::Result<()> {
    let url = config.resolve_api_url(prefs.get_str(API_URL_KEY));
    let gateway = HttpGateway::new(GatewayConfig::new(&url, config.timeout()));
    let mut repo = ReadingRepository::new(Arc::new(gateway), Endpoints::default());
    let mut refresher = RefreshOrchestrator::new(runtime.handle().clone());

    if let Some(RefreshOutcome::Failed(err)) = runtime.block_on(refresher.refresh_all(&mut repo)) {
        return Err(eyre!("could not reach {url}: {err}"));
    }
    for warning in &repo.snapshot().warnings {
        eprintln!("warning: {warning}");
    }
    for latest in repo.latest_readings() {
        let (value, when) = match latest.reading {
            Some(r) => (
                with_unit(&format_value(&r.value), &latest.sensor.unit),
                r.timestamp.as_str(),
            ),
            None => ("-".to_string(), ""),
        };
        println!("{:<24} {:>14}  {}", latest.sensor.name, value, when);
    }
    Ok(())
}
