use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::data::series::{SeriesOptions, DEFAULT_LABEL_STRIDE, DEFAULT_WINDOW};
use crate::gateway::http::DEFAULT_TIMEOUT_MS;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Parser, Debug)]
#[command(name = "aquamon", version, about = "Terminal dashboard for aquaponic farm sensors")]
pub struct Config {
    /// Farm API base URL (overrides the saved one)
    #[arg(short = 'u', long)]
    pub api_url: Option<String>,

    /// Automatic refresh interval in seconds, 0 to refresh only on demand
    #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub refresh_interval: u64,

    /// Per-request timeout in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS, value_parser = clap::value_parser!(u64).range(250..=60000))]
    pub timeout: u64,

    /// Most recent readings shown per chart panel
    #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Label every Nth point on the chart axis
    #[arg(long, default_value_t = DEFAULT_LABEL_STRIDE)]
    pub label_stride: usize,

    /// Where the saved API URL and signed-in user live
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Log file (the terminal belongs to the dashboard)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Fetch once, print the latest reading of every sensor and exit
    #[arg(long)]
    pub once: bool,

    /// Log filter, e.g. "info" or "aquamon=debug"; AQUAMON_LOG wins when set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn refresh_every(&self) -> Option<Duration> {
        (self.refresh_interval > 0).then(|| Duration::from_secs(self.refresh_interval))
    }

    pub fn series_options(&self) -> SeriesOptions {
        SeriesOptions {
            window: self.window.max(1),
            label_stride: self.label_stride.max(1),
        }
    }

    pub fn state_dir(&self) -> PathBuf {
        std::env::var_os("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME")
                    .map(|home| PathBuf::from(home).join(".local").join("state"))
            })
            .map(|base| base.join("aquamon"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| self.state_dir().join("state.json"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.state_dir().join("aquamon.log"))
    }

    /// CLI flag, then the saved value, then the built-in default.
    pub fn resolve_api_url(&self, saved: Option<&str>) -> String {
        self.api_url
            .as_deref()
            .or(saved)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }
}
