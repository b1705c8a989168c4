//! Handles settings for the application.
//!
//! Sources, lowest precedence first: defaults, the TOML file
//! (`settings.toml` unless `--config` is given), `TALLY__*` environment
//! variables (e.g. `TALLY__STORE__CREDENTIALS_JSON`), command line flags.
use std::path::PathBuf;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub allowed_origin_regex: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["*".to_string()],
            allowed_origin_regex: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sheets,
    Memory,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Store {
    pub backend: Backend,
    pub spreadsheet_name: String,
    pub worksheet: String,
    pub credentials_json: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub share_email: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            backend: Backend::Sheets,
            spreadsheet_name: "Tally".to_string(),
            worksheet: "Transactions".to_string(),
            credentials_json: None,
            credentials_file: Some(PathBuf::from("credentials.json")),
            share_email: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub store: Store,
}

#[derive(Debug, Parser)]
#[command(name = "tally", version, about = "Sync backend for the Tally PWA")]
pub struct Args {
    /// Optional settings file path (TOML, extension may be omitted).
    #[arg(long)]
    config: Option<String>,
    /// Override the bind address.
    #[arg(long)]
    bind: Option<String>,
    /// Override the listening port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    level: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name(path).required(args.config.is_some()))
            .add_source(
                Environment::with_prefix("TALLY")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(bind) = args.bind {
            settings.server.bind = bind;
        }
        if let Some(port) = args.port {
            settings.server.port = port;
        }
        if let Some(level) = args.level {
            settings.app.level = level;
        }

        Ok(settings)
    }
}
