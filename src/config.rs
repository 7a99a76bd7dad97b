//! Runtime configuration shared by the CLI and the HTTP server.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::card::CardConfig;
use crate::error::CarnetError;
use crate::render::{DEFAULT_LOAD_TIMEOUT, FontBook};
use crate::roster::{JsonFileRoster, RestRoster, RosterProvider, StaticRoster};

/// Where rosters come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSource {
    /// A JSON array of students on disk.
    File(PathBuf),
    /// A PostgREST records service.
    Rest { base_url: String, api_key: String },
    /// No roster configured; every school is empty.
    Empty,
}

impl RosterSource {
    /// Pick a source from CLI/env values. A file wins over a REST URL.
    pub fn from_options(
        file: Option<PathBuf>,
        url: Option<String>,
        key: Option<String>,
    ) -> Result<Self, CarnetError> {
        match (file, url) {
            (Some(path), _) => Ok(RosterSource::File(path)),
            (None, Some(base_url)) => {
                let api_key = key.ok_or_else(|| {
                    CarnetError::Config(
                        "CARNET_ROSTER_KEY is required with CARNET_ROSTER_URL".to_string(),
                    )
                })?;
                Ok(RosterSource::Rest { base_url, api_key })
            }
            (None, None) => Ok(RosterSource::Empty),
        }
    }

    pub fn build(&self, timeout: Duration) -> Result<Arc<dyn RosterProvider>, CarnetError> {
        Ok(match self {
            RosterSource::File(path) => Arc::new(JsonFileRoster::new(path)),
            RosterSource::Rest { base_url, api_key } => Arc::new(
                RestRoster::new(base_url, api_key, timeout)
                    .map_err(|e| CarnetError::Config(format!("Roster client: {}", e)))?,
            ),
            RosterSource::Empty => Arc::new(StaticRoster::new(Vec::new())),
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    pub roster: RosterSource,
    /// Directory of `.ttf`/`.otf` faces; Spleen bitmaps are used without it.
    pub font_dir: Option<PathBuf>,
    /// Design loaded at startup; the default design without it.
    pub design_path: Option<PathBuf>,
    /// Bound on logo and roster requests.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            roster: RosterSource::Empty,
            font_dir: None,
            design_path: None,
            request_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }
}

/// Load fonts from `dir`, or an empty book.
pub fn load_fonts(dir: Option<&Path>) -> Result<FontBook, CarnetError> {
    match dir {
        Some(dir) => FontBook::load_dir(dir),
        None => Ok(FontBook::new()),
    }
}

/// Load the design at `path`, or the default design.
pub fn load_design(path: Option<&Path>) -> Result<CardConfig, CarnetError> {
    match path {
        Some(path) => CardConfig::load(path),
        None => Ok(CardConfig::default()),
    }
}
