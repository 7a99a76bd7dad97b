//! Server state shared across handlers.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::card::{CardConfig, LayoutEditor};
use crate::config::{ServerConfig, load_design, load_fonts};
use crate::error::CarnetError;
use crate::export::{ExportSettings, Exporter};
use crate::qr::{ModuleQr, QrGenerator};
use crate::render::{CardRenderer, ImageLoader};
use crate::roster::RosterProvider;

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// The design being edited. Exports snapshot it at trigger time.
    pub editor: RwLock<LayoutEditor>,
    pub settings: RwLock<ExportSettings>,
    pub renderer: CardRenderer,
    pub qr: Arc<dyn QrGenerator>,
    pub exporter: Exporter,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        design: CardConfig,
        renderer: CardRenderer,
        qr: Arc<dyn QrGenerator>,
        roster: Arc<dyn RosterProvider>,
    ) -> Result<Self, CarnetError> {
        let exporter = Exporter::new(renderer.clone(), qr.clone(), roster);
        Ok(Self {
            config,
            editor: RwLock::new(LayoutEditor::new(design)?),
            settings: RwLock::new(ExportSettings::default()),
            renderer,
            qr,
            exporter,
        })
    }

    /// Build fonts, image loader, roster and starting design from `config`.
    pub fn from_config(config: ServerConfig) -> Result<Self, CarnetError> {
        let fonts = load_fonts(config.font_dir.as_deref())?;
        let images = ImageLoader::new(config.request_timeout)?;
        let renderer = CardRenderer::new(Arc::new(fonts), Arc::new(images));
        let roster = config.roster.build(config.request_timeout)?;
        let design = load_design(config.design_path.as_deref())?;
        Self::new(config, design, renderer, Arc::new(ModuleQr::default()), roster)
    }
}
