//! # Carnet - Student ID-Card Designer
//!
//! Carnet designs student ID cards and exports them for printing. It
//! provides:
//!
//! - **Card model and editor**: positioned logo, text and QR elements on a
//!   fixed 350×200 canvas, with clamped moves and drags
//! - **Rendering**: raster cards with gradients, bitmap or TrueType text,
//!   remote logos and per-student QR codes
//! - **Page packing**: A4 grids of 85 mm cards in portrait or landscape
//! - **Export**: PDF sheets for a whole roster, a Word title page, or a
//!   single flat PNG card
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use carnet::{
//!     card::CardConfig,
//!     export::{ExportSettings, Exporter},
//!     qr::ModuleQr,
//!     render::{CardRenderer, FontBook, ImageLoader, DEFAULT_LOAD_TIMEOUT},
//!     roster::JsonFileRoster,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = CardRenderer::new(
//!     Arc::new(FontBook::new()),
//!     Arc::new(ImageLoader::new(DEFAULT_LOAD_TIMEOUT)?),
//! );
//! let exporter = Exporter::new(
//!     renderer,
//!     Arc::new(ModuleQr::default()),
//!     Arc::new(JsonFileRoster::new("roster.json")),
//! );
//!
//! let job = ExportSettings::default().job();
//! let artifact = exporter
//!     .export(&job, Arc::new(CardConfig::default()), "school-1", CancellationToken::new())
//!     .await?;
//! std::fs::write(&artifact.file_name, &artifact.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`card`] | Design model, element roles and the layout editor |
//! | [`render`] | Surfaces, text, image loading and the card renderer |
//! | [`layout`] | A4 page geometry and card packing |
//! | [`export`] | PDF, Word and PNG export with a single-job guard |
//! | [`roster`] | Student records by school |
//! | [`qr`] | QR code rendering |
//! | [`server`] | HTTP designer API |
//! | [`config`] | Runtime configuration |
//! | [`error`] | Error types |

pub mod card;
pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod qr;
pub mod render;
pub mod roster;
pub mod server;

// Re-exports for convenience
pub use card::{CardConfig, LayoutEditor};
pub use error::CarnetError;
