//! # Export Pipeline
//!
//! Turns a design snapshot and a school's roster into a downloadable
//! artifact.
//!
//! | Format | Artifact | Content |
//! |--------|----------|---------|
//! | `pdf` | `tarjetas_identificacion_estudiantes.pdf` | One card per student, packed on A4 |
//! | `word` | `tarjetas_identificacion_estudiantes.docx` | Title paragraph only |
//! | `zip` | `tarjeta_identificacion_estudiante.png` | One flat card from the placeholders |
//!
//! The [`Exporter`] runs one job at a time (`Idle → Exporting → Idle`); a
//! second trigger while exporting fails with [`ExportError::Busy`]. Jobs
//! are cancellable between students and never yield partial artifacts.
//!
//! Card drawing and PDF assembly run on the blocking pool; the async side
//! only fetches the roster and the logo.

pub mod pdf;
pub mod png;
pub mod settings;
pub mod sink;
pub mod word;

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::card::CardConfig;
use crate::error::CarnetError;
use crate::layout::PageGeometry;
use crate::qr::QrGenerator;
use crate::render::{CardRenderer, RenderOptions, export_scale_factor};
use crate::roster::{RosterError, RosterProvider};

pub use pdf::PdfSheetWriter;
pub use settings::{DOCUMENT_TITLE, ExportFormat, ExportJob, ExportSettings, max_requestable};
pub use sink::{DirectorySink, DownloadSink};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("An export is already running")]
    Busy,

    #[error("Export cancelled")]
    Cancelled,

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("Render error: {0}")]
    Render(#[from] CarnetError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub format: ExportFormat,
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    /// Printed pages; 1 for single-page formats.
    pub pages: usize,
}

impl Artifact {
    pub fn new(format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            format,
            file_name: format.file_name().to_string(),
            mime_type: format.mime_type(),
            bytes,
            pages: 1,
        }
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }
}

/// Non-reentrant export driver.
pub struct Exporter {
    renderer: CardRenderer,
    qr: Arc<dyn QrGenerator>,
    roster: Arc<dyn RosterProvider>,
    busy: AtomicBool,
    current: Mutex<Option<CancellationToken>>,
}

/// Returns the exporter to idle when the job ends, however it ends.
struct ExportGuard<'a> {
    exporter: &'a Exporter,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut current) = self.exporter.current.lock() {
            *current = None;
        }
        self.exporter.busy.store(false, Ordering::Release);
    }
}

impl Exporter {
    pub fn new(
        renderer: CardRenderer,
        qr: Arc<dyn QrGenerator>,
        roster: Arc<dyn RosterProvider>,
    ) -> Self {
        Self {
            renderer,
            qr,
            roster,
            busy: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Cancel the running job. Returns false when idle.
    pub fn cancel(&self) -> bool {
        match self.current.lock() {
            Ok(current) => match current.as_ref() {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    fn begin(&self, cancel: CancellationToken) -> Result<ExportGuard<'_>, ExportError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ExportError::Busy);
        }
        let guard = ExportGuard { exporter: self };
        if let Ok(mut current) = self.current.lock() {
            *current = Some(cancel);
        }
        Ok(guard)
    }

    /// Run one job against a design snapshot and the roster of `school_id`.
    pub async fn export(
        &self,
        job: &ExportJob,
        config: Arc<CardConfig>,
        school_id: &str,
        cancel: CancellationToken,
    ) -> Result<Artifact, ExportError> {
        let _guard = self.begin(cancel.clone())?;
        let started = Instant::now();
        tracing::info!(
            format = ?job.format,
            orientation = ?job.orientation,
            cards_per_page = job.cards_per_page,
            school_id,
            "Export started"
        );

        let result = match job.format {
            ExportFormat::Pdf => self
                .export_pdf(job, config, school_id, &cancel)
                .await
                .map(|(bytes, pages)| Artifact::new(job.format, bytes).with_pages(pages)),
            ExportFormat::Word => {
                word::build_docx(DOCUMENT_TITLE, Utc::now()).map(|b| Artifact::new(job.format, b))
            }
            ExportFormat::Zip => self
                .export_flat_png(config)
                .await
                .map(|bytes| Artifact::new(job.format, bytes)),
        };

        match &result {
            Ok(artifact) => tracing::info!(
                file = %artifact.file_name,
                bytes = artifact.bytes.len(),
                pages = artifact.pages,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Export finished"
            ),
            Err(ExportError::Cancelled) => tracing::warn!("Export cancelled"),
            Err(e) => tracing::error!(error = %e, "Export failed"),
        }
        result
    }

    async fn export_flat_png(&self, config: Arc<CardConfig>) -> Result<Vec<u8>, ExportError> {
        let renderer = self.renderer.clone();
        let png = tokio::task::spawn_blocking(move || {
            png::render_flat_png(&config, renderer.fonts())
        })
        .await??;
        Ok(png)
    }

    /// Returns the document and its page count.
    async fn export_pdf(
        &self,
        job: &ExportJob,
        config: Arc<CardConfig>,
        school_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(Vec<u8>, usize), ExportError> {
        let students = self.roster.fetch(school_id).await?;
        let total = students.len();

        let geometry = PageGeometry::a4(job.orientation);
        let packing = geometry.pack(job.cards_per_page);
        let opts = RenderOptions::export(export_scale_factor());

        tracing::debug!(
            students = total,
            per_page = packing.per_page,
            pages = packing.page_count(total),
            "Packing roster"
        );

        let logo = self.renderer.load_logo(&config).await;
        let mut cards = Vec::with_capacity(total);
        for student in students {
            if cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            let renderer = self.renderer.clone();
            let qr = self.qr.clone();
            let config = config.clone();
            let logo = logo.clone();
            let card = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, CarnetError> {
                let code = qr.render(student.qr_payload())?;
                renderer
                    .draw(&config, &student, &code, logo.as_deref(), opts)
                    .encode_png()
            })
            .await??;
            cards.push(card);
        }

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        // The PDF document is not Send; build it in one blocking call.
        tokio::task::spawn_blocking(move || -> Result<(Vec<u8>, usize), ExportError> {
            let mut sheet = PdfSheetWriter::new(DOCUMENT_TITLE, geometry);
            for (placement, card) in packing.placements(total).zip(&cards) {
                sheet.place_card(card, &placement)?;
                if packing.page_break_after(placement.index, total) {
                    sheet.break_page();
                }
            }
            let pages = sheet.page_count();
            Ok((sheet.finish(), pages))
        })
        .await?
    }
}
