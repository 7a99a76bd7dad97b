//! Export settings chosen in the designer and the job they produce.

use serde::{Deserialize, Serialize};

use crate::layout::Orientation;

pub const PDF_FILE_NAME: &str = "tarjetas_identificacion_estudiantes.pdf";
pub const DOCX_FILE_NAME: &str = "tarjetas_identificacion_estudiantes.docx";
pub const PNG_FILE_NAME: &str = "tarjeta_identificacion_estudiante.png";

/// Title of generated documents.
pub const DOCUMENT_TITLE: &str = "Tarjetas de Identificación Estudiantil";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Word,
    Zip,
}

impl ExportFormat {
    /// Name of the downloaded artifact.
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Pdf => PDF_FILE_NAME,
            ExportFormat::Word => DOCX_FILE_NAME,
            ExportFormat::Zip => PNG_FILE_NAME,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Zip => "image/png",
        }
    }
}

/// Upper bound of the cards-per-page selector for an orientation.
pub fn max_requestable(orientation: Orientation) -> usize {
    match orientation {
        Orientation::Portrait => 8,
        Orientation::Landscape => 9,
    }
}

/// One export invocation. Not queued, not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportJob {
    pub format: ExportFormat,
    pub cards_per_page: usize,
    pub orientation: Orientation,
}

/// Designer-level settings for the next export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    pub orientation: Orientation,
    pub cards_per_page: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Pdf,
            orientation: Orientation::Portrait,
            cards_per_page: 4,
        }
    }
}

impl ExportSettings {
    /// Switch orientation. Going to portrait caps cards-per-page at 8.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        if orientation == Orientation::Portrait && self.cards_per_page > 8 {
            self.cards_per_page = 8;
        }
        self.orientation = orientation;
    }

    /// Set cards-per-page within the selector range of the orientation.
    pub fn set_cards_per_page(&mut self, cards_per_page: usize) {
        self.cards_per_page = cards_per_page.clamp(1, max_requestable(self.orientation));
    }

    /// Bring externally supplied settings into range.
    pub fn normalized(mut self) -> Self {
        self.set_cards_per_page(self.cards_per_page);
        self
    }

    pub fn job(&self) -> ExportJob {
        ExportJob {
            format: self.format,
            cards_per_page: self.cards_per_page,
            orientation: self.orientation,
        }
    }
}
