//! Export settings, sheet preview and export trigger handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::export::{ExportFormat, ExportSettings};
use crate::layout::{Orientation, PageGeometry, render_sheet};

use super::super::state::AppState;
use super::{ApiError, api_error, design_error, export_error, internal_error};

/// GET /api/export/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<ExportSettings> {
    Json(*state.settings.read().await)
}

/// PUT /api/export/settings - Store settings, bringing cards-per-page into range.
pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(requested): Json<ExportSettings>,
) -> Json<ExportSettings> {
    let settings = requested.normalized();
    *state.settings.write().await = settings;
    Json(settings)
}

/// GET /api/export/sheet - PNG of one page packed with the preview card.
pub async fn sheet(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let settings = *state.settings.read().await;
    let snapshot = state.editor.read().await.snapshot();
    let logo = state.renderer.load_logo(&snapshot).await;
    let renderer = state.renderer.clone();
    let qr = state.qr.clone();

    let png_bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let card = renderer
            .draw_preview(&snapshot, qr.as_ref(), logo.as_deref())
            .map_err(design_error)?;
        let packing = PageGeometry::a4(settings.orientation).pack(settings.cards_per_page);
        render_sheet(&packing, card.image())
            .encode_png()
            .map_err(internal_error)
    })
    .await
    .map_err(|e| internal_error(format!("Processing error: {}", e)))??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// Request body for the export endpoint. Unset fields use the stored settings.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub school_id: String,
    #[serde(default)]
    pub format: Option<ExportFormat>,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub cards_per_page: Option<usize>,
}

impl ExportRequest {
    fn settings(&self, stored: ExportSettings) -> ExportSettings {
        let mut settings = stored;
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(orientation) = self.orientation {
            settings.set_orientation(orientation);
        }
        if let Some(cards_per_page) = self.cards_per_page {
            settings.set_cards_per_page(cards_per_page);
        }
        settings
    }
}

/// POST /api/export - Run an export and return the artifact as an attachment.
pub async fn trigger(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.school_id.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "school_id is required"));
    }

    let job = request.settings(*state.settings.read().await).job();
    let snapshot = state.editor.read().await.snapshot();
    let export_id = Uuid::new_v4();

    let artifact = state
        .exporter
        .export(&job, snapshot, &request.school_id, CancellationToken::new())
        .instrument(tracing::info_span!("export", %export_id))
        .await
        .map_err(export_error)?;

    Ok((
        [
            (header::CONTENT_TYPE, artifact.mime_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        artifact.bytes,
    ))
}

/// POST /api/export/cancel - Cancel the running export, if any.
pub async fn cancel(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cancelled = state.exporter.cancel();
    Json(serde_json::json!({
        "success": true,
        "cancelled": cancelled,
    }))
}
