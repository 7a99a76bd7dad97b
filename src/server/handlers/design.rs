//! Design editing and card preview handlers.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::card::{CardConfig, ConfigPatch, ElementPatch, Point};
use crate::render::mark_layout;

use super::super::state::AppState;
use super::{ApiError, api_error, design_error, internal_error};

/// Edits are refused while an export holds a snapshot of the design.
fn ensure_idle(state: &AppState) -> Result<(), ApiError> {
    if state.exporter.is_exporting() {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Design is locked while an export is running",
        ));
    }
    Ok(())
}

/// GET /api/design - Current design.
pub async fn get(State(state): State<Arc<AppState>>) -> Json<CardConfig> {
    Json(state.editor.read().await.config().clone())
}

/// PUT /api/design - Replace the whole design.
pub async fn replace(
    State(state): State<Arc<AppState>>,
    Json(config): Json<CardConfig>,
) -> Result<Json<CardConfig>, ApiError> {
    ensure_idle(&state)?;
    let mut editor = state.editor.write().await;
    editor.replace(config).map_err(design_error)?;
    Ok(Json(editor.config().clone()))
}

/// PATCH /api/design - Apply design panel changes.
pub async fn patch(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<ConfigPatch>,
) -> Result<Json<CardConfig>, ApiError> {
    ensure_idle(&state)?;
    let mut editor = state.editor.write().await;
    editor.apply_config(&patch).map_err(design_error)?;
    Ok(Json(editor.config().clone()))
}

/// POST /api/design/elements/:id/move - Move an element; returns the clamped origin.
pub async fn move_element(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(to): Json<Point>,
) -> Result<Json<Point>, ApiError> {
    ensure_idle(&state)?;
    let mut editor = state.editor.write().await;
    let placed = editor.move_element(&id, to.x, to.y).map_err(design_error)?;
    Ok(Json(placed))
}

/// PATCH /api/design/elements/:id - Update one element's properties.
pub async fn patch_element(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ElementPatch>,
) -> Result<Json<CardConfig>, ApiError> {
    ensure_idle(&state)?;
    let mut editor = state.editor.write().await;
    editor.update_element(&id, &patch).map_err(design_error)?;
    Ok(Json(editor.config().clone()))
}

/// One pointer event of a drag gesture, in canvas units.
#[derive(Debug, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum DragEvent {
    Start { id: String, x: f32, y: f32 },
    Move { x: f32, y: f32 },
    End,
}

#[derive(Debug, Serialize)]
pub struct DragResponse {
    pub dragging: bool,
    /// Origin of the dragged element after a move.
    pub position: Option<Point>,
}

/// POST /api/design/drag - Drive a drag gesture.
pub async fn drag(
    State(state): State<Arc<AppState>>,
    Json(event): Json<DragEvent>,
) -> Result<Json<DragResponse>, ApiError> {
    ensure_idle(&state)?;
    let mut editor = state.editor.write().await;
    let position = match event {
        DragEvent::Start { id, x, y } => {
            editor
                .begin_drag(&id, Point::new(x, y))
                .map_err(design_error)?;
            None
        }
        DragEvent::Move { x, y } => editor.drag_to(Point::new(x, y)),
        DragEvent::End => {
            editor.end_drag();
            None
        }
    };
    Ok(Json(DragResponse {
        dragging: editor.is_dragging(),
        position,
    }))
}

/// POST /api/design/logo - Upload a logo image (multipart field `logo`).
pub async fn upload_logo(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<CardConfig>, ApiError> {
    ensure_idle(&state)?;

    let mut logo: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("logo") {
            let bytes = field.bytes().await.map_err(|e| {
                api_error(StatusCode::BAD_REQUEST, format!("Failed to read logo: {}", e))
            })?;
            logo = Some(bytes.to_vec());
            break;
        }
    }
    let bytes = logo.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No logo field found"))?;

    let mut editor = state.editor.write().await;
    editor.set_logo_bytes(&bytes).map_err(design_error)?;
    tracing::info!(bytes = bytes.len(), "Logo replaced");
    Ok(Json(editor.config().clone()))
}

/// Query of the preview endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PreviewQuery {
    /// Mark element boxes for arranging.
    pub layout: bool,
    /// Draw the alignment grid (layout mode only).
    pub grid: bool,
}

/// GET /api/design/preview - Card preview PNG, optionally in layout mode.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.editor.read().await.snapshot();
    let logo = state.renderer.load_logo(&snapshot).await;
    let renderer = state.renderer.clone();
    let qr = state.qr.clone();

    let png_bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let mut surface = renderer
            .draw_preview(&snapshot, qr.as_ref(), logo.as_deref())
            .map_err(design_error)?;
        if query.layout {
            mark_layout(&mut surface, &snapshot, query.grid);
        }
        surface.encode_png().map_err(internal_error)
    })
    .await
    .map_err(|e| internal_error(format!("Processing error: {}", e)))??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}
