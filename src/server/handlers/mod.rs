//! HTTP handlers for the server.

pub mod design;
pub mod export;

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

use crate::error::CarnetError;
use crate::export::ExportError;

/// Error response: a status with a `{"success": false, "error": ...}` body.
pub type ApiError = (StatusCode, Json<Value>);

pub fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(json!({
            "success": false,
            "error": message.to_string(),
        })),
    )
}

/// Design edits fail on bad input, never on the server.
pub fn design_error(err: CarnetError) -> ApiError {
    let status = match &err {
        CarnetError::UnknownElement(_) => StatusCode::NOT_FOUND,
        CarnetError::InvalidColor(_)
        | CarnetError::InvalidDesign(_)
        | CarnetError::Image(_)
        | CarnetError::Json(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err)
}

pub fn export_error(err: ExportError) -> ApiError {
    let status = match &err {
        ExportError::Busy | ExportError::Cancelled => StatusCode::CONFLICT,
        ExportError::Roster(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err)
}

pub fn internal_error(err: impl std::fmt::Display) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, err)
}
