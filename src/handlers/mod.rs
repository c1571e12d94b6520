//! HTTP request handlers

pub mod assignments;
pub mod dashboard;
pub mod mentors;
pub mod middleware;
pub mod onboarding;
pub mod programs;
pub mod sessions;

pub use assignments::*;
pub use dashboard::*;
pub use mentors::*;
pub use onboarding::*;
pub use programs::*;
pub use sessions::*;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use chrono::FixedOffset;
use serde::Serialize;

use crate::backend::{BackendClient, BackendError};
use crate::models::ApiResponse;
use crate::policy::onboarding::Access;
use crate::policy::selection::SelectionError;
use crate::validation::ValidationError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub default_session_minutes: u32,
    pub display_offset: FixedOffset,
    pub is_production: bool,
}

/// Content behind the onboarding gate
#[derive(Debug, Serialize)]
pub struct Gated<T> {
    #[serde(flatten)]
    pub access: Access,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<T>,
}

type Failure<T> = (StatusCode, Json<ApiResponse<T>>);

fn backend_failure<T>(e: &BackendError) -> Failure<T> {
    (e.status_code(), Json(ApiResponse::error(e.user_message())))
}

fn validation_failure<T>(e: &ValidationError) -> Failure<T> {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string())))
}

fn selection_failure<T>(e: &SelectionError) -> Failure<T> {
    let status = match e {
        SelectionError::ConfirmationRequired => StatusCode::BAD_REQUEST,
        _ => StatusCode::CONFLICT,
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

/// Body that may be left out entirely.
///
/// A request without a body reads as `T::default()`. A body that is sent must be
/// well-formed JSON with a JSON content type.
fn optional_json<T: Default>(
    headers: &HeaderMap,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ValidationError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) if !has_body(headers) => Ok(T::default()),
        Err(rejection) => Err(ValidationError::Invalid(rejection.body_text())),
    }
}

fn has_body(headers: &HeaderMap) -> bool {
    headers.contains_key(header::CONTENT_TYPE)
        || headers.contains_key(header::TRANSFER_ENCODING)
        || headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() != "0")
}

/// Warning shown when part of a view could not be loaded
fn load_warning(what: &str, e: &BackendError) -> String {
    tracing::error!("Failed to load {}: {}", what, e);
    format!("Could not load {}. Please refresh to try again.", what)
}
