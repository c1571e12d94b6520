//! Enrollment wizard: batch confirmation and onboarding status

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Serialize;

use super::middleware::StudentToken;
use super::{backend_failure, load_warning, validation_failure, AppState};
use crate::models::*;
use crate::policy::onboarding::OnboardingStep;
use crate::validation::{validate_confirm_batch, ConfirmBatchInput};

#[derive(Debug, Serialize)]
pub struct BatchesResponse {
    pub batches: Vec<Batch>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub enrollment_id: String,
    pub batch_id: Option<String>,
    pub batch_confirmed: bool,
    pub mentor_id: Option<String>,
    pub complete: bool,
    pub current_step: Option<OnboardingStep>,
    pub pending_steps: Vec<OnboardingStep>,
    pub suggested_mentors: Vec<Mentor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Enrollment> for OnboardingStatus {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            complete: enrollment.is_onboarding_complete(),
            current_step: enrollment.current_step(),
            pending_steps: enrollment.pending_steps(),
            enrollment_id: enrollment.id,
            batch_id: enrollment.batch_id,
            batch_confirmed: enrollment.batch_confirmed,
            mentor_id: enrollment.mentor_id,
            suggested_mentors: enrollment.suggested_mentors,
            message: None,
        }
    }
}

/// Current onboarding state
pub async fn get_onboarding(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
) -> impl IntoResponse {
    match state.backend.get_my_enrollment(&token).await {
        Ok(enrollment) => (
            StatusCode::OK,
            Json(ApiResponse::success(OnboardingStatus::from(enrollment))),
        ),
        Err(e) => backend_failure(&e),
    }
}

/// Batches the student can still join
pub async fn list_batches(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
) -> impl IntoResponse {
    let response = match state.backend.get_available_batches(&token).await {
        Ok(batches) => BatchesResponse {
            batches,
            warnings: Vec::new(),
        },
        Err(e) if e.status_code() == StatusCode::UNAUTHORIZED => return backend_failure(&e),
        Err(e) => BatchesResponse {
            batches: Vec::new(),
            warnings: vec![load_warning("available batches", &e)],
        },
    };
    (StatusCode::OK, Json(ApiResponse::success(response)))
}

/// Confirm a batch, then reload the enrollment
pub async fn confirm_batch(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
    Json(input): Json<ConfirmBatchInput>,
) -> impl IntoResponse {
    if let Err(e) = validate_confirm_batch(&input) {
        return validation_failure(&e);
    }

    let message = match state.backend.confirm_batch(&token, &input.batch_id).await {
        Ok(message) => message,
        Err(e) => return backend_failure(&e),
    };
    tracing::info!("Batch {} confirmed", input.batch_id);

    refreshed_status(&state, &token, message).await
}

/// Reload the enrollment after a mutation and report the new onboarding state
pub(crate) async fn refreshed_status(
    state: &AppState,
    token: &str,
    message: Option<String>,
) -> (StatusCode, Json<ApiResponse<OnboardingStatus>>) {
    match state.backend.get_my_enrollment(token).await {
        Ok(enrollment) => {
            let mut status = OnboardingStatus::from(enrollment);
            status.message = message;
            (StatusCode::OK, Json(ApiResponse::success(status)))
        }
        Err(e) => {
            tracing::error!("Enrollment reload after update failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::error(
                    "Your change was saved but could not be reloaded. Please refresh.",
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::fake::FakeState;
    use crate::handlers::test_support::{app, call};
    use axum::http::StatusCode;
    use serde_json::json;

    fn fresh() -> FakeState {
        FakeState {
            enrollment: json!({
                "id": "enr-1",
                "batchId": null,
                "batchConfirmed": false,
                "mentorId": null,
                "isOnboardingComplete": true,
                "suggestedMentors": [{"id": "m1", "name": "Ada"}]
            }),
            batches: json!([{"id": "batch-7", "name": "October cohort"}]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_status_is_derived_not_stored() {
        let (router, _) = app(fresh()).await;

        let (status, body) = call(&router, "GET", "/api/onboarding", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["complete"], false);
        assert_eq!(body["data"]["currentStep"], "CONFIRM_BATCH");
        assert_eq!(body["data"]["suggestedMentors"][0]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_confirm_batch_then_refetch() {
        let (router, shared) = app(fresh()).await;

        let (status, body) = call(
            &router,
            "POST",
            "/api/onboarding/confirm-batch",
            Some(json!({"batchId": "batch-7"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["batchConfirmed"], true);
        assert_eq!(body["data"]["batchId"], "batch-7");
        assert_eq!(body["data"]["currentStep"], "SELECT_MENTOR");
        assert_eq!(body["data"]["message"], "Batch confirmed");
        assert_eq!(shared.lock().unwrap().calls.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_batch_surfaces_message() {
        let (router, _) = app(fresh()).await;

        let (status, body) = call(
            &router,
            "POST",
            "/api/onboarding/confirm-batch",
            Some(json!({"batchId": "full-batch"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Batch is full");
    }

    #[tokio::test]
    async fn test_invalid_batch_id_never_reaches_backend() {
        let (router, shared) = app(fresh()).await;

        let (status, _) = call(
            &router,
            "POST",
            "/api/onboarding/confirm-batch",
            Some(json!({"batchId": "batch 7; drop"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(shared.lock().unwrap().calls.is_empty());
    }

    #[tokio::test]
    async fn test_batches_listed() {
        let (router, _) = app(fresh()).await;

        let (status, body) = call(&router, "GET", "/api/onboarding/batches", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["batches"][0]["id"], "batch-7");
    }

    #[tokio::test]
    async fn test_batches_failure_renders_empty_with_warning() {
        let mut state = fresh();
        state.failing = vec!["batches"];
        let (router, _) = app(state).await;

        let (status, body) = call(&router, "GET", "/api/onboarding/batches", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["batches"].as_array().unwrap().is_empty());
        assert_eq!(body["data"]["warnings"].as_array().unwrap().len(), 1);
    }
}
