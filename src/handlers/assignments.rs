//! Assignment listing

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::middleware::StudentToken;
use super::{backend_failure, load_warning, AppState, Gated};
use crate::models::*;
use crate::policy::modules::difficulty;
use crate::policy::onboarding::gate;

#[derive(Debug, Deserialize)]
pub struct AssignmentsQuery {
    pub status: Option<AssignmentStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub difficulty: Difficulty,
}

impl From<Assignment> for AssignmentView {
    fn from(assignment: Assignment) -> Self {
        Self {
            difficulty: difficulty(assignment.max_marks),
            assignment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssignmentsResponse {
    pub assignments: Vec<AssignmentView>,
    pub warnings: Vec<String>,
}

/// List assignments once onboarding is complete
pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
    Query(query): Query<AssignmentsQuery>,
) -> impl IntoResponse {
    let (enrollment, assignments) = tokio::join!(
        state.backend.get_my_enrollment(&token),
        state.backend.get_assignments(&token)
    );

    let access = gate(enrollment.as_ref());
    if !access.is_granted() {
        return (
            StatusCode::OK,
            Json(ApiResponse::success(Gated {
                access,
                content: None,
            })),
        );
    }

    let mut warnings = Vec::new();
    let assignments = match assignments {
        Ok(list) => list,
        Err(e) if e.status_code() == StatusCode::UNAUTHORIZED => return backend_failure(&e),
        Err(e) => {
            warnings.push(load_warning("assignments", &e));
            Vec::new()
        }
    };

    let assignments = assignments
        .into_iter()
        .filter(|a| query.status.map_or(true, |s| a.status == s))
        .map(AssignmentView::from)
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(Gated {
            access,
            content: Some(AssignmentsResponse {
                assignments,
                warnings,
            }),
        })),
    )
}
