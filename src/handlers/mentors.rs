//! Mentor browsing, call requests and mentor selection
//!
//! Every mutation is checked against the current enrollment, forwarded once, and
//! followed by a fresh enrollment read. No state is patched locally.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::middleware::StudentToken;
use super::onboarding::{refreshed_status, OnboardingStatus};
use super::{
    backend_failure, load_warning, optional_json, selection_failure, validation_failure,
    AppState,
};
use crate::models::*;
use crate::policy::calls::{call_info, calls_for_mentor};
use crate::policy::selection::{
    allowed_actions, check_request_call, check_revoke_mentor, check_select_mentor, engagement,
    AllowedActions, MentorEngagement,
};
use crate::validation::{validate_id, validate_request_call, RequestCallInput, RevokeMentorInput};

/// Where the web client goes after a mentor is chosen
const MY_MENTOR_ROUTE: &str = "/mentors/mine";

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorView {
    #[serde(flatten)]
    pub mentor: Mentor,
    pub suggested: bool,
    /// Absent when the enrollment could not be read
    pub engagement: Option<MentorEngagement>,
    pub actions: AllowedActions,
    pub latest_call: Option<Call>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorsResponse {
    pub mentors: Vec<MentorView>,
    pub selected_mentor_id: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementUpdate {
    pub mentor_id: String,
    pub engagement: MentorEngagement,
    pub actions: AllowedActions,
    pub latest_call: Option<Call>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyMentorResponse {
    pub mentor_id: Option<String>,
    pub mentor: Option<Mentor>,
    /// Call history with the mentor, newest first
    pub calls: Vec<Call>,
    pub next_call: Option<Call>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Suggested mentors first in their given order, then the remaining ones
fn build_mentor_views(enrollment: &Enrollment, all: Vec<Mentor>) -> Vec<MentorView> {
    let mut views: Vec<MentorView> = Vec::new();
    let suggested = enrollment.suggested_mentors.iter().cloned().map(|m| (m, true));
    let rest = all.into_iter().map(|m| (m, false));

    for (mentor, is_suggested) in suggested.chain(rest) {
        if views.iter().any(|v| v.mentor.id == mentor.id) {
            continue;
        }
        views.push(MentorView {
            suggested: is_suggested,
            engagement: Some(engagement(enrollment, &mentor.id)),
            actions: allowed_actions(enrollment, &mentor.id),
            latest_call: call_info(&enrollment.booked_calls, &mentor.id).cloned(),
            mentor,
        });
    }
    views
}

/// Directory without enrollment context; nothing can be acted on
fn directory_views(all: Vec<Mentor>) -> Vec<MentorView> {
    all.into_iter()
        .map(|mentor| MentorView {
            mentor,
            suggested: false,
            engagement: None,
            actions: AllowedActions {
                request_call: false,
                select: false,
                revoke: false,
            },
            latest_call: None,
        })
        .collect()
}

fn build_my_mentor(enrollment: &Enrollment, mentors: &[Mentor], now: DateTime<Utc>) -> MyMentorResponse {
    let Some(mentor_id) = enrollment.mentor_id.clone() else {
        return MyMentorResponse {
            mentor_id: None,
            mentor: None,
            calls: Vec::new(),
            next_call: None,
            redirect: None,
            message: None,
        };
    };

    let mentor = enrollment
        .suggested_mentors
        .iter()
        .chain(mentors.iter())
        .find(|m| m.id == mentor_id)
        .cloned();

    let calls: Vec<Call> = calls_for_mentor(&enrollment.booked_calls, &mentor_id)
        .into_iter()
        .cloned()
        .collect();
    let next_call = calls
        .iter()
        .filter(|c| c.status == CallStatus::Scheduled && c.scheduled_date.is_some_and(|d| d > now))
        .min_by_key(|c| c.scheduled_date)
        .cloned();

    MyMentorResponse {
        mentor_id: Some(mentor_id),
        mentor,
        calls,
        next_call,
        redirect: None,
        message: None,
    }
}

fn engagement_update(enrollment: &Enrollment, mentor_id: &str, message: Option<String>) -> EngagementUpdate {
    EngagementUpdate {
        mentor_id: mentor_id.to_string(),
        engagement: engagement(enrollment, mentor_id),
        actions: allowed_actions(enrollment, mentor_id),
        latest_call: call_info(&enrollment.booked_calls, mentor_id).cloned(),
        message,
    }
}

// =============================================================================
// Read Endpoints
// =============================================================================

/// Mentors with their engagement state for this student
pub async fn list_mentors(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
) -> impl IntoResponse {
    let (enrollment, mentors) = tokio::join!(
        state.backend.get_my_enrollment(&token),
        state.backend.get_mentors(&token)
    );

    if let Err(e) = &enrollment {
        if e.status_code() == StatusCode::UNAUTHORIZED {
            return backend_failure(e);
        }
    }

    let mut warnings = Vec::new();
    let mentors = match mentors {
        Ok(list) => list,
        Err(e) => {
            // Suggested mentors from the enrollment still render
            warnings.push(load_warning("the mentor directory", &e));
            Vec::new()
        }
    };

    let response = match enrollment {
        Ok(enrollment) => MentorsResponse {
            mentors: build_mentor_views(&enrollment, mentors),
            selected_mentor_id: enrollment.mentor_id,
            warnings,
        },
        Err(e) => {
            warnings.push(load_warning("your enrollment", &e));
            MentorsResponse {
                mentors: directory_views(mentors),
                selected_mentor_id: None,
                warnings,
            }
        }
    };
    (StatusCode::OK, Json(ApiResponse::success(response)))
}

/// The selected mentor with call logs and notes
pub async fn get_my_mentor(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
) -> impl IntoResponse {
    let (enrollment, mentors) = tokio::join!(
        state.backend.get_my_enrollment(&token),
        state.backend.get_mentors(&token)
    );

    let enrollment = match enrollment {
        Ok(e) => e,
        Err(e) => return backend_failure(&e),
    };
    let mentors = mentors.unwrap_or_else(|e| {
        tracing::warn!("Mentor directory unavailable: {}", e);
        Vec::new()
    });

    (
        StatusCode::OK,
        Json(ApiResponse::success(build_my_mentor(
            &enrollment,
            &mentors,
            Utc::now(),
        ))),
    )
}

// =============================================================================
// Mutation Endpoints
// =============================================================================

/// Ask a mentor for an introductory call
pub async fn request_call(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
    Path(mentor_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<RequestCallInput>, JsonRejection>,
) -> impl IntoResponse {
    if let Err(e) = validate_id("mentorId", &mentor_id) {
        return validation_failure(&e);
    }
    let input = match optional_json(&headers, body) {
        Ok(input) => input,
        Err(e) => return validation_failure(&e),
    };
    if let Err(e) = validate_request_call(&input, Utc::now()) {
        return validation_failure(&e);
    }

    let enrollment = match state.backend.get_my_enrollment(&token).await {
        Ok(e) => e,
        Err(e) => return backend_failure(&e),
    };
    if let Err(e) = check_request_call(&enrollment, &mentor_id) {
        return selection_failure(&e);
    }

    let message = match state
        .backend
        .book_mentor_call(
            &token,
            &mentor_id,
            input.reason.as_deref(),
            input.preferred_date,
        )
        .await
    {
        Ok(message) => message,
        Err(e) => return backend_failure(&e),
    };
    tracing::info!("Call requested with mentor {} for enrollment {}", mentor_id, enrollment.id);

    match state.backend.get_my_enrollment(&token).await {
        Ok(enrollment) => (
            StatusCode::OK,
            Json(ApiResponse::success(engagement_update(
                &enrollment,
                &mentor_id,
                message,
            ))),
        ),
        Err(e) => {
            tracing::error!("Enrollment reload after call request failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::error(
                    "Your call was requested but could not be reloaded. Please refresh.",
                )),
            )
        }
    }
}

/// Choose a mentor after a completed call
pub async fn select_mentor(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
    Path(mentor_id): Path<String>,
) -> impl IntoResponse {
    if let Err(e) = validate_id("mentorId", &mentor_id) {
        return validation_failure(&e);
    }

    let enrollment = match state.backend.get_my_enrollment(&token).await {
        Ok(e) => e,
        Err(e) => return backend_failure(&e),
    };
    if let Err(e) = check_select_mentor(&enrollment, &mentor_id) {
        return selection_failure(&e);
    }

    let message = match state.backend.select_mentor(&token, &mentor_id).await {
        Ok(message) => message,
        Err(e) => return backend_failure(&e),
    };
    tracing::info!("Mentor {} selected for enrollment {}", mentor_id, enrollment.id);

    let (enrollment, mentors) = tokio::join!(
        state.backend.get_my_enrollment(&token),
        state.backend.get_mentors(&token)
    );
    match enrollment {
        Ok(enrollment) => {
            let mentors = mentors.unwrap_or_else(|e| {
                tracing::warn!("Mentor directory unavailable: {}", e);
                Vec::new()
            });
            let mut response = build_my_mentor(&enrollment, &mentors, Utc::now());
            response.redirect = Some(MY_MENTOR_ROUTE.to_string());
            response.message = message;
            (StatusCode::OK, Json(ApiResponse::success(response)))
        }
        Err(e) => {
            tracing::error!("Enrollment reload after mentor selection failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::error(
                    "Your mentor was selected but could not be reloaded. Please refresh.",
                )),
            )
        }
    }
}

/// Give up the selected mentor; requires `{"confirm": true}`
pub async fn revoke_mentor(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
    headers: HeaderMap,
    body: Result<Json<RevokeMentorInput>, JsonRejection>,
) -> impl IntoResponse {
    let input = match optional_json(&headers, body) {
        Ok(input) => input,
        Err(e) => return validation_failure::<OnboardingStatus>(&e),
    };

    let enrollment = match state.backend.get_my_enrollment(&token).await {
        Ok(e) => e,
        Err(e) => return backend_failure::<OnboardingStatus>(&e),
    };
    if let Err(e) = check_revoke_mentor(&enrollment, input.confirm) {
        return selection_failure(&e);
    }

    let message = match state.backend.revoke_mentor(&token).await {
        Ok(message) => message,
        Err(e) => return backend_failure(&e),
    };
    tracing::info!(
        "Mentor {} revoked for enrollment {}",
        enrollment.mentor_id.as_deref().unwrap_or("-"),
        enrollment.id
    );

    refreshed_status(&state, &token, message).await
}
