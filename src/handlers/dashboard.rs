//! Student dashboard
//!
//! Loads everything concurrently. A failed part is reported in `warnings` and the rest
//! still renders.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde::Serialize;

use super::assignments::AssignmentView;
use super::middleware::StudentToken;
use super::programs::display_name;
use super::{backend_failure, load_warning, AppState};
use crate::backend::BackendError;
use crate::models::*;
use crate::policy::modules::progress_percent;
use crate::policy::onboarding::OnboardingStep;
use crate::policy::sessions::{classify, ClassifiedSession};

/// Upcoming sessions shown on the dashboard
const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSummary {
    pub enrollment_id: String,
    pub name: String,
    pub progress: u8,
    pub batch_name: Option<String>,
    pub mentor_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingSummary {
    pub complete: bool,
    pub pending_steps: Vec<OnboardingStep>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub programs: Vec<ProgramSummary>,
    pub average_progress: u8,
    pub today_sessions: Vec<ClassifiedSession>,
    pub upcoming_sessions: Vec<ClassifiedSession>,
    pub pending_assignments: Vec<AssignmentView>,
    /// Absent when the enrollment could not be read
    pub onboarding: Option<OnboardingSummary>,
    pub warnings: Vec<String>,
}

/// Keep the value, or record a warning and fall back to empty
fn or_warn<T: Default>(
    result: Result<T, BackendError>,
    what: &str,
    warnings: &mut Vec<String>,
) -> T {
    result.unwrap_or_else(|e| {
        warnings.push(load_warning(what, &e));
        T::default()
    })
}

/// Dashboard overview
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
) -> impl IntoResponse {
    let (programs, sessions, assignments, enrollment) = tokio::join!(
        state.backend.get_programs(&token),
        state.backend.get_sessions(&token),
        state.backend.get_assignments(&token),
        state.backend.get_my_enrollment(&token)
    );

    // An expired token fails every part; report it instead of an empty page
    if let Err(e) = &enrollment {
        if e.status_code() == StatusCode::UNAUTHORIZED {
            return backend_failure(e);
        }
    }

    let mut warnings = Vec::new();
    let programs = or_warn(programs, "programs", &mut warnings);
    let sessions = or_warn(sessions, "sessions", &mut warnings);
    let assignments = or_warn(assignments, "assignments", &mut warnings);
    let onboarding = match enrollment {
        Ok(enrollment) => Some(OnboardingSummary {
            complete: enrollment.is_onboarding_complete(),
            pending_steps: enrollment.pending_steps(),
        }),
        Err(e) => {
            warnings.push(load_warning("onboarding status", &e));
            None
        }
    };

    let programs: Vec<ProgramSummary> = programs
        .into_iter()
        .map(|p| ProgramSummary {
            progress: progress_percent(&p.modules),
            enrollment_id: p.enrollment_id,
            name: display_name(&p.program),
            batch_name: p.batch.map(|b| b.name),
            mentor_name: p.mentor.map(|m| m.name),
        })
        .collect();
    let average_progress = if programs.is_empty() {
        0
    } else {
        let total: u32 = programs.iter().map(|p| u32::from(p.progress)).sum();
        (f64::from(total) / programs.len() as f64).round() as u8
    };

    let buckets = classify(
        sessions,
        Utc::now(),
        state.display_offset,
        state.default_session_minutes,
    );
    let mut upcoming_sessions = buckets.upcoming;
    upcoming_sessions.truncate(UPCOMING_LIMIT);

    let pending_assignments = assignments
        .into_iter()
        .filter(|a| matches!(a.status, AssignmentStatus::Pending | AssignmentStatus::Overdue))
        .map(AssignmentView::from)
        .collect();

    let response = DashboardResponse {
        programs,
        average_progress,
        today_sessions: buckets.today,
        upcoming_sessions,
        pending_assignments,
        onboarding,
        warnings,
    };
    (StatusCode::OK, Json(ApiResponse::success(response)))
}
