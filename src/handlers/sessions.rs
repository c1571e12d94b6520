//! Live classes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::middleware::StudentToken;
use super::{backend_failure, load_warning, AppState, Gated};
use crate::models::ApiResponse;
use crate::policy::onboarding::gate;
use crate::policy::sessions::{classify, ClassifiedSession, SessionView};

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    #[serde(default)]
    pub view: SessionView,
}

#[derive(Debug, Serialize)]
pub struct SessionCounts {
    pub upcoming: usize,
    pub today: usize,
    pub past: usize,
    pub all: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<ClassifiedSession>,
    pub counts: SessionCounts,
    pub warnings: Vec<String>,
}

/// Sessions for one view (upcoming, today, past, all) once onboarding is complete
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
    Query(query): Query<SessionsQuery>,
) -> impl IntoResponse {
    let (enrollment, sessions) = tokio::join!(
        state.backend.get_my_enrollment(&token),
        state.backend.get_sessions(&token)
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
    let sessions = match sessions {
        Ok(list) => list,
        Err(e) if e.status_code() == StatusCode::UNAUTHORIZED => return backend_failure(&e),
        Err(e) => {
            warnings.push(load_warning("sessions", &e));
            Vec::new()
        }
    };

    let buckets = classify(
        sessions,
        Utc::now(),
        state.display_offset,
        state.default_session_minutes,
    );
    let counts = SessionCounts {
        upcoming: buckets.upcoming.len(),
        today: buckets.today.len(),
        past: buckets.past.len(),
        all: buckets.all.len(),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(Gated {
            access,
            content: Some(SessionsResponse {
                sessions: buckets.into_view(query.view),
                counts,
                warnings,
            }),
        })),
    )
}

#[cfg(test)]
mod tests {
    use crate::backend::fake::FakeState;
    use crate::handlers::test_support::{app, call};
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn onboarded() -> serde_json::Value {
        json!({"id": "enr-1", "batchConfirmed": true, "mentorId": "m1"})
    }

    fn sessions() -> serde_json::Value {
        let now = Utc::now();
        json!([
            {"id": "next", "status": "SCHEDULED", "scheduledDate": now + Duration::days(3)},
            {"id": "old", "status": "COMPLETED", "scheduledDate": now - Duration::days(3), "recordingUrl": "https://rec/1"},
            {"id": "live", "status": "ONGOING", "scheduledDate": now - Duration::minutes(30)}
        ])
    }

    #[tokio::test]
    async fn test_default_view_is_upcoming() {
        let (router, _) = app(FakeState {
            enrollment: onboarded(),
            sessions: sessions(),
            ..Default::default()
        })
        .await;

        let (status, body) = call(&router, "GET", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        let content = &body["data"]["content"];
        let ids: Vec<&str> = content["sessions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["live", "next"]);
        assert_eq!(content["counts"]["all"], 3);
        assert!(content["sessions"][0]["endsAt"].is_string());
    }

    #[tokio::test]
    async fn test_past_view() {
        let (router, _) = app(FakeState {
            enrollment: onboarded(),
            sessions: sessions(),
            ..Default::default()
        })
        .await;

        let (_, body) = call(&router, "GET", "/api/sessions?view=past", None).await;
        let list = body["data"]["content"]["sessions"].as_array().unwrap();
        // The ongoing session started half an hour ago, so it is also past
        let ids: Vec<&str> = list.iter().map(|s| s["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["live", "old"]);
        assert_eq!(list[1]["recordingUrl"], "https://rec/1");
    }

    #[tokio::test]
    async fn test_sessions_failure_renders_empty_state() {
        let (router, _) = app(FakeState {
            enrollment: onboarded(),
            failing: vec!["sessions"],
            ..Default::default()
        })
        .await;

        let (status, body) = call(&router, "GET", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::OK);
        let content = &body["data"]["content"];
        assert!(content["sessions"].as_array().unwrap().is_empty());
        assert_eq!(content["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blocked_without_batch() {
        let (router, _) = app(FakeState {
            enrollment: json!({"id": "enr-1", "batchConfirmed": false, "mentorId": null}),
            sessions: sessions(),
            ..Default::default()
        })
        .await;

        let (_, body) = call(&router, "GET", "/api/sessions", None).await;
        assert_eq!(body["data"]["access"], "blocked");
        assert_eq!(
            body["data"]["pendingSteps"],
            json!(["CONFIRM_BATCH", "SELECT_MENTOR"])
        );
    }

    #[tokio::test]
    async fn test_enrollment_failure_grants_access() {
        let (router, _) = app(FakeState {
            failing: vec!["enrollment"],
            sessions: sessions(),
            ..Default::default()
        })
        .await;

        let (status, body) = call(&router, "GET", "/api/sessions?view=all", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["access"], "granted");
        assert_eq!(body["data"]["failOpen"], true);
        assert_eq!(body["data"]["content"]["sessions"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_odd_call_records_keep_gate_closed() {
        let (router, _) = app(FakeState {
            enrollment: json!({
                "id": "enr-1",
                "batchConfirmed": true,
                "mentorId": null,
                "bookedCalls": [{"id": "c1", "mentorId": "m1", "status": "NO_SHOW"}, null]
            }),
            sessions: sessions(),
            ..Default::default()
        })
        .await;

        let (_, body) = call(&router, "GET", "/api/sessions", None).await;
        assert_eq!(body["data"]["access"], "blocked");
        assert_eq!(body["data"]["pendingSteps"], json!(["SELECT_MENTOR"]));
        assert!(body["data"].get("content").is_none());
    }
}
