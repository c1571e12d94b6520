//! Client for the upstream student REST API
//!
//! Reads are retried on transient failures. Mutations are sent exactly once; callers
//! refetch the enrollment afterwards instead of patching local state.

mod error;

pub use error::BackendError;

use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::models::*;

const PROGRAMS_PATH: &str = "/api/students/programs";
const SESSIONS_PATH: &str = "/api/students/sessions";
const ASSIGNMENTS_PATH: &str = "/api/students/assignments";
const ENROLLMENT_PATH: &str = "/api/students/enrollment";
const MENTORS_PATH: &str = "/api/students/mentors";
const BATCHES_PATH: &str = "/api/students/batches";
const CONFIRM_BATCH_PATH: &str = "/api/students/enrollment/confirm-batch";
const SELECT_MENTOR_PATH: &str = "/api/students/enrollment/select-mentor";
const REVOKE_MENTOR_PATH: &str = "/api/students/enrollment/revoke-mentor";
const BOOK_CALL_PATH: &str = "/api/students/mentors/book-call";

/// Pause before a retry; jitter is added on top
const RETRY_BASE_DELAY_MS: u64 = 200;
const RETRY_JITTER_MS: u64 = 100;

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    retry_attempts: u32,
}

/// Create the upstream client from configuration
pub fn create_client(config: &Config) -> Result<BackendClient, BackendError> {
    let http = Client::builder()
        .timeout(Duration::from_secs(config.backend_timeout_secs))
        .connect_timeout(Duration::from_secs(config.backend_timeout_secs.min(5)))
        .build()?;

    Ok(BackendClient {
        http,
        base_url: config.backend_url.trim_end_matches('/').to_string(),
        retry_attempts: config.backend_retry_attempts,
    })
}

impl BackendClient {
    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_programs(&self, token: &str) -> Result<Vec<ProgramEnrollment>, BackendError> {
        let payload: ProgramsPayload = self.get(PROGRAMS_PATH, token).await?;
        Ok(payload.programs)
    }

    pub async fn get_sessions(&self, token: &str) -> Result<Vec<Session>, BackendError> {
        let payload: SessionsPayload = self.get(SESSIONS_PATH, token).await?;
        Ok(payload.sessions)
    }

    pub async fn get_assignments(&self, token: &str) -> Result<Vec<Assignment>, BackendError> {
        let payload: AssignmentsPayload = self.get(ASSIGNMENTS_PATH, token).await?;
        Ok(payload.assignments)
    }

    pub async fn get_my_enrollment(&self, token: &str) -> Result<Enrollment, BackendError> {
        let payload: EnrollmentPayload = self.get(ENROLLMENT_PATH, token).await?;
        Ok(payload.enrollment)
    }

    pub async fn get_mentors(&self, token: &str) -> Result<Vec<Mentor>, BackendError> {
        let payload: MentorsPayload = self.get(MENTORS_PATH, token).await?;
        Ok(payload.mentors)
    }

    pub async fn get_available_batches(&self, token: &str) -> Result<Vec<Batch>, BackendError> {
        let payload: BatchesPayload = self.get(BATCHES_PATH, token).await?;
        Ok(payload.batches)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn confirm_batch(
        &self,
        token: &str,
        batch_id: &str,
    ) -> Result<Option<String>, BackendError> {
        self.post(CONFIRM_BATCH_PATH, token, &ConfirmBatchBody { batch_id })
            .await
    }

    pub async fn select_mentor(
        &self,
        token: &str,
        mentor_id: &str,
    ) -> Result<Option<String>, BackendError> {
        self.post(SELECT_MENTOR_PATH, token, &SelectMentorBody { mentor_id })
            .await
    }

    pub async fn revoke_mentor(&self, token: &str) -> Result<Option<String>, BackendError> {
        self.post(REVOKE_MENTOR_PATH, token, &serde_json::json!({}))
            .await
    }

    pub async fn book_mentor_call(
        &self,
        token: &str,
        mentor_id: &str,
        reason: Option<&str>,
        preferred_date: Option<DateTime<Utc>>,
    ) -> Result<Option<String>, BackendError> {
        let body = BookCallBody {
            mentor_id,
            reason,
            preferred_date,
        };
        self.post(BOOK_CALL_PATH, token, &body).await
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn request(&self, builder: RequestBuilder, token: &str, request_id: &str) -> RequestBuilder {
        builder.bearer_auth(token).header("x-request-id", request_id)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();
        let mut attempt = 0;

        loop {
            let result = match self
                .request(self.http.get(&url), token, &request_id)
                .send()
                .await
            {
                Ok(resp) => read_data(resp).await,
                Err(e) => Err(BackendError::from(e)),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY_MS + rand::thread_rng().gen_range(0..=RETRY_JITTER_MS);
                    tracing::warn!(
                        "GET {} failed ({}), retry {}/{} in {}ms",
                        path,
                        e,
                        attempt,
                        self.retry_attempts,
                        delay
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    tracing::error!("GET {} failed: {}", path, e);
                    return Err(e);
                }
                Ok(data) => return Ok(data),
            }
        }
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<Option<String>, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();

        let resp = self
            .request(self.http.post(&url), token, &request_id)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("POST {} failed: {}", path, e);
                BackendError::from(e)
            })?;

        let message = read_ack(resp).await.map_err(|e| {
            tracing::warn!("POST {} not accepted: {}", path, e);
            e
        })?;
        tracing::info!("POST {} accepted", path);
        Ok(message)
    }
}

// =============================================================================
// Envelope decoding
// =============================================================================

/// Decode the envelope, mapping HTTP failures and `success: false` to errors
async fn read_envelope<T: DeserializeOwned>(
    resp: Response,
) -> Result<BackendEnvelope<T>, BackendError> {
    let status = resp.status();
    let body = resp.text().await?;

    if status.is_server_error() || status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(BackendError::Status {
            status: status.as_u16(),
            message: body,
        });
    }

    let envelope: BackendEnvelope<T> = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(BackendError::Malformed(e.to_string())),
        Err(_) => {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: body,
            })
        }
    };

    if !envelope.success {
        return Err(BackendError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| "Request was rejected".to_string()),
        ));
    }
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            message: envelope.message.unwrap_or_default(),
        });
    }
    Ok(envelope)
}

async fn read_data<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
    read_envelope::<T>(resp)
        .await?
        .data
        .ok_or_else(|| BackendError::Malformed("missing data".to_string()))
}

async fn read_ack(resp: Response) -> Result<Option<String>, BackendError> {
    Ok(read_envelope::<serde_json::Value>(resp).await?.message)
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-process stand-in for the student API

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::BackendClient;
    use crate::config::Config;

    pub const TOKEN: &str = "student-token";

    /// Longer than the client timeout in `Config::for_tests`
    const SLOW_RESPONSE: Duration = Duration::from_millis(1500);

    #[derive(Default)]
    pub struct FakeState {
        pub enrollment: Value,
        pub programs: Value,
        pub sessions: Value,
        pub assignments: Value,
        pub mentors: Value,
        pub batches: Value,
        /// Endpoints answering 500
        pub failing: Vec<&'static str>,
        /// Remaining 503 answers on GET /sessions before it recovers
        pub sessions_flaky: u32,
        /// Reads that answer only after the client has given up
        pub slow: Vec<&'static str>,
        /// Remaining 503 answers on POST /mentors/book-call
        pub booking_flaky: u32,
        /// Every read served, in order
        pub hits: Vec<&'static str>,
        pub calls: Vec<(String, Value)>,
    }

    pub type Shared = Arc<Mutex<FakeState>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {}", TOKEN))
    }

    fn read(state: &Shared, headers: &HeaderMap, name: &'static str) -> (StatusCode, Json<Value>) {
        if !authorized(headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({"success": false})));
        }
        let mut s = state.lock().unwrap();
        if s.failing.contains(&name) {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"success": false})));
        }
        if name == "sessions" && s.sessions_flaky > 0 {
            s.sessions_flaky -= 1;
            return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"success": false})));
        }
        let data = match name {
            "enrollment" => json!({"enrollment": s.enrollment}),
            "programs" => json!({"programs": s.programs}),
            "sessions" => json!({"sessions": s.sessions}),
            "assignments" => json!({"assignments": s.assignments}),
            "mentors" => json!({"mentors": s.mentors}),
            _ => json!({"batches": s.batches}),
        };
        (StatusCode::OK, Json(json!({"success": true, "data": data})))
    }

    async fn serve_read(
        state: Shared,
        headers: HeaderMap,
        name: &'static str,
    ) -> (StatusCode, Json<Value>) {
        let slow = {
            let mut st = state.lock().unwrap();
            st.hits.push(name);
            st.slow.contains(&name)
        };
        if slow {
            tokio::time::sleep(SLOW_RESPONSE).await;
        }
        read(&state, &headers, name)
    }

    fn record(state: &Shared, name: &str, body: Value) {
        state.lock().unwrap().calls.push((name.to_string(), body));
    }

    pub async fn spawn(state: FakeState) -> (BackendClient, Shared) {
        let shared: Shared = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route(
                "/api/students/enrollment",
                get(|State(s): State<Shared>, h: HeaderMap| serve_read(s, h, "enrollment")),
            )
            .route(
                "/api/students/programs",
                get(|State(s): State<Shared>, h: HeaderMap| serve_read(s, h, "programs")),
            )
            .route(
                "/api/students/sessions",
                get(|State(s): State<Shared>, h: HeaderMap| serve_read(s, h, "sessions")),
            )
            .route(
                "/api/students/assignments",
                get(|State(s): State<Shared>, h: HeaderMap| serve_read(s, h, "assignments")),
            )
            .route(
                "/api/students/mentors",
                get(|State(s): State<Shared>, h: HeaderMap| serve_read(s, h, "mentors")),
            )
            .route(
                "/api/students/batches",
                get(|State(s): State<Shared>, h: HeaderMap| serve_read(s, h, "batches")),
            )
            .route(
                "/api/students/enrollment/confirm-batch",
                post(|State(s): State<Shared>, Json(body): Json<Value>| async move {
                    record(&s, "confirm-batch", body.clone());
                    let mut st = s.lock().unwrap();
                    if body["batchId"] == "full-batch" {
                        return Json(json!({"success": false, "message": "Batch is full"}));
                    }
                    st.enrollment["batchConfirmed"] = json!(true);
                    st.enrollment["batchId"] = body["batchId"].clone();
                    Json(json!({"success": true, "message": "Batch confirmed"}))
                }),
            )
            .route(
                "/api/students/enrollment/select-mentor",
                post(|State(s): State<Shared>, Json(body): Json<Value>| async move {
                    record(&s, "select-mentor", body.clone());
                    s.lock().unwrap().enrollment["mentorId"] = body["mentorId"].clone();
                    Json(json!({"success": true}))
                }),
            )
            .route(
                "/api/students/enrollment/revoke-mentor",
                post(|State(s): State<Shared>, Json(body): Json<Value>| async move {
                    record(&s, "revoke-mentor", body);
                    s.lock().unwrap().enrollment["mentorId"] = Value::Null;
                    Json(json!({"success": true}))
                }),
            )
            .route(
                "/api/students/mentors/book-call",
                post(|State(s): State<Shared>, Json(body): Json<Value>| async move {
                    record(&s, "book-call", body.clone());
                    let mut st = s.lock().unwrap();
                    if st.booking_flaky > 0 {
                        st.booking_flaky -= 1;
                        return (
                            StatusCode::SERVICE_UNAVAILABLE,
                            Json(json!({"success": false})),
                        );
                    }
                    let mut calls = st.enrollment["bookedCalls"]
                        .as_array()
                        .cloned()
                        .unwrap_or_default();
                    calls.push(json!({
                        "id": format!("call-{}", calls.len() + 1),
                        "mentorId": body["mentorId"],
                        "status": "PENDING",
                        "reason": body["reason"],
                        "createdAt": "2026-10-18T09:00:00Z"
                    }));
                    st.enrollment["bookedCalls"] = Value::Array(calls);
                    (
                        StatusCode::OK,
                        Json(json!({"success": true, "message": "Call requested"})),
                    )
                }),
            )
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = Config::for_tests(format!("http://{}", addr));
        let client = super::create_client(&config).unwrap();
        (client, shared)
    }
}
