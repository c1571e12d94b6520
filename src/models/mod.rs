//! Data models for the application
//!
//! Upstream records are decoded leniently: missing or `null` fields fall back to
//! defaults, unknown statuses decode as `Unknown`, and list entries that cannot be
//! read are dropped instead of failing the whole payload.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

// =============================================================================
// Lenient decoding
// =============================================================================

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a list entry by entry, dropping entries that do not fit
fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping malformed upstream record: {}", e);
                None
            }
        })
        .collect())
}

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    Pending,
    Scheduled,
    Completed,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Submitted,
    Graded,
    Overdue,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

// =============================================================================
// Enrollment
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, alias = "leadId")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub batch_confirmed: bool,
    #[serde(default)]
    pub mentor_id: Option<String>,
    #[serde(default, deserialize_with = "skip_invalid")]
    pub suggested_mentors: Vec<Mentor>,
    /// Calls without a mentor id are dropped on decode
    #[serde(default, deserialize_with = "skip_invalid")]
    pub booked_calls: Vec<Call>,
    /// Flag as stored upstream. Consumers use `is_onboarding_complete()` instead.
    #[serde(
        default,
        rename = "isOnboardingComplete",
        deserialize_with = "null_as_default"
    )]
    pub stored_onboarding_complete: bool,
}

// =============================================================================
// Mentor
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mentor {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specialization: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub available_slots: u32,
}

// =============================================================================
// Call
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub mentor_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: CallStatus,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Minutes
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub report: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub session_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: SessionStatus,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Minutes; the configured default applies when absent
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub module_id: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
}

// =============================================================================
// Program / Module / Assignment
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ModuleStatus,
    #[serde(default, deserialize_with = "skip_invalid")]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max_marks: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: AssignmentStatus,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submission: Option<AssignmentSubmission>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSubmission {
    #[serde(default)]
    pub marks: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// One element of `GET /api/students/programs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramEnrollment {
    pub enrollment_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub program: Program,
    #[serde(default)]
    pub batch: Option<Batch>,
    #[serde(default, deserialize_with = "skip_invalid")]
    pub modules: Vec<Module>,
    #[serde(default, deserialize_with = "skip_invalid")]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub mentor: Option<Mentor>,
}

// =============================================================================
// Upstream payloads
// =============================================================================

/// Envelope every upstream endpoint answers with
#[derive(Debug, Deserialize)]
pub struct BackendEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgramsPayload {
    #[serde(default, deserialize_with = "skip_invalid")]
    pub programs: Vec<ProgramEnrollment>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsPayload {
    #[serde(default, deserialize_with = "skip_invalid")]
    pub sessions: Vec<Session>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentsPayload {
    #[serde(default, deserialize_with = "skip_invalid")]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentPayload {
    pub enrollment: Enrollment,
}

#[derive(Debug, Deserialize)]
pub struct MentorsPayload {
    #[serde(default, deserialize_with = "skip_invalid")]
    pub mentors: Vec<Mentor>,
}

#[derive(Debug, Deserialize)]
pub struct BatchesPayload {
    #[serde(default, deserialize_with = "skip_invalid")]
    pub batches: Vec<Batch>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBatchBody<'a> {
    pub batch_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectMentorBody<'a> {
    pub mentor_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCallBody<'a> {
    pub mentor_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<DateTime<Utc>>,
}

// =============================================================================
// API Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
