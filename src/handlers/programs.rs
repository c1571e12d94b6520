//! Program browsing: modules, locks and progress

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Serialize;

use super::assignments::AssignmentView;
use super::middleware::StudentToken;
use super::{backend_failure, load_warning, AppState};
use crate::models::*;
use crate::policy::modules::{progress_percent, sessions_for_module, unlock_states};

/// Shown when the API sends a program without a name
const UNTITLED_PROGRAM: &str = "Untitled program";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    pub id: String,
    pub name: String,
    pub order: i32,
    pub status: ModuleStatus,
    pub locked: bool,
    pub assignments: Vec<AssignmentView>,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOverview {
    pub enrollment_id: String,
    pub program_id: String,
    pub name: String,
    pub description: Option<String>,
    pub batch: Option<Batch>,
    pub mentor: Option<Mentor>,
    pub progress: u8,
    pub completed_modules: usize,
    pub total_modules: usize,
    pub modules: Vec<ModuleView>,
    /// Sessions not linked to any of the program's modules
    pub other_sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramsResponse {
    pub programs: Vec<ProgramOverview>,
    pub warnings: Vec<String>,
}

impl From<ProgramEnrollment> for ProgramOverview {
    fn from(entry: ProgramEnrollment) -> Self {
        let progress = progress_percent(&entry.modules);
        let total_modules = entry.modules.len();
        let completed_modules = entry
            .modules
            .iter()
            .filter(|m| m.status == ModuleStatus::Completed)
            .count();

        let modules: Vec<ModuleView> = unlock_states(entry.modules)
            .into_iter()
            .map(|state| {
                let sessions = sessions_for_module(&entry.sessions, &state.module.id)
                    .into_iter()
                    .cloned()
                    .collect();
                ModuleView {
                    sessions,
                    locked: state.locked,
                    id: state.module.id,
                    name: state.module.name,
                    order: state.module.order,
                    status: state.module.status,
                    assignments: state
                        .module
                        .assignments
                        .into_iter()
                        .map(AssignmentView::from)
                        .collect(),
                }
            })
            .collect();

        let other_sessions = entry
            .sessions
            .into_iter()
            .filter(|s| {
                s.module_id
                    .as_deref()
                    .map_or(true, |id| !modules.iter().any(|m| m.id == id))
            })
            .collect();

        let name = display_name(&entry.program);

        Self {
            enrollment_id: entry.enrollment_id,
            program_id: entry.program.id,
            name,
            description: entry.program.description,
            batch: entry.batch,
            mentor: entry.mentor,
            progress,
            completed_modules,
            total_modules,
            modules,
            other_sessions,
        }
    }
}

/// Program name with a placeholder for missing or blank names
pub(crate) fn display_name(program: &Program) -> String {
    program
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNTITLED_PROGRAM)
        .to_string()
}

/// Programs the student is enrolled in; an empty list with a warning when unavailable
pub async fn list_programs(
    State(state): State<AppState>,
    Extension(StudentToken(token)): Extension<StudentToken>,
) -> impl IntoResponse {
    let response = match state.backend.get_programs(&token).await {
        Ok(programs) => ProgramsResponse {
            programs: programs.into_iter().map(ProgramOverview::from).collect(),
            warnings: Vec::new(),
        },
        Err(e) if e.status_code() == StatusCode::UNAUTHORIZED => return backend_failure(&e),
        Err(e) => ProgramsResponse {
            programs: Vec::new(),
            warnings: vec![load_warning("your programs", &e)],
        },
    };
    (StatusCode::OK, Json(ApiResponse::success(response)))
}
