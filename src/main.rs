//! Student Portal
//!
//! Backend-for-frontend for the student web client of the education platform.
//! It reads from the student REST API and answers with view-ready JSON.
//!
//! ## Features
//!
//! - **Dashboard**: Programs, today's and upcoming sessions, pending assignments
//! - **Live Classes & Assignments**: Available once onboarding is complete
//! - **Mentor Selection**: Request calls, select a mentor after a completed call, revoke
//! - **Enrollment Wizard**: Batch confirmation and onboarding progress

mod backend;
mod config;
mod handlers;
mod models;
mod policy;
mod validation;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use handlers::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Routes under `/api`, all requiring a student token
pub(crate) fn api_router() -> Router<AppState> {
    Router::new()
        // Dashboard & programs
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/programs", get(handlers::list_programs))
        // Gated views
        .route("/sessions", get(handlers::list_sessions))
        .route("/assignments", get(handlers::list_assignments))
        // Enrollment wizard
        .route("/onboarding", get(handlers::get_onboarding))
        .route("/onboarding/batches", get(handlers::list_batches))
        .route("/onboarding/confirm-batch", post(handlers::confirm_batch))
        // Mentors
        .route("/mentors", get(handlers::list_mentors))
        .route("/mentors/mine", get(handlers::get_my_mentor))
        .route("/mentors/revoke", post(handlers::revoke_mentor))
        .route(
            "/mentors/:mentor_id/request-call",
            post(handlers::request_call),
        )
        .route("/mentors/:mentor_id/select", post(handlers::select_mentor))
        .route_layer(middleware::from_fn(handlers::middleware::require_student))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "student_portal=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Starting Student Portal");
    tracing::info!("Environment: {:?}", config.environment);

    // Create upstream client
    let backend = backend::create_client(&config)?;
    tracing::info!(
        "Student API: {} (timeout {}s, {} retry)",
        config.backend_url,
        config.backend_timeout_secs,
        config.backend_retry_attempts
    );

    // Create application state
    let state = AppState {
        backend,
        default_session_minutes: config.default_session_minutes,
        display_offset: config.display_offset,
        is_production: config.is_production(),
    };

    // Build CORS layer
    let cors = if config.is_production() {
        CorsLayer::new()
            .allow_origin(
                config
                    .cors_origins
                    .iter()
                    .filter_map(|o| o.parse().ok())
                    .collect::<Vec<_>>(),
            )
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    // Build main router
    let app = Router::new()
        .nest("/api", api_router())
        .nest_service("/", ServeDir::new(&config.frontend_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::middleware::security_headers,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(cors)
        .with_state(state);

    // Start server
    let addr = config.server_addr();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Frontend served from: {}", config.frontend_dir);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
