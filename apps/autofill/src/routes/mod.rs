pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::fill::handlers as fill;
use crate::matching::handlers as matching;
use crate::profile::handlers as profile;
use crate::resume::handlers as resume;
use crate::state::AppState;

/// Multipart framing allowance on top of the resume size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.resume_max_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health::health_handler))
        // Profiles
        .route(
            "/api/v1/profile/:user_id",
            get(profile::handle_get_profile).put(profile::handle_save_profile),
        )
        // Fill sessions
        .route("/api/v1/sessions", post(fill::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(fill::handle_get_session).delete(fill::handle_close_session),
        )
        .route("/api/v1/sessions/:id/fill", post(fill::handle_fill))
        // Extension-facing endpoints
        .route("/analyze-form", post(matching::handle_analyze_form))
        .route(
            "/upload-resume",
            post(resume::handle_upload_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}
