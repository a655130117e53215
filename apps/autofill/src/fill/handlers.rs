//! Axum route handlers for fill sessions.

use std::sync::PoisonError;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::fill::notify::Notification;
use crate::fill::orchestrator::{FillOutcome, FillState};
use crate::fill::sessions::FillSession;
use crate::form::extractor::{extract_fields, FieldDescriptor};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub user_id: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct OpenSessionResponse {
    pub session_id: Uuid,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub user_id: String,
    pub state: FillState,
    pub created_at: DateTime<Utc>,
    pub html: String,
    /// `change` events dispatched on the document so far.
    pub change_events: usize,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Default, Serialize)]
pub struct FillResponse {
    pub outcome: &'static str,
    pub applied: usize,
    pub unresolved: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<FillOutcome> for FillResponse {
    fn from(outcome: FillOutcome) -> Self {
        match outcome {
            FillOutcome::Completed(report) => FillResponse {
                outcome: "completed",
                applied: report.applied,
                unresolved: report.unresolved,
                error: None,
            },
            FillOutcome::NoFields => FillResponse {
                outcome: "no_fields",
                ..FillResponse::default()
            },
            FillOutcome::Failed(err) => FillResponse {
                outcome: "failed",
                error: Some(err.to_string()),
                ..FillResponse::default()
            },
            FillOutcome::Rejected => FillResponse {
                outcome: "rejected",
                ..FillResponse::default()
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Registers a page for filling and returns the fields found on it.
pub async fn handle_open_session(
    State(state): State<AppState>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<OpenSessionResponse>), AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }
    if request.html.trim().is_empty() {
        return Err(AppError::Validation("html cannot be empty".to_string()));
    }

    let session = state.sessions.open(&request.user_id, &request.html);
    let fields = {
        let document = session
            .document
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        extract_fields(&document)
    };

    Ok((
        StatusCode::CREATED,
        Json(OpenSessionResponse {
            session_id: session.id,
            fields,
        }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = find_session(&state, id)?;
    Ok(Json(SessionView {
        session_id: session.id,
        user_id: session.user_id.clone(),
        state: session.orchestrator.state(),
        created_at: session.created_at,
        html: session.html(),
        change_events: session.change_events(),
        notifications: session.notifications.active(),
    }))
}

/// POST /api/v1/sessions/:id/fill
///
/// The start signal. The run is spawned so a dropped request cannot cancel it
/// halfway through.
pub async fn handle_fill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<FillResponse>), AppError> {
    let session = find_session(&state, id)?;

    let outcome = tokio::spawn(async move { session.orchestrator.run_fill().await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("fill task aborted: {e}")))?;

    let status = match outcome {
        FillOutcome::Rejected => StatusCode::ACCEPTED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(FillResponse::from(outcome))))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.close(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

fn find_session(state: &AppState, id: Uuid) -> Result<std::sync::Arc<FillSession>, AppError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}
