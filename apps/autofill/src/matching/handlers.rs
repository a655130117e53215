//! Standalone matching endpoint, for clients that extract fields themselves.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::form::extractor::FieldDescriptor;
use crate::matching::MatchError;
use crate::models::fill::FillAssignment;
use crate::models::profile::ProfileRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeFormRequest {
    #[serde(alias = "domStructure")]
    pub dom_structure: Vec<FieldDescriptor>,
    #[serde(alias = "userData")]
    pub user_data: ProfileRecord,
}

/// POST /analyze-form
///
/// Returns the validated assignments; a reply with nothing usable is an empty list here.
pub async fn handle_analyze_form(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeFormRequest>,
) -> Result<Json<Vec<FillAssignment>>, AppError> {
    if request.dom_structure.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let timeout = state.config.match_timeout;
    let matched = tokio::time::timeout(
        timeout,
        state
            .matcher
            .match_fields(&request.dom_structure, &request.user_data),
    )
    .await
    .unwrap_or(Err(MatchError::Timeout(timeout)));

    match matched {
        Ok(assignments) => Ok(Json(assignments)),
        Err(MatchError::Empty) => Ok(Json(Vec::new())),
        Err(err) => Err(err.into()),
    }
}
