use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::models::profile::ProfileRecord;
use crate::state::AppState;

/// GET /api/v1/profile/:user_id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileRecord>, AppError> {
    let profile = state.profiles.load(&user_id).await?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile/:user_id
///
/// The only write path for profiles. Contact details are mandatory.
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(profile): Json<ProfileRecord>,
) -> Result<StatusCode, AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }

    let missing = profile.missing_contact_fields();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Please fill in all fields: {}",
            missing.join(", ")
        )));
    }

    state.profiles.save(&user_id, &profile).await?;
    Ok(StatusCode::NO_CONTENT)
}
