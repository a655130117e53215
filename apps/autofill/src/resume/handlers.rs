use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::resume::upload::{store_resume, validate_upload, ResumeUpload};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResumeResponse {
    pub message: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

/// POST /upload-resume
///
/// Multipart form with a `uid` text part and a `resume` file part.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResumeResponse>, AppError> {
    let mut uid: Option<String> = None;
    let mut file: Option<(String, String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("uid") => {
                uid = Some(field.text().await.map_err(multipart_error)?.trim().to_string());
            }
            Some("resume") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let uid = uid
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| AppError::Validation("UID is required".to_string()))?;

    let upload = ResumeUpload {
        uid,
        file_name,
        content_type,
        data,
    };
    validate_upload(&upload, state.config.resume_max_bytes)?;

    let row = store_resume(&state.db, &state.s3, &state.config.s3_bucket, upload).await?;

    Ok(Json(UploadResumeResponse {
        message: "Resume uploaded successfully".to_string(),
        file_path: row.resume_path,
    }))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File size too large".to_string())
    } else {
        AppError::Validation(format!("Malformed upload: {}", err.body_text()))
    }
}
