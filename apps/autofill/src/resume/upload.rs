//! Resume upload rules and persistence.

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;

pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// A resume as received, before it is stored.
#[derive(Debug)]
pub struct ResumeUpload {
    pub uid: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Checks an upload against the type, size and uid rules.
pub fn validate_upload(upload: &ResumeUpload, max_bytes: usize) -> Result<(), AppError> {
    if upload.uid.is_empty()
        || !upload
            .uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(
            "uid must be non-empty and contain only letters, digits, '-' or '_'".to_string(),
        ));
    }

    if !ALLOWED_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
        return Err(AppError::Validation(
            "Invalid file type. Only PDF, DOC, DOCX, and TXT files are allowed.".to_string(),
        ));
    }

    if upload.data.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "File size too large. Maximum size is {}MB",
            max_bytes / (1024 * 1024)
        )));
    }

    Ok(())
}

/// `resumes/{uid}-{millis}-{suffix}{.ext}`
pub fn object_key(uid: &str, file_name: &str) -> String {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "resumes/{uid}-{}-{}{extension}",
        Utc::now().timestamp_millis(),
        &suffix[..9]
    )
}

pub async fn find_resume(pool: &PgPool, uid: &str) -> Result<Option<ResumeRow>, AppError> {
    let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE uid = $1")
        .bind(uid)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Stores the file and records it. A second resume for the same uid is a conflict.
pub async fn store_resume(
    pool: &PgPool,
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    upload: ResumeUpload,
) -> Result<ResumeRow, AppError> {
    if find_resume(pool, &upload.uid).await?.is_some() {
        return Err(AppError::Conflict(
            "Resume already exists for this user".to_string(),
        ));
    }

    let key = object_key(&upload.uid, &upload.file_name);
    s3.put_object()
        .bucket(s3_bucket)
        .key(&key)
        .content_type(&upload.content_type)
        .body(ByteStream::from(upload.data))
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Failed to store resume {key}: {e}")))?;

    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, uid, resume_path, upload_date)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&upload.uid)
    .bind(&key)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Resume already exists for this user".to_string())
        }
        other => AppError::Database(other),
    })?;

    info!(uid = %row.uid, key = %row.resume_path, "resume stored");
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(uid: &str, content_type: &str, size: usize) -> ResumeUpload {
        ResumeUpload {
            uid: uid.to_string(),
            file_name: "cv.pdf".to_string(),
            content_type: content_type.to_string(),
            data: Bytes::from(vec![b'x'; size]),
        }
    }

    #[test]
    fn test_accepts_allowed_types() {
        for content_type in ALLOWED_CONTENT_TYPES {
            assert!(validate_upload(&upload("ada", content_type, 10), 1024).is_ok());
        }
    }

    #[test]
    fn test_rejects_other_types() {
        let err = validate_upload(&upload("ada", "image/png", 10), 1024).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Invalid file type")));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let err = validate_upload(&upload("ada", "text/plain", 1025), 1024).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert!(validate_upload(&upload("ada", "text/plain", 1024), 1024).is_ok());
    }

    #[test]
    fn test_rejects_unsafe_uid() {
        assert!(validate_upload(&upload("", "text/plain", 1), 1024).is_err());
        assert!(validate_upload(&upload("../etc", "text/plain", 1), 1024).is_err());
        assert!(validate_upload(&upload("user_42-a", "text/plain", 1), 1024).is_ok());
    }

    #[test]
    fn test_object_key_shape() {
        let key = object_key("ada", "My CV.PDF");
        assert!(key.starts_with("resumes/ada-"));
        assert!(key.ends_with(".pdf"));

        let key = object_key("ada", "resume");
        assert!(!key.contains('.'));
    }
}
