// Resume upload: file validation, S3 storage, and the one-resume-per-user record.

pub mod handlers;
pub mod upload;
