use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::fill::sessions::SessionRegistry;
use crate::matching::FieldMatcher;
use crate::profile::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Resume metadata.
    pub db: PgPool,
    /// Resume files.
    pub s3: S3Client,
    pub config: Config,
    pub profiles: Arc<dyn ProfileStore>,
    /// Also serves the standalone analyze-form endpoint.
    pub matcher: Arc<dyn FieldMatcher>,
    pub sessions: Arc<SessionRegistry>,
}
