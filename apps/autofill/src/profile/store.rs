//! Profile Store: key-value access to a user's `ProfileRecord`.
//!
//! Records live in Redis under `profile:{user_id}` as JSON. The core only ever
//! loads; saving happens through the explicit profile endpoint.

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::debug;

use crate::models::profile::ProfileRecord;

const KEY_PREFIX: &str = "profile:";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no profile stored for user {0}")]
    NotFound(String),

    #[error("profile store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("stored profile is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<ProfileRecord, ProfileError>;

    async fn save(&self, user_id: &str, profile: &ProfileRecord) -> Result<(), ProfileError>;
}

pub fn profile_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}{user_id}")
}

pub struct RedisProfileStore {
    client: redis::Client,
}

impl RedisProfileStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileStore for RedisProfileStore {
    async fn load(&self, user_id: &str) -> Result<ProfileRecord, ProfileError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(profile_key(user_id)).await?;
        let raw = raw.ok_or_else(|| ProfileError::NotFound(user_id.to_string()))?;
        debug!(user_id, bytes = raw.len(), "profile loaded");
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, user_id: &str, profile: &ProfileRecord) -> Result<(), ProfileError> {
        let raw = serde_json::to_string(profile)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(profile_key(user_id), raw).await?;
        debug!(user_id, "profile saved");
        Ok(())
    }
}
