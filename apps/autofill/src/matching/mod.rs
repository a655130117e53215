//! Field matcher: maps extracted form fields onto profile values.
//!
//! The fuzzy join between free-text field captions and structured profile keys
//! is delegated to a completion collaborator. This module owns the prompt and,
//! above all, the strict validation of whatever text comes back.

pub mod handlers;
pub mod prompts;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::form::extractor::{FieldDescriptor, PromptField};
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::{CompletionClient, LlmError};
use crate::matching::prompts::{FORM_MATCH_PROMPT_TEMPLATE, FORM_MATCH_SYSTEM};
use crate::matching::validation::validate_assignments;
use crate::models::fill::FillAssignment;
use crate::models::profile::ProfileRecord;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("matching collaborator failed: {0}")]
    Collaborator(#[from] LlmError),

    #[error("matcher response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("matcher response is not a JSON array")]
    NotAnArray,

    #[error("matcher response held no usable assignments")]
    Empty,

    #[error("matcher did not answer within {0:?}")]
    Timeout(Duration),
}

/// Produces fill assignments for a set of fields. Carried as `Arc<dyn FieldMatcher>`.
#[async_trait]
pub trait FieldMatcher: Send + Sync {
    async fn match_fields(
        &self,
        fields: &[FieldDescriptor],
        profile: &ProfileRecord,
    ) -> Result<Vec<FillAssignment>, MatchError>;
}

/// Matcher backed by a completion collaborator. Single attempt per call:
/// an unusable reply is surfaced, not retried.
pub struct LlmFieldMatcher {
    client: Arc<dyn CompletionClient>,
}

impl LlmFieldMatcher {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FieldMatcher for LlmFieldMatcher {
    async fn match_fields(
        &self,
        fields: &[FieldDescriptor],
        profile: &ProfileRecord,
    ) -> Result<Vec<FillAssignment>, MatchError> {
        let prompt = build_match_prompt(fields, profile)?;
        let system = format!("{FORM_MATCH_SYSTEM} {NO_INVENTION_INSTRUCTION}");

        let raw = self.client.complete(&system, &prompt).await?;
        debug!(response_len = raw.len(), "matcher response received");

        let assignments = validate_assignments(&raw)?;
        info!(
            fields = fields.len(),
            assignments = assignments.len(),
            "matcher produced assignments"
        );
        Ok(assignments)
    }
}

/// Renders the matching prompt. Only id, name and control type of each field
/// are sent; captions and placeholders stay on the page.
pub fn build_match_prompt(
    fields: &[FieldDescriptor],
    profile: &ProfileRecord,
) -> Result<String, MatchError> {
    let reduced: Vec<PromptField<'_>> = fields.iter().map(FieldDescriptor::for_prompt).collect();
    let fields_json = serde_json::to_string_pretty(&reduced)?;
    let profile_json = serde_json::to_string_pretty(profile)?;

    Ok(FORM_MATCH_PROMPT_TEMPLATE
        .replace("{fields}", &fields_json)
        .replace("{profile}", &profile_json))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Collaborator that replays a canned reply and records the prompts it saw.
    pub(crate) struct CannedCompletion {
        reply: Result<String, u16>,
        pub prompts: Mutex<Vec<(String, String)>>,
    }

    impl CannedCompletion {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for CannedCompletion {
        async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), prompt.to_string()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "canned failure".to_string(),
                }),
            }
        }
    }

    fn field(id: &str, name: &str, control_type: &str) -> FieldDescriptor {
        FieldDescriptor {
            id: id.to_string(),
            tag: "input".to_string(),
            control_type: control_type.to_string(),
            name: name.to_string(),
            label: "Sensitive caption".to_string(),
            placeholder: "ada@example.com".to_string(),
            ..FieldDescriptor::default()
        }
    }

    fn profile() -> ProfileRecord {
        let mut profile = ProfileRecord::default();
        profile.personal_information.full_name = "Ada Lovelace".to_string();
        profile
    }

    #[tokio::test]
    async fn test_match_returns_validated_assignments() {
        let client = Arc::new(CannedCompletion::replying(
            r#"[{"selector":"fullName","value":"Ada Lovelace"},{"selector":"email"}]"#,
        ));
        let matcher = LlmFieldMatcher::new(client.clone());

        let assignments = matcher
            .match_fields(&[field("fullName", "fullName", "text")], &profile())
            .await
            .unwrap();

        assert_eq!(assignments, vec![FillAssignment::new("fullName", "Ada Lovelace")]);
        assert_eq!(client.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_carries_reduced_fields_and_profile() {
        let client = Arc::new(CannedCompletion::replying(r#"[{"selector":"a","value":"b"}]"#));
        let matcher = LlmFieldMatcher::new(client.clone());
        matcher
            .match_fields(&[field("mail", "email", "email")], &profile())
            .await
            .unwrap();

        let prompts = client.prompts.lock().unwrap();
        let (system, prompt) = &prompts[0];
        assert!(system.contains("JSON array"));
        assert!(prompt.contains(r#""id": "mail""#));
        assert!(prompt.contains(r#""type": "email""#));
        assert!(prompt.contains("Ada Lovelace"));
        assert!(!prompt.contains("Sensitive caption"));
        assert!(!prompt.contains("{fields}"));
        assert!(!prompt.contains("{profile}"));
    }

    #[tokio::test]
    async fn test_malformed_reply_is_match_error() {
        let matcher = LlmFieldMatcher::new(Arc::new(CannedCompletion::replying("not json")));
        let err = matcher
            .match_fields(&[field("a", "a", "text")], &profile())
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_collaborator_failure_is_match_error() {
        let matcher = LlmFieldMatcher::new(Arc::new(CannedCompletion::failing(500)));
        let err = matcher
            .match_fields(&[field("a", "a", "text")], &profile())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MatchError::Collaborator(LlmError::Api { status: 500, .. })
        ));
    }
}
