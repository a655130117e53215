//! Orchestrator: sequences one fill run end to end.
//!
//! profile → extract → match → apply → notify, awaited strictly in order.
//! At most one run per document is active: a start signal that arrives while a
//! run is in flight is dropped. Every failure ends as one user-visible
//! notification; nothing propagates past `run_fill`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::dom::Document;
use crate::fill::notify::{Notifier, Severity};
use crate::form::applier::{ApplyReport, FormApplier};
use crate::form::extractor::extract_fields;
use crate::matching::{FieldMatcher, MatchError};
use crate::profile::store::{ProfileError, ProfileStore};

pub const SUCCESS_MESSAGE: &str = "Form filled successfully!";
pub const ERROR_MESSAGE: &str = "Error filling form. Please try again.";
pub const NO_FIELDS_MESSAGE: &str = "No form fields found on this page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillState {
    Idle,
    Running,
}

#[derive(Debug, Error)]
pub enum FillError {
    #[error("profile unavailable: {0}")]
    ProfileUnavailable(#[from] ProfileError),

    #[error("matching failed: {0}")]
    Match(#[from] MatchError),
}

#[derive(Debug)]
pub enum FillOutcome {
    /// Assignments were applied. Unresolved ones are listed, not failed.
    Completed(ApplyReport),
    /// The document had no form controls; the matcher was not called.
    NoFields,
    /// A stage failed; the document was not touched.
    Failed(FillError),
    /// Another run was already in flight.
    Rejected,
}

/// Collaborators shared by every session's orchestrator.
#[derive(Clone)]
pub struct FillDeps {
    pub profiles: Arc<dyn ProfileStore>,
    pub matcher: Arc<dyn FieldMatcher>,
    pub applier: Arc<dyn FormApplier>,
    pub match_timeout: Duration,
}

pub struct FillOrchestrator {
    user_id: String,
    document: Arc<RwLock<Document>>,
    notifier: Arc<dyn Notifier>,
    deps: FillDeps,
    state: Mutex<FillState>,
}

impl FillOrchestrator {
    pub fn new(
        user_id: String,
        document: Arc<RwLock<Document>>,
        notifier: Arc<dyn Notifier>,
        deps: FillDeps,
    ) -> Self {
        Self {
            user_id,
            document,
            notifier,
            deps,
            state: Mutex::new(FillState::Idle),
        }
    }

    pub fn state(&self) -> FillState {
        *lock_state(&self.state)
    }

    /// Handles one start signal.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn run_fill(&self) -> FillOutcome {
        let Some(_guard) = RunGuard::acquire(&self.state) else {
            debug!("fill already running, start signal dropped");
            return FillOutcome::Rejected;
        };

        match self.run_stages().await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("fill failed: {err}");
                self.notifier.notify(ERROR_MESSAGE, Severity::Error);
                FillOutcome::Failed(err)
            }
        }
    }

    async fn run_stages(&self) -> Result<FillOutcome, FillError> {
        let profile = self.deps.profiles.load(&self.user_id).await?;

        let fields = {
            let document = self.document.read().unwrap_or_else(PoisonError::into_inner);
            extract_fields(&document)
        };
        debug!(fields = fields.len(), "fields extracted");
        if fields.is_empty() {
            self.notifier.notify(NO_FIELDS_MESSAGE, Severity::Info);
            return Ok(FillOutcome::NoFields);
        }

        let timeout = self.deps.match_timeout;
        let assignments =
            tokio::time::timeout(timeout, self.deps.matcher.match_fields(&fields, &profile))
                .await
                .map_err(|_| MatchError::Timeout(timeout))??;

        let report = {
            let mut document = self.document.write().unwrap_or_else(PoisonError::into_inner);
            self.deps.applier.apply(&assignments, &mut document)
        };
        info!(
            applied = report.applied,
            unresolved = report.unresolved.len(),
            "fill applied"
        );

        self.notifier.notify(SUCCESS_MESSAGE, Severity::Success);
        Ok(FillOutcome::Completed(report))
    }
}

/// Holds `Running` for the lifetime of one run and restores `Idle` on drop,
/// whichever stage ended the run.
struct RunGuard<'a> {
    state: &'a Mutex<FillState>,
}

impl<'a> RunGuard<'a> {
    fn acquire(state: &'a Mutex<FillState>) -> Option<Self> {
        let mut current = lock_state(state);
        if *current == FillState::Running {
            return None;
        }
        *current = FillState::Running;
        Some(Self { state })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *lock_state(self.state) = FillState::Idle;
    }
}

fn lock_state(state: &Mutex<FillState>) -> MutexGuard<'_, FillState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::fill::notify::NotificationLog;
    use crate::form::applier::DomApplier;
    use crate::form::extractor::FieldDescriptor;
    use crate::matching::tests::CannedCompletion;
    use crate::matching::LlmFieldMatcher;
    use crate::models::fill::FillAssignment;
    use crate::models::profile::ProfileRecord;
    use crate::profile::store::tests::InMemoryProfileStore;

    const USER: &str = "user-1";

    fn ada() -> ProfileRecord {
        let mut profile = ProfileRecord::default();
        profile.personal_information.full_name = "Ada Lovelace".to_string();
        profile
    }

    /// Counts apply passes and delegates to the real applier.
    #[derive(Default)]
    struct CountingApplier {
        calls: AtomicUsize,
    }

    impl FormApplier for CountingApplier {
        fn apply(&self, assignments: &[FillAssignment], document: &mut Document) -> ApplyReport {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DomApplier.apply(assignments, document)
        }
    }

    /// Holds every load until the gate is opened.
    struct GatedProfileStore {
        gate: Arc<Notify>,
        inner: InMemoryProfileStore,
    }

    #[async_trait]
    impl ProfileStore for GatedProfileStore {
        async fn load(&self, user_id: &str) -> Result<ProfileRecord, ProfileError> {
            self.gate.notified().await;
            self.inner.load(user_id).await
        }

        async fn save(&self, user_id: &str, profile: &ProfileRecord) -> Result<(), ProfileError> {
            self.inner.save(user_id, profile).await
        }
    }

    struct NeverMatcher;

    #[async_trait]
    impl FieldMatcher for NeverMatcher {
        async fn match_fields(
            &self,
            _fields: &[FieldDescriptor],
            _profile: &ProfileRecord,
        ) -> Result<Vec<FillAssignment>, MatchError> {
            std::future::pending().await
        }
    }

    struct Harness {
        orchestrator: Arc<FillOrchestrator>,
        document: Arc<RwLock<Document>>,
        notifications: Arc<NotificationLog>,
        applier: Arc<CountingApplier>,
    }

    fn harness(
        html: &str,
        profiles: Arc<dyn ProfileStore>,
        matcher: Arc<dyn FieldMatcher>,
    ) -> Harness {
        let document = Arc::new(RwLock::new(Document::parse(html)));
        let notifications = Arc::new(NotificationLog::new(Duration::from_secs(60)));
        let applier = Arc::new(CountingApplier::default());
        let deps = FillDeps {
            profiles,
            matcher,
            applier: applier.clone(),
            match_timeout: Duration::from_millis(500),
        };
        let orchestrator = Arc::new(FillOrchestrator::new(
            USER.to_string(),
            document.clone(),
            notifications.clone(),
            deps,
        ));
        Harness {
            orchestrator,
            document,
            notifications,
            applier,
        }
    }

    fn canned(reply: &str) -> Arc<dyn FieldMatcher> {
        Arc::new(LlmFieldMatcher::new(Arc::new(CannedCompletion::replying(reply))))
    }

    fn value_by_name(document: &Arc<RwLock<Document>>, name: &str) -> String {
        let document = document.read().unwrap();
        let node = document
            .elements()
            .find(|&id| document.attr(id, "name") == Some(name))
            .unwrap();
        document.value(node)
    }

    #[tokio::test]
    async fn test_end_to_end_fill() {
        let h = harness(
            r#"<form><input type="text" name="fullName"></form>"#,
            Arc::new(InMemoryProfileStore::with(USER, ada())),
            canned(r#"[{"selector":"fullName", "value":"Ada Lovelace"}]"#),
        );

        let outcome = h.orchestrator.run_fill().await;

        assert!(matches!(outcome, FillOutcome::Completed(ref r) if r.applied == 1));
        assert_eq!(value_by_name(&h.document, "fullName"), "Ada Lovelace");
        let notes = h.notifications.active();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Success);
        assert_eq!(notes[0].message, SUCCESS_MESSAGE);
        assert_eq!(h.orchestrator.state(), FillState::Idle);
    }

    #[tokio::test]
    async fn test_second_start_while_running_is_dropped() {
        let gate = Arc::new(Notify::new());
        let profiles = Arc::new(GatedProfileStore {
            gate: gate.clone(),
            inner: InMemoryProfileStore::with(USER, ada()),
        });
        let h = harness(
            r#"<input name="fullName">"#,
            profiles,
            canned(r#"[{"selector":"fullName", "value":"Ada Lovelace"}]"#),
        );

        let first = tokio::spawn({
            let orchestrator = h.orchestrator.clone();
            async move { orchestrator.run_fill().await }
        });
        while h.orchestrator.state() != FillState::Running {
            tokio::task::yield_now().await;
        }

        let second = h.orchestrator.run_fill().await;
        assert!(matches!(second, FillOutcome::Rejected));

        gate.notify_one();
        let first = first.await.unwrap();
        assert!(matches!(first, FillOutcome::Completed(_)));
        assert_eq!(h.applier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.notifications.active().len(), 1);
        assert_eq!(h.orchestrator.state(), FillState::Idle);
    }

    #[tokio::test]
    async fn test_missing_profile_aborts_and_releases_guard() {
        let h = harness(
            r#"<input name="fullName">"#,
            Arc::new(InMemoryProfileStore::default()),
            canned(r#"[{"selector":"fullName", "value":"Ada Lovelace"}]"#),
        );

        let outcome = h.orchestrator.run_fill().await;
        assert!(matches!(
            outcome,
            FillOutcome::Failed(FillError::ProfileUnavailable(ProfileError::NotFound(_)))
        ));
        assert_eq!(h.applier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.orchestrator.state(), FillState::Idle);

        let notes = h.notifications.active();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Error);

        // A failed run does not wedge the guard.
        assert!(matches!(h.orchestrator.run_fill().await, FillOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_match_error_applies_nothing() {
        let h = harness(
            r#"<input name="fullName" value="untouched">"#,
            Arc::new(InMemoryProfileStore::with(USER, ada())),
            canned("Sorry, I can't do that."),
        );

        let outcome = h.orchestrator.run_fill().await;

        assert!(matches!(outcome, FillOutcome::Failed(FillError::Match(MatchError::Parse(_)))));
        assert_eq!(h.applier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(value_by_name(&h.document, "fullName"), "untouched");
        assert_eq!(h.notifications.active()[0].message, ERROR_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_timeout_is_match_error() {
        let h = harness(
            r#"<input name="fullName">"#,
            Arc::new(InMemoryProfileStore::with(USER, ada())),
            Arc::new(NeverMatcher),
        );

        let outcome = h.orchestrator.run_fill().await;

        assert!(matches!(
            outcome,
            FillOutcome::Failed(FillError::Match(MatchError::Timeout(_)))
        ));
        assert_eq!(h.orchestrator.state(), FillState::Idle);
    }

    #[tokio::test]
    async fn test_document_without_fields_skips_matcher() {
        let completion = Arc::new(CannedCompletion::replying("[]"));
        let h = harness(
            "<p>Thanks for applying!</p>",
            Arc::new(InMemoryProfileStore::with(USER, ada())),
            Arc::new(LlmFieldMatcher::new(completion.clone())),
        );

        let outcome = h.orchestrator.run_fill().await;

        assert!(matches!(outcome, FillOutcome::NoFields));
        assert!(completion.prompts.lock().unwrap().is_empty());
        assert_eq!(h.notifications.active()[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_unresolved_assignments_still_succeed() {
        let h = harness(
            r#"<input name="fullName">"#,
            Arc::new(InMemoryProfileStore::with(USER, ada())),
            canned(concat!(
                r#"[{"selector":"fullName","value":"Ada Lovelace"},"#,
                r#"{"selector":"ghost","value":"x"}]"#
            )),
        );

        let FillOutcome::Completed(report) = h.orchestrator.run_fill().await else {
            panic!("expected a completed run");
        };
        assert_eq!(report.applied, 1);
        assert_eq!(report.unresolved, vec!["ghost"]);
        assert_eq!(h.notifications.active()[0].severity, Severity::Success);
    }
}
