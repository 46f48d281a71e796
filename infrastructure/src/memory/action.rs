use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use votemute_application::{ActionProvider, ProviderError};
use votemute_domain::SubjectId;

/// Records which subjects are silenced.
///
/// Failures can be injected one call at a time to exercise the engine's
/// error paths.
#[derive(Debug, Default)]
pub struct InMemoryActionProvider {
    silenced: Mutex<BTreeSet<SubjectId>>,
    fail_next_apply: AtomicBool,
    fail_next_remove: AtomicBool,
}

impl InMemoryActionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `apply_restriction` call fail.
    pub fn fail_next_apply(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    /// Make the next `remove_restriction` call fail.
    pub fn fail_next_remove(&self) {
        self.fail_next_remove.store(true, Ordering::SeqCst);
    }

    pub fn is_silenced(&self, subject: &SubjectId) -> bool {
        self.silenced.lock().contains(subject)
    }

    pub fn silenced(&self) -> Vec<SubjectId> {
        self.silenced.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl ActionProvider for InMemoryActionProvider {
    async fn apply_restriction(&self, subject: &SubjectId) -> Result<(), ProviderError> {
        if self.fail_next_apply.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::PermissionDenied(format!(
                "cannot silence {}",
                subject
            )));
        }
        self.silenced.lock().insert(subject.clone());
        info!(subject = %subject, "Silenced");
        Ok(())
    }

    async fn remove_restriction(&self, subject: &SubjectId) -> Result<(), ProviderError> {
        if self.fail_next_remove.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::RequestFailed(format!(
                "cannot unsilence {}",
                subject
            )));
        }
        self.silenced.lock().remove(subject);
        info!(subject = %subject, "Unsilenced");
        Ok(())
    }
}
