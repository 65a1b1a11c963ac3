//! Retention scheduler
//!
//! Arms one deferred deletion per uploaded document. The retention window is
//! fixed at arm time from `settings.retention_duration`; later changes to the
//! setting do not rearm pending timers. `settings.auto_delete_expired` is
//! checked twice: when arming, and again when the timer fires.
//!
//! On fire the document is marked expired, removed, and a PolicyAction event
//! naming the file is appended, in that order and within one store
//! transaction. A document that is already gone produces no effects.

use crate::timer::TimerHandle;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sentinel_state::{
    Action, ActivityEvent, ActivityType, DocumentId, DocumentPatch, RetentionPeriod, Severity,
    Store,
};
use std::sync::Arc;
use std::time::Duration;

/// Per-document deferred deletion
#[derive(Debug, Clone)]
pub struct RetentionScheduler {
    store: Store,
    /// Length of one retention day
    day: Duration,
    pending: Arc<DashMap<DocumentId, TimerHandle>>,
}

impl RetentionScheduler {
    /// Create new scheduler over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Store, day: Duration) -> Self {
        Self {
            store,
            day,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Arm the deletion timer for `id` under the current settings
    ///
    /// Best effort: if auto-delete is off, or no runtime is available, no
    /// timer is armed and nothing is retried.
    ///
    /// # Returns
    /// Whether a timer was armed
    pub fn arm(&self, id: DocumentId) -> bool {
        let period = self.store.read(|state| {
            state
                .settings
                .auto_delete_expired
                .then_some(state.settings.retention_duration)
        });
        match period {
            Some(period) => self.arm_for(id, period),
            None => {
                tracing::debug!(
                    document_id = %id,
                    "auto-delete disabled; retention timer not armed"
                );
                false
            }
        }
    }

    /// Arm the deletion timer for `id` with a window read by the caller
    ///
    /// Replaces any timer already pending for `id`. The window is not
    /// rechecked against the store; auto-delete still is, when it fires.
    ///
    /// # Returns
    /// Whether a timer was armed
    pub fn arm_for(&self, id: DocumentId, period: RetentionPeriod) -> bool {
        let Some(delay) = period.as_duration(self.day) else {
            tracing::warn!(
                document_id = %id,
                days = period.days(),
                day_secs = self.day.as_secs(),
                "retention window overflows; timer not armed"
            );
            return false;
        };

        // The entry guard holds the shard lock until the handle is stored, so
        // the callback's removal always finds it.
        let entry = self.pending.entry(id);
        let store = self.store.clone();
        let pending = Arc::clone(&self.pending);
        let timer = TimerHandle::schedule(delay, move || {
            pending.remove(&id);
            expire(&store, id);
        });

        match timer {
            Ok(handle) => {
                match entry {
                    Entry::Occupied(mut slot) => slot.insert(handle).cancel(),
                    Entry::Vacant(slot) => {
                        slot.insert(handle);
                    }
                }
                tracing::debug!(document_id = %id, days = period.days(), "retention timer armed");
                true
            }
            Err(e) => {
                drop(entry);
                tracing::warn!(document_id = %id, error = %e, "could not arm retention timer");
                false
            }
        }
    }

    /// Cancel the pending timer for `id`
    ///
    /// # Returns
    /// Whether a pending timer was cancelled
    pub fn cancel(&self, id: DocumentId) -> bool {
        match self.pending.remove(&id) {
            Some((_, handle)) => {
                let was_pending = !handle.is_finished();
                handle.cancel();
                if was_pending {
                    tracing::debug!(document_id = %id, "retention timer cancelled");
                }
                was_pending
            }
            None => false,
        }
    }

    /// Whether a timer is pending for `id`
    #[inline]
    #[must_use]
    pub fn is_armed(&self, id: DocumentId) -> bool {
        self.pending
            .get(&id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of pending timers
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }
}

/// Apply the retention policy to `id` now
///
/// # Returns
/// The filename of the deleted document, if one was deleted
pub fn expire(store: &Store, id: DocumentId) -> Option<String> {
    let now = Utc::now();
    let deleted = store.transact(|state| {
        if !state.settings.auto_delete_expired {
            return (Vec::new(), None);
        }
        let Some(doc) = state.document(id) else {
            return (Vec::new(), None);
        };
        let filename = doc.filename.clone();
        let event = ActivityEvent::new(
            ActivityType::PolicyAction,
            Severity::Info,
            "Document Auto-Deleted",
            format!("Document {filename} expired and was automatically deleted"),
            now,
        );
        let actions = vec![
            Action::UpdateDocument {
                id,
                patch: DocumentPatch::expired(),
            },
            Action::DeleteDocument(id),
            Action::AddActivity(event),
        ];
        (actions, Some(filename))
    });

    match &deleted {
        Some(filename) => tracing::info!(document_id = %id, %filename, "document expired"),
        None => tracing::debug!(document_id = %id, "retention fire skipped"),
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_state::SettingsPatch;
    use sentinel_test_utils::{fresh_store, sample_document, store_with_documents};

    fn store_with_doc() -> (Store, DocumentId) {
        let store = fresh_store();
        let doc = sample_document("ledger.csv", b"hello");
        let id = doc.id;
        store.dispatch(Action::AddDocument(doc));
        (store, id)
    }

    #[test]
    fn expire_applies_effects_in_order() {
        let (store, id) = store_with_doc();
        let mut rx = store.subscribe();

        assert_eq!(expire(&store, id).as_deref(), Some("ledger.csv"));

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|change| change.action.kind())
            .collect();
        assert_eq!(kinds, ["update_document", "delete_document", "add_activity"]);

        let state = store.snapshot();
        assert!(state.documents.is_empty());
        assert_eq!(state.activities[0].activity_type, ActivityType::PolicyAction);
        assert_eq!(
            state.activities[0].description,
            "Document ledger.csv expired and was automatically deleted"
        );
    }

    #[test]
    fn expire_missing_document_is_silent() {
        let store = fresh_store();
        let before = store.snapshot();
        assert!(expire(&store, DocumentId::new()).is_none());
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn expire_rechecks_setting() {
        let (store, id) = store_with_doc();
        store.dispatch(Action::UpdateSettings(SettingsPatch::new().with_auto_delete(false)));
        assert!(expire(&store, id).is_none());
        assert!(store.snapshot().document(id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn arm_respects_setting_at_arm_time() {
        let (store, id) = store_with_doc();
        store.dispatch(Action::UpdateSettings(SettingsPatch::new().with_auto_delete(false)));
        let scheduler = RetentionScheduler::new(store, Duration::from_secs(1));
        assert!(!scheduler.arm(id));
        assert!(!scheduler.is_armed(id));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms_timer() {
        let (store, id) = store_with_doc();
        let scheduler = RetentionScheduler::new(store.clone(), Duration::from_secs(1));
        assert!(scheduler.arm(id));
        assert_eq!(scheduler.pending_count(), 1);

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        tokio::time::sleep(Duration::from_secs(200)).await;
        assert!(store.snapshot().document(id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn overflowing_window_is_not_armed() {
        let (store, id) = store_with_doc();
        let scheduler = RetentionScheduler::new(store.clone(), Duration::from_secs(u64::MAX / 10));

        assert!(!scheduler.arm(id));
        assert!(!scheduler.is_armed(id));
        assert!(scheduler.pending.is_empty());
        assert!(store.snapshot().document(id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn arm_for_uses_given_window() {
        let (store, id) = store_with_doc();
        let scheduler = RetentionScheduler::new(store.clone(), Duration::from_secs(1));
        store.dispatch(Action::UpdateSettings(
            SettingsPatch::new().with_retention(RetentionPeriod::Days180),
        ));

        assert!(scheduler.arm_for(id, RetentionPeriod::Days30));
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(store.snapshot().document(id).is_some());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.snapshot().document(id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_pending_timer() {
        let (store, id) = store_with_doc();
        let scheduler = RetentionScheduler::new(store.clone(), Duration::from_secs(1));

        assert!(scheduler.arm_for(id, RetentionPeriod::Days30));
        assert!(scheduler.arm_for(id, RetentionPeriod::Days90));
        assert_eq!(scheduler.pending_count(), 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(store.snapshot().document(id).is_some());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(store.snapshot().document(id).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fired_timers_leave_no_pending_entries() {
        let (store, ids) = store_with_documents(64);
        let scheduler = RetentionScheduler::new(store.clone(), Duration::ZERO);

        for id in &ids {
            assert!(scheduler.arm(*id));
        }
        for _ in 0..500 {
            if store.snapshot().documents.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(store.snapshot().documents.is_empty());

        // The callback removes its entry before expiring the document.
        assert!(scheduler.pending.is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }
}
