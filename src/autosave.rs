//! Note Autosave
//!
//! Coalesces keystroke-level edits of a trick's notes into single writes.
//! Each trick gets a pending value and an in-flight flag:
//! - every edit replaces the pending value and restarts the quiet window
//! - when the window elapses the latest value is written, once
//! - at most one write per trick is in flight; a window that elapses
//!   meanwhile is held back until the running write resolves
//! - switching to another trick flushes the pending value right away
//! - text equal to the trick's stored notes is dropped by the store at
//!   write time, so it is compared against the current record
//!
//! Failed writes are reported on the notice channel and never revert the
//! text being edited.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{mpsc, watch};

use crate::domain::{DomainError, DomainResult, ObstacleId, Trick, TrickId};
use crate::store::DomainStore;

/// Quiet period before notes are written
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrickKey {
    pub obstacle_id: ObstacleId,
    pub trick_id: TrickId,
}

impl TrickKey {
    pub fn new(obstacle_id: impl Into<ObstacleId>, trick_id: impl Into<TrickId>) -> Self {
        Self {
            obstacle_id: obstacle_id.into(),
            trick_id: trick_id.into(),
        }
    }
}

/// Outcome of a coalesced write, for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum AutosaveNotice {
    Saved { key: TrickKey, trick: Trick },
    Failed { key: TrickKey, error: DomainError },
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<String>,
    /// Bumped by every edit; a timer only fires for the latest one
    generation: u64,
    in_flight: bool,
    /// A window elapsed while a write was running
    queued: bool,
}

impl Slot {
    fn is_idle(&self) -> bool {
        !self.in_flight && self.pending.is_none()
    }
}

#[derive(Debug, Default)]
struct AutosaveState {
    target: Option<TrickKey>,
    slots: HashMap<TrickKey, Slot>,
    in_flight: usize,
}

struct Inner {
    store: Arc<DomainStore>,
    debounce: Duration,
    state: Mutex<AutosaveState>,
    saving: watch::Sender<bool>,
    notices: mpsc::UnboundedSender<AutosaveNotice>,
}

/// Debounced, serialized writer for trick notes.
///
/// Edits spawn timers on the current Tokio runtime.
#[derive(Clone)]
pub struct NoteAutosave {
    inner: Arc<Inner>,
}

impl NoteAutosave {
    pub fn new(
        store: Arc<DomainStore>,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<AutosaveNotice>) {
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let (saving, _) = watch::channel(false);
        let autosave = Self {
            inner: Arc::new(Inner {
                store,
                debounce,
                state: Mutex::new(AutosaveState::default()),
                saving,
                notices,
            }),
        };
        (autosave, notice_rx)
    }

    /// `true` while any write is in flight
    pub fn saving(&self) -> watch::Receiver<bool> {
        self.inner.saving.subscribe()
    }

    pub fn is_saving(&self) -> bool {
        *self.inner.saving.borrow()
    }

    pub fn target(&self) -> Option<TrickKey> {
        self.inner.lock().target.clone()
    }

    /// Start editing a trick's notes and return the text to show.
    ///
    /// A value still pending for the previously open trick is written now.
    pub async fn open(&self, obstacle_id: &str, trick_id: &str) -> DomainResult<String> {
        let trick = self
            .inner
            .store
            .trick(obstacle_id, trick_id)
            .await
            .ok_or_else(|| DomainError::NotFound(format!("Trick {} not found", trick_id)))?;
        let key = TrickKey::new(obstacle_id, trick_id);

        let mut state = self.inner.lock();
        if let Some(previous) = state.target.take() {
            if previous != key {
                self.inner.flush_locked(&mut state, &previous);
            }
        }
        state.target = Some(key.clone());

        let slot = state.slots.entry(key).or_default();
        Ok(slot.pending.clone().unwrap_or(trick.observations))
    }

    /// Record new text for the open trick and restart its quiet window
    pub fn edit(&self, text: impl Into<String>) -> DomainResult<()> {
        let mut state = self.inner.lock();
        let key = state
            .target
            .clone()
            .ok_or_else(|| DomainError::Validation("No trick is open for editing".to_string()))?;

        let slot = state.slots.entry(key.clone()).or_default();
        slot.pending = Some(text.into());
        slot.generation += 1;
        let generation = slot.generation;
        drop(state);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.window_elapsed(&key, generation);
        });
        Ok(())
    }

    /// Stop editing; the pending value, if any, is written now
    pub fn close(&self) {
        let mut state = self.inner.lock();
        if let Some(key) = state.target.take() {
            self.inner.flush_locked(&mut state, &key);
        }
    }

    /// Write every pending value now and wait until nothing is in flight
    pub async fn flush_all(&self) {
        let mut saving = self.saving();
        loop {
            {
                let mut state = self.inner.lock();
                let keys: Vec<TrickKey> = state
                    .slots
                    .iter()
                    .filter(|(_, slot)| slot.pending.is_some())
                    .map(|(key, _)| key.clone())
                    .collect();
                if keys.is_empty() && state.in_flight == 0 {
                    return;
                }
                for key in keys {
                    self.inner.flush_locked(&mut state, &key);
                }
            }
            if saving.wait_for(|busy| !*busy).await.is_err() {
                return;
            }
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, AutosaveState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn window_elapsed(self: &Arc<Self>, key: &TrickKey, generation: u64) {
        let mut state = self.lock();
        let latest = state
            .slots
            .get(key)
            .is_some_and(|slot| slot.generation == generation);
        if latest {
            self.issue_locked(&mut state, key);
        }
    }

    /// Write the pending value immediately, cancelling its timer
    fn flush_locked(self: &Arc<Self>, state: &mut AutosaveState, key: &TrickKey) {
        if let Some(slot) = state.slots.get_mut(key) {
            slot.generation += 1;
        }
        self.issue_locked(state, key);
    }

    fn issue_locked(self: &Arc<Self>, state: &mut AutosaveState, key: &TrickKey) {
        let Some(slot) = state.slots.get_mut(key) else {
            return;
        };
        if slot.in_flight {
            if slot.pending.is_some() {
                slot.queued = true;
            }
            return;
        }
        slot.queued = false;
        let Some(text) = slot.pending.take() else {
            return;
        };

        debug!("Writing notes for {}", key.trick_id);
        slot.in_flight = true;
        state.in_flight += 1;
        self.saving.send_replace(true);

        let inner = Arc::clone(self);
        let key = key.clone();
        tokio::spawn(async move {
            let result = inner
                .store
                .set_observations(&key.obstacle_id, &key.trick_id, &text)
                .await;
            inner.write_finished(key, result);
        });
    }

    fn write_finished(self: &Arc<Self>, key: TrickKey, result: DomainResult<Trick>) {
        let mut state = self.lock();
        state.in_flight -= 1;

        let queued = match state.slots.get_mut(&key) {
            Some(slot) => {
                slot.in_flight = false;
                slot.queued
            }
            None => false,
        };

        let notice = match result {
            Ok(trick) => AutosaveNotice::Saved {
                key: key.clone(),
                trick,
            },
            Err(error) => {
                warn!("Saving notes for {} failed: {}", key.trick_id, error);
                AutosaveNotice::Failed {
                    key: key.clone(),
                    error,
                }
            }
        };
        // Receiver may be gone; saving continues regardless
        let _ = self.notices.send(notice);

        if queued {
            self.issue_locked(&mut state, &key);
        } else {
            self.discard_if_done(&mut state, &key);
        }
        let busy = state.in_flight > 0;
        self.saving.send_if_modified(|saving| {
            let changed = *saving != busy;
            *saving = busy;
            changed
        });
    }

    /// Forget a slot once it holds nothing and is not being edited
    fn discard_if_done(&self, state: &mut AutosaveState, key: &TrickKey) {
        let idle = state.slots.get(key).is_some_and(Slot::is_idle);
        if idle && state.target.as_ref() != Some(key) {
            state.slots.remove(key);
        }
    }
}
