//! Session state shared between the ingestion loop and the request adapter.
//!
//! [`SharedStore`] wraps the [`EntityStore`] in `Arc<Mutex<>>`. Each mutation
//! runs to completion under the lock, so two mutations never interleave.
//! Readers get a [`Projector`] over the locked snapshot and can subscribe to
//! a revision counter that ticks after every effective change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use messenger_shared::constants::DEFAULT_TYPING_TIMEOUT_SECS;
use messenger_store::{EntityStore, Outcome, Projector};

#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<EntityStore>>,
    revision: Arc<watch::Sender<u64>>,
    typing_timeout: Duration,
}

impl SharedStore {
    pub fn new(store: EntityStore) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(store)),
            revision: Arc::new(revision),
            typing_timeout: Duration::from_secs(DEFAULT_TYPING_TIMEOUT_SECS),
        }
    }

    pub fn with_typing_timeout(mut self, timeout: Duration) -> Self {
        self.typing_timeout = timeout;
        self
    }

    /// Apply one mutation. The revision ticks unless it reported
    /// [`Outcome::Ignored`].
    pub fn mutate<F>(&self, apply: F) -> Outcome
    where
        F: FnOnce(&mut EntityStore) -> Outcome,
    {
        let outcome = apply(&mut self.lock());
        if outcome.changed() {
            self.bump();
        }
        outcome
    }

    /// Apply a wholesale replacement or any other change that has no
    /// outcome of its own. Always ticks the revision.
    pub fn replace<F>(&self, apply: F)
    where
        F: FnOnce(&mut EntityStore),
    {
        apply(&mut self.lock());
        self.bump();
    }

    /// Read the raw store.
    pub fn read<T, F>(&self, read: F) -> T
    where
        F: FnOnce(&EntityStore) -> T,
    {
        read(&self.lock())
    }

    /// Derive views from the current snapshot.
    pub fn view<T, F>(&self, derive: F) -> T
    where
        F: FnOnce(Projector<'_>) -> T,
    {
        let store = self.lock();
        derive(Projector::new(&store).with_typing_timeout(self.typing_timeout))
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> EntityStore {
        self.lock().clone()
    }

    /// Receiver that observes every effective change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    // A panic while holding the lock must not take ingestion down with it;
    // the store is still structurally valid, so keep using it.
    fn lock(&self) -> MutexGuard<'_, EntityStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
