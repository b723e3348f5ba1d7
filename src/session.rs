use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::{
    error::PermissionFetchError,
    permissions::{PermissionSet, PermissionSourceState},
};

type FetchOutcome = Result<PermissionSet, PermissionFetchError>;

/// Slot
///
/// `Unloaded` and `Loaded(empty)` are different states: only the former makes the
/// gate fetch.
enum Slot {
    Unloaded,
    /// A fetch is in flight; later callers subscribe instead of fetching again.
    Pending(watch::Receiver<Option<FetchOutcome>>),
    Loaded(PermissionSet),
}

struct CacheState {
    // Bumped by every commit and invalidation so a stale fetch cannot overwrite them.
    generation: u64,
    slot: Slot,
}

/// PermissionCache
///
/// Session-scoped permission store with single-flight loading: however many
/// navigations ask at once, one fetch runs and every caller gets its outcome.
///
/// The fetch runs on its own task, so it completes and commits even if every
/// navigation waiting on it is dropped.
pub struct PermissionCache {
    state: Mutex<CacheState>,
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self {
            state: Mutex::new(CacheState {
                generation: 0,
                slot: Slot::Unloaded,
            }),
        }
    }
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.lock().slot, Slot::Loaded(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.lock().slot, Slot::Pending(_))
    }

    /// The committed set, or `None` if nothing was loaded yet.
    pub fn snapshot(&self) -> Option<PermissionSet> {
        match &self.lock().slot {
            Slot::Loaded(permissions) => Some(permissions.clone()),
            _ => None,
        }
    }

    /// commit
    ///
    /// Replaces the cached set. Any fetch still in flight will not overwrite it.
    pub fn commit(&self, permissions: PermissionSet) {
        let mut state = self.lock();
        state.generation += 1;
        state.slot = Slot::Loaded(permissions);
    }

    /// invalidate
    ///
    /// Forgets the cached set so the next admin navigation fetches again.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.slot = Slot::Unloaded;
        tracing::debug!("permission cache invalidated");
    }

    /// load
    ///
    /// Returns the cached set, joining or starting the fetch when there is none.
    /// A failed fetch leaves the cache unloaded; it is never retried here.
    pub async fn load(self: &Arc<Self>, source: &PermissionSourceState) -> FetchOutcome {
        let (generation, mut done) = {
            let mut state = self.lock();
            let generation = state.generation;
            let in_flight = match &state.slot {
                Slot::Loaded(permissions) => return Ok(permissions.clone()),
                Slot::Pending(done) => Some(done.clone()),
                Slot::Unloaded => None,
            };
            match in_flight {
                Some(done) => {
                    tracing::debug!("joining in-flight permission fetch");
                    (generation, done)
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    state.slot = Slot::Pending(rx.clone());
                    tracing::debug!("starting permission fetch");

                    let cache = Arc::clone(self);
                    let source = Arc::clone(source);
                    tokio::spawn(async move {
                        let outcome = source.fetch_permissions().await;
                        cache.settle(generation, &outcome);
                        tx.send_replace(Some(outcome));
                    });
                    (generation, rx)
                }
            }
        };

        let outcome = match done.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            // The fetch task died before reporting.
            Err(_) => None,
        };

        outcome.unwrap_or_else(|| {
            let aborted = Err(PermissionFetchError::Aborted);
            self.settle(generation, &aborted);
            aborted
        })
    }

    fn settle(&self, generation: u64, outcome: &FetchOutcome) {
        let mut state = self.lock();
        if state.generation != generation || !matches!(state.slot, Slot::Pending(_)) {
            tracing::debug!("discarding stale permission fetch");
            return;
        }
        state.slot = match outcome {
            Ok(permissions) => Slot::Loaded(permissions.clone()),
            Err(_) => Slot::Unloaded,
        };
    }
}

/// Session
///
/// Everything the navigation layer knows about the signed-in user: whether there
/// is one, and the admin permissions cached for them.
#[derive(Default)]
pub struct Session {
    logged_in: AtomicBool,
    permissions: Arc<PermissionCache>,
}

/// SessionState
///
/// The shared handle passed to the gate and to the code that logs users in and out.
pub type SessionState = Arc<Session>;

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logged_in() -> Self {
        let session = Self::default();
        session.log_in();
        session
    }

    pub fn is_logged(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    pub fn log_in(&self) {
        self.logged_in.store(true, Ordering::SeqCst);
    }

    /// Logging out also drops the cached permissions of the previous user.
    pub fn log_out(&self) {
        self.logged_in.store(false, Ordering::SeqCst);
        self.permissions.invalidate();
    }

    pub fn permissions(&self) -> &Arc<PermissionCache> {
        &self.permissions
    }
}
