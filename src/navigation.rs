use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::NavigationError,
    guards::{AfterHook, GuardDecision, NavigationContext, NavigationGuard, NavigationReport},
    history::{History, HistoryEntry},
    route::{NavigationTarget, ResolvedRoute, RouteTable},
    views::{MountedView, ViewRegistry},
};

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// ReadySignal
///
/// Resolves once the navigator has settled its first navigation.
#[derive(Debug, Clone)]
pub struct ReadySignal(watch::Receiver<bool>);

impl ReadySignal {
    pub fn is_ready(&self) -> bool {
        *self.0.borrow()
    }

    pub async fn wait(&mut self) {
        // The sender lives as long as the navigator; a closed channel means there
        // is nothing left to wait for.
        let _ = self.0.wait_for(|ready| *ready).await;
    }
}

/// Navigation
///
/// A settled, successful navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub id: Uuid,
    pub route: ResolvedRoute,
    /// The first location a guard turned away, when the navigation was redirected.
    pub redirected_from: Option<String>,
    pub view: MountedView,
}

#[derive(Debug, Clone, Copy)]
enum HistoryMode {
    Push,
    Replace,
    Traverse(isize),
}

/// Navigator
///
/// The client router. Resolves a target against the route table, runs the
/// guards in registration order (following redirects), lazily mounts the
/// matched views, then records the result and runs the after-hooks.
///
/// Guards and hooks are registered before the navigator is shared; navigation
/// itself only needs `&self`.
pub struct Navigator {
    table: Arc<RouteTable>,
    views: Arc<ViewRegistry>,
    guards: Vec<Arc<dyn NavigationGuard>>,
    after_hooks: Vec<Arc<dyn AfterHook>>,
    current: Mutex<Option<ResolvedRoute>>,
    history: Mutex<History>,
    // Bumped by every navigation; a navigation that sees a newer value lost the race.
    sequence: AtomicU64,
    ready: watch::Sender<bool>,
    max_redirects: usize,
}

impl Navigator {
    pub fn new(table: Arc<RouteTable>, views: Arc<ViewRegistry>) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            table,
            views,
            guards: Vec::new(),
            after_hooks: Vec::new(),
            current: Mutex::new(None),
            history: Mutex::new(History::new()),
            sequence: AtomicU64::new(0),
            ready,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn before_each(&mut self, guard: impl NavigationGuard + 'static) {
        self.guards.push(Arc::new(guard));
    }

    pub fn after_each(&mut self, hook: impl AfterHook + 'static) {
        self.after_hooks.push(Arc::new(hook));
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn ready_signal(&self) -> ReadySignal {
        ReadySignal(self.ready.subscribe())
    }

    pub async fn is_ready(&self) {
        self.ready_signal().wait().await;
    }

    pub fn current_route(&self) -> Option<ResolvedRoute> {
        lock(&self.current).clone()
    }

    pub fn history(&self) -> History {
        lock(&self.history).clone()
    }

    // --- Navigation Entry Points ---

    /// push
    ///
    /// Navigates to `target` and adds a history entry on success.
    pub async fn push(&self, target: impl Into<NavigationTarget>) -> Result<Navigation, NavigationError> {
        self.navigate(target.into(), HistoryMode::Push).await
    }

    /// replace
    ///
    /// Navigates to `target`, overwriting the current history entry on success.
    pub async fn replace(&self, target: impl Into<NavigationTarget>) -> Result<Navigation, NavigationError> {
        self.navigate(target.into(), HistoryMode::Replace).await
    }

    /// go
    ///
    /// Navigates to the history entry `delta` steps away. Guards run again; the
    /// cursor only moves if the navigation succeeds.
    pub async fn go(&self, delta: isize) -> Result<Navigation, NavigationError> {
        let entry = lock(&self.history)
            .peek(delta)
            .cloned()
            .ok_or(NavigationError::HistoryExhausted)?;
        self.navigate(NavigationTarget::Path(entry.full_path), HistoryMode::Traverse(delta))
            .await
    }

    pub async fn back(&self) -> Result<Navigation, NavigationError> {
        self.go(-1).await
    }

    pub async fn forward(&self) -> Result<Navigation, NavigationError> {
        self.go(1).await
    }

    // --- Internals ---

    async fn navigate(&self, target: NavigationTarget, mode: HistoryMode) -> Result<Navigation, NavigationError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let id = Uuid::new_v4();
        let span = tracing::info_span!("navigation", id = %id, to = ?target);

        async move {
            let source = self.current_route();
            let outcome = self.settle(id, sequence, target, source.clone(), mode).await;

            match &outcome {
                Ok(navigation) => tracing::info!(
                    path = %navigation.route.full_path,
                    redirected_from = ?navigation.redirected_from,
                    "navigation settled"
                ),
                Err(error) => tracing::info!(%error, "navigation failed"),
            }

            self.ready.send_if_modified(|ready| !std::mem::replace(ready, true));

            let report = NavigationReport { id, source, outcome };
            for hook in &self.after_hooks {
                hook.after_each(&report).await;
            }
            report.outcome
        }
        .instrument(span)
        .await
    }

    async fn settle(
        &self,
        id: Uuid,
        sequence: u64,
        mut target: NavigationTarget,
        source: Option<ResolvedRoute>,
        mode: HistoryMode,
    ) -> Result<Navigation, NavigationError> {
        let mut redirected_from: Option<String> = None;
        let mut redirects = 0;

        let route = loop {
            let context = NavigationContext {
                id,
                target: self.table.resolve_target(&target)?,
                source: source.clone(),
            };
            let decision = self.run_guards(&context).await;
            self.ensure_latest(sequence, &context.target)?;

            match decision {
                GuardDecision::Proceed => break context.target,
                GuardDecision::Redirect(next) => {
                    redirects += 1;
                    if redirects > self.max_redirects {
                        return Err(NavigationError::TooManyRedirects(self.max_redirects));
                    }
                    tracing::debug!(from = %context.target.full_path, to = ?next, "guard redirected");
                    if redirected_from.is_none() {
                        redirected_from = Some(context.target.full_path);
                    }
                    target = next;
                }
            }
        };

        let view = MountedView::mount(&self.views, &route).await?;
        self.ensure_latest(sequence, &route)?;
        self.commit(&route, mode);

        Ok(Navigation {
            id,
            route,
            redirected_from,
            view,
        })
    }

    async fn run_guards(&self, context: &NavigationContext) -> GuardDecision {
        for guard in &self.guards {
            if let GuardDecision::Redirect(next) = guard.before_each(context).await {
                return GuardDecision::Redirect(next);
            }
        }
        GuardDecision::Proceed
    }

    fn ensure_latest(&self, sequence: u64, route: &ResolvedRoute) -> Result<(), NavigationError> {
        if self.sequence.load(Ordering::SeqCst) == sequence {
            Ok(())
        } else {
            Err(NavigationError::Superseded(route.full_path.clone()))
        }
    }

    fn commit(&self, route: &ResolvedRoute, mode: HistoryMode) {
        *lock(&self.current) = Some(route.clone());

        let entry = HistoryEntry::new(&route.full_path, route.name.as_deref());
        let mut history = lock(&self.history);
        match mode {
            HistoryMode::Push => history.push(entry),
            HistoryMode::Replace => history.replace(entry),
            HistoryMode::Traverse(delta) => {
                history.go(delta);
                // A guard may have sent the traversal somewhere else.
                if history.current().map(|current| current.full_path.as_str()) != Some(route.full_path.as_str()) {
                    history.replace(entry);
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
