use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    guards::{AfterHook, GuardDecision, NavigationContext, NavigationGuard, NavigationReport},
    navigation::ReadySignal,
    progress::ProgressState,
};

/// ProgressStart
///
/// Starts the bar on every navigation attempt and always proceeds. When the bar
/// goes from idle to running, a background task trickles it until it is done.
pub struct ProgressStart {
    indicator: ProgressState,
    // Identifies the current trickle task; an older task stops once it changes.
    run: Arc<AtomicU64>,
}

impl ProgressStart {
    pub fn new(indicator: ProgressState) -> Self {
        Self {
            indicator,
            run: Arc::new(AtomicU64::new(0)),
        }
    }

    fn spawn_trickle(&self) {
        let Some(speed) = self.indicator.trickle_speed() else {
            return;
        };
        let run = self.run.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.run);
        let indicator = Arc::clone(&self.indicator);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(speed);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if current.load(Ordering::SeqCst) != run || indicator.status().is_none() {
                    break;
                }
                indicator.inc();
            }
        });
    }
}

#[async_trait]
impl NavigationGuard for ProgressStart {
    async fn before_each(&self, _context: &NavigationContext) -> GuardDecision {
        let was_idle = self.indicator.status().is_none();
        self.indicator.start();
        if was_idle {
            self.spawn_trickle();
        }
        GuardDecision::Proceed
    }
}

/// ProgressDone
///
/// Finishes the bar once the router is ready, whether the navigation succeeded or not.
pub struct ProgressDone {
    indicator: ProgressState,
    ready: ReadySignal,
}

impl ProgressDone {
    pub fn new(indicator: ProgressState, ready: ReadySignal) -> Self {
        Self { indicator, ready }
    }
}

#[async_trait]
impl AfterHook for ProgressDone {
    async fn after_each(&self, _report: &NavigationReport) {
        self.ready.clone().wait().await;
        self.indicator.done();
    }
}
