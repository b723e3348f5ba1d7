use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// ProgressIndicator
///
/// The visual loading bar shown while a navigation is in flight. Rendering is
/// left to the implementor; the router starts it, trickles it while the
/// navigation is pending, and finishes it.
pub trait ProgressIndicator: Send + Sync {
    fn start(&self);
    fn done(&self);
    /// Current fill in `[0, 1]`, `None` while idle.
    fn status(&self) -> Option<f64>;

    /// Nudges a running indicator forward. Indicators without a fill ignore it.
    fn inc(&self) {}

    /// Interval between automatic `inc` calls; `None` disables trickling.
    fn trickle_speed(&self) -> Option<Duration> {
        None
    }
}

pub type ProgressState = Arc<dyn ProgressIndicator>;

/// ProgressSettings
///
/// Mirrors the knobs of the classic top-of-page progress bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSettings {
    /// Fill applied on start.
    pub minimum: f64,
    pub show_spinner: bool,
    /// Trickle interval while running, `None` to keep the fill still.
    pub trickle_speed: Option<Duration>,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            minimum: 0.08,
            show_spinner: false,
            trickle_speed: Some(Duration::from_millis(200)),
        }
    }
}

#[derive(Debug, Default)]
struct BarState {
    status: Option<f64>,
    started: u64,
    finished: u64,
}

/// ProgressBar
///
/// In-memory progress bar state. `start` while running keeps the current fill,
/// `done` while idle does nothing.
#[derive(Debug, Default)]
pub struct ProgressBar {
    settings: ProgressSettings,
    state: Mutex<BarState>,
}

impl ProgressBar {
    pub fn new(settings: ProgressSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(BarState::default()),
        }
    }

    pub fn settings(&self) -> &ProgressSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, BarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_started(&self) -> bool {
        self.lock().status.is_some()
    }

    /// How many times the bar went from idle to running.
    pub fn started_count(&self) -> u64 {
        self.lock().started
    }

    /// How many times the bar went from running to idle.
    pub fn finished_count(&self) -> u64 {
        self.lock().finished
    }
}

impl ProgressIndicator for ProgressBar {
    fn start(&self) {
        let mut state = self.lock();
        if state.status.is_some() {
            return;
        }
        state.status = Some(self.settings.minimum);
        state.started += 1;
        tracing::debug!(spinner = self.settings.show_spinner, "progress started");
    }

    fn done(&self) {
        let mut state = self.lock();
        if state.status.take().is_none() {
            return;
        }
        state.finished += 1;
        tracing::debug!("progress done");
    }

    fn status(&self) -> Option<f64> {
        self.lock().status
    }

    /// Trickles the fill forward, slowing down as it approaches the end. Never
    /// reaches 1.0 on its own and does nothing while idle.
    fn inc(&self) {
        let mut state = self.lock();
        let Some(current) = state.status else {
            return;
        };

        let amount = if current < 0.2 {
            0.1
        } else if current < 0.5 {
            0.04
        } else if current < 0.8 {
            0.02
        } else if current < 0.99 {
            0.005
        } else {
            0.0
        };
        state.status = Some((current + amount).clamp(0.0, 0.994));
    }

    fn trickle_speed(&self) -> Option<Duration> {
        self.settings.trickle_speed
    }
}
