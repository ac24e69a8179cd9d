use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

use crate::report::ReportModel;
use crate::selection::Selection;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Armed,
}

/// Owns the single periodic refresh timer.
///
/// `arm` cancels any previously running timer before starting a new one, so
/// at most one timer ticks at a time. Each tick reads the selection current
/// at that moment, not the one captured when the timer was armed, and runs
/// it through the shared fetch pipeline. `disarm` (and drop) stop the timer;
/// an in-flight fetch is not forcibly cancelled but its completion is
/// discarded by the pipeline's request-token guard.
#[derive(Debug)]
pub struct RefreshController {
    interval: Duration,
    task: Option<JoinHandle<()>>,
    cycles: watch::Sender<u64>,
}

impl RefreshController {
    pub fn new(interval: Duration) -> Self {
        let (cycles, _) = watch::channel(0);
        Self {
            interval,
            task: None,
            cycles,
        }
    }

    pub fn state(&self) -> RefreshState {
        if self.task.is_some() {
            RefreshState::Armed
        } else {
            RefreshState::Idle
        }
    }

    /// Completed-cycle counter; bumped after every timer-driven fetch so a
    /// renderer can redraw.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cycles.subscribe()
    }

    /// Start ticking. The first fetch happens one full interval after
    /// arming; an immediate fetch is the caller's decision.
    pub fn arm(&mut self, model: Arc<ReportModel>, selection: Arc<Selection>) {
        self.disarm();

        let cycles = self.cycles.clone();
        let interval = self.interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The first tick of a tokio interval completes immediately;
            // consume it so the first fetch waits a full period.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(city) = selection.current() else {
                    continue;
                };

                debug!(%city, "refresh tick");
                model.fetch_for(&city).await;
                cycles.send_modify(|n| *n += 1);
            }
        }));
    }

    pub fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        self.disarm();
    }
}
