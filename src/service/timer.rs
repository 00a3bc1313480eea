//! Recurring timer driving the sample-and-decide cycle.
//!
//! [`IntervalTimer`] runs a tokio task that calls a [`TimerHandler`] every
//! interval while started. Control calls are non-blocking and may be made
//! while holding a lock.

use async_trait::async_trait;
use log::trace;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

/// Timer control surface used by the scheduler.
pub trait Timer: Send + Sync {
    /// Start firing. No effect if already running; the cadence is kept.
    fn start(&self);

    /// Stop future fires. A fire already in progress runs to completion.
    fn stop(&self);

    /// Set the interval. A running timer restarts its cadence at the
    /// given interval, even if unchanged; a stopped timer stays stopped.
    fn set_period(&self, period_ms: u32);

    fn period_ms(&self) -> u32;

    fn is_running(&self) -> bool;
}

/// Receives timer fires.
#[async_trait]
pub trait TimerHandler: Send + Sync {
    async fn on_timer_fire(&self);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct TimerControl {
    running: bool,
    period_ms: u32,
}

/// Auto-reloading tokio timer.
///
/// The handler is held weakly; the task ends once the handler is dropped
/// or the timer itself is dropped.
pub struct IntervalTimer {
    control: watch::Sender<TimerControl>,
    cancel: CancellationToken,
}

impl IntervalTimer {
    /// Spawn the timer task in a stopped state.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(period_ms: u32, handler: Weak<dyn TimerHandler>) -> Self {
        let (control, rx) = watch::channel(TimerControl {
            running: false,
            period_ms: period_ms.max(1),
        });
        let cancel = CancellationToken::new();
        tokio::spawn(run_timer(rx, handler, cancel.clone()));
        Self { control, cancel }
    }
}

impl Timer for IntervalTimer {
    fn start(&self) {
        self.control.send_if_modified(|ctl| {
            let changed = !ctl.running;
            ctl.running = true;
            changed
        });
    }

    fn stop(&self) {
        self.control.send_if_modified(|ctl| {
            let changed = ctl.running;
            ctl.running = false;
            changed
        });
    }

    fn set_period(&self, period_ms: u32) {
        let period_ms = period_ms.max(1);
        self.control.send_modify(|ctl| ctl.period_ms = period_ms);
    }

    fn period_ms(&self) -> u32 {
        self.control.borrow().period_ms
    }

    fn is_running(&self) -> bool {
        self.control.borrow().running
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_timer(
    mut control: watch::Receiver<TimerControl>,
    handler: Weak<dyn TimerHandler>,
    cancel: CancellationToken,
) {
    loop {
        let ctl = *control.borrow_and_update();

        if !ctl.running {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = control.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
            }
        }

        let period = Duration::from_millis(ctl.period_ms as u64);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        trace!("timer armed at {} ms", ctl.period_ms);

        loop {
            // Control changes win over a tick due at the same time
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                changed = control.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    // Re-read control and re-arm
                    break;
                }
                _ = ticker.tick() => {
                    let Some(handler) = handler.upgrade() else {
                        return;
                    };
                    handler.on_timer_fire().await;
                }
            }
        }
    }
}
