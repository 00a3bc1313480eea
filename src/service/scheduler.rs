//! Notification scheduler for one sensor service.
//!
//! The scheduler owns the measurement period, the subscription flag and
//! the last sampled reading, and decides on every timer fire whether to
//! sample and whether to notify:
//!
//! | period | mode        | timer                    | on fire                        |
//! |--------|-------------|--------------------------|--------------------------------|
//! | `< 0`  | `Idle`      | stopped                  | nothing                        |
//! | `0`    | `OnChange`  | keeps its last interval  | notify if reading changed      |
//! | `> 0`  | `Periodic`  | runs every `period` ms   | always notify                  |
//!
//! State is guarded by a mutex shared between the timer context and the
//! attribute-write context. The sensor read happens outside the lock:
//! the period is snapshotted, the sensor is sampled, then the lock is
//! re-taken to compare, update and notify.

use super::attribute::{AttributeHandler, AttributeService};
use super::timer::{Timer, TimerHandler};
use crate::error::{Result, ServiceError};
use crate::sensors::{Reading, SampleSource};
use async_trait::async_trait;
use log::{debug, info, trace, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Called with the new flag whenever the observer subscribes or unsubscribes.
pub type SubscriptionHook = Box<dyn Fn(bool) + Send + Sync>;

/// Scheduling policy derived from the period.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchedulingMode {
    /// Sampling disabled.
    Idle,
    /// Sample and notify every `n` ms.
    Periodic(u32),
    /// Sample at the timer's current interval, notify on change.
    OnChange,
}

impl SchedulingMode {
    pub fn from_period(period_ms: i32) -> Self {
        match period_ms {
            p if p < 0 => SchedulingMode::Idle,
            0 => SchedulingMode::OnChange,
            p => SchedulingMode::Periodic(p as u32),
        }
    }
}

/// Why a cycle ended without notifying.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    Unsubscribed,
    Idle,
    SampleFailed,
    EmptyReading,
}

/// Result of one sample-and-decide cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CycleOutcome {
    /// The reading was pushed to the observer.
    Notified,
    /// A notification was due but the attribute service did not send it.
    Undelivered,
    /// On-change mode and the reading matched the previous one.
    Suppressed,
    /// Nothing was sampled or decided.
    Skipped(SkipReason),
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Service name used in log lines.
    pub name: &'static str,
    pub default_period_ms: i32,
    /// Timer interval used when the period has never been positive.
    pub base_interval_ms: u32,
}

impl SchedulerConfig {
    /// Interval the timer should be created with.
    pub fn initial_interval_ms(&self) -> u32 {
        match SchedulingMode::from_period(self.default_period_ms) {
            SchedulingMode::Periodic(ms) => ms,
            _ => self.base_interval_ms.max(1),
        }
    }
}

#[derive(Debug)]
struct SchedulerState {
    period_ms: i32,
    subscribed: bool,
    last_reading: Option<Reading>,
}

/// Decides when to sample a [`SampleSource`] and when to notify.
pub struct NotificationScheduler<T, A> {
    name: &'static str,
    source: SampleSource,
    timer: T,
    attributes: Arc<A>,
    state: Mutex<SchedulerState>,
    subscription_hook: RwLock<Option<SubscriptionHook>>,
}

impl<T: Timer, A: AttributeService> NotificationScheduler<T, A> {
    pub fn new(source: SampleSource, timer: T, attributes: Arc<A>, config: SchedulerConfig) -> Self {
        timer.set_period(config.initial_interval_ms());
        attributes.set_period_value(config.default_period_ms);

        Self {
            name: config.name,
            source,
            timer,
            attributes,
            state: Mutex::new(SchedulerState {
                period_ms: config.default_period_ms,
                subscribed: false,
                last_reading: None,
            }),
            subscription_hook: RwLock::new(None),
        }
    }

    /// Install a hook called on every subscription change.
    pub fn set_subscription_hook(&self, hook: SubscriptionHook) {
        *self.subscription_hook.write() = Some(hook);
    }

    /// Set the period and reconfigure the timer.
    ///
    /// Negative periods stop the timer, positive ones set the interval,
    /// zero keeps the current interval and switches to on-change
    /// notifications. The timer only runs while subscribed.
    pub fn set_period(&self, period_ms: i32) {
        let mode = SchedulingMode::from_period(period_ms);
        let previous = {
            let mut state = self.state.lock();
            let previous = state.period_ms;
            state.period_ms = period_ms;
            self.attributes.set_period_value(period_ms);

            match mode {
                SchedulingMode::Idle => self.timer.stop(),
                SchedulingMode::Periodic(interval) => {
                    self.timer.set_period(interval);
                    if state.subscribed {
                        self.timer.start();
                    }
                }
                SchedulingMode::OnChange => {
                    if state.subscribed {
                        self.timer.start();
                    }
                }
            }
            previous
        };

        info!(
            "[{}] period {} -> {} ms ({:?}, timer {} ms)",
            self.name,
            previous,
            period_ms,
            mode,
            self.timer.period_ms()
        );
    }

    /// Parse a period write (little-endian `i32`) and apply it.
    ///
    /// Bytes past the first four are ignored. Shorter writes leave the
    /// period unchanged.
    pub fn write_period(&self, data: &[u8]) -> Result<i32> {
        let Some(&[b0, b1, b2, b3]) = data.get(..4) else {
            return Err(ServiceError::TruncatedWrite(data.len()));
        };
        let period_ms = i32::from_le_bytes([b0, b1, b2, b3]);
        self.set_period(period_ms);
        Ok(period_ms)
    }

    /// React to the observer enabling or disabling notifications.
    ///
    /// Subscribing starts the timer. In on-change mode it also runs one
    /// cycle right away so the observer gets a first value without waiting
    /// for a tick; that outcome is returned.
    pub async fn on_subscription_change(&self, subscribed: bool) -> Option<CycleOutcome> {
        let sample_now = {
            let mut state = self.state.lock();
            state.subscribed = subscribed;
            if subscribed {
                self.timer.start();
                state.period_ms == 0
            } else {
                self.timer.stop();
                false
            }
        };

        info!(
            "[{}] observer {}",
            self.name,
            if subscribed {
                "subscribed"
            } else {
                "unsubscribed"
            }
        );

        if let Some(hook) = self.subscription_hook.read().as_ref() {
            hook(subscribed);
        }

        if sample_now {
            Some(self.sample_and_decide().await)
        } else {
            None
        }
    }

    /// One sample-and-decide cycle.
    pub async fn sample_and_decide(&self) -> CycleOutcome {
        let period_ms = {
            let state = self.state.lock();
            if !state.subscribed {
                return CycleOutcome::Skipped(SkipReason::Unsubscribed);
            }
            state.period_ms
        };
        if period_ms < 0 {
            return CycleOutcome::Skipped(SkipReason::Idle);
        }

        let reading = match self.source.read().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("[{}] sample failed: {}", self.name, e);
                return CycleOutcome::Skipped(SkipReason::SampleFailed);
            }
        };
        if reading.is_empty() {
            debug!("[{}] empty reading, nothing to notify", self.name);
            return CycleOutcome::Skipped(SkipReason::EmptyReading);
        }

        // Period or subscription may have changed while sampling
        let mut state = self.state.lock();
        if !state.subscribed {
            return CycleOutcome::Skipped(SkipReason::Unsubscribed);
        }

        let outcome = match SchedulingMode::from_period(state.period_ms) {
            SchedulingMode::Idle => return CycleOutcome::Skipped(SkipReason::Idle),
            SchedulingMode::Periodic(_) => self.deliver(&reading),
            SchedulingMode::OnChange => {
                if state.last_reading.as_ref() == Some(&reading) {
                    trace!("[{}] reading unchanged, suppressed", self.name);
                    CycleOutcome::Suppressed
                } else {
                    self.deliver(&reading)
                }
            }
        };

        // Baseline is the last reading seen, notified or not
        state.last_reading = Some(reading);
        outcome
    }

    fn deliver(&self, reading: &Reading) -> CycleOutcome {
        if self.attributes.notify(reading.as_bytes()) {
            trace!("[{}] notified {} bytes", self.name, reading.len());
            CycleOutcome::Notified
        } else {
            debug!("[{}] notification not delivered", self.name);
            CycleOutcome::Undelivered
        }
    }

    pub fn current_period(&self) -> i32 {
        self.state.lock().period_ms
    }

    pub fn mode(&self) -> SchedulingMode {
        SchedulingMode::from_period(self.current_period())
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.lock().subscribed
    }

    pub fn last_reading(&self) -> Option<Reading> {
        self.state.lock().last_reading.clone()
    }

    pub fn source(&self) -> &SampleSource {
        &self.source
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}

#[async_trait]
impl<T, A> TimerHandler for NotificationScheduler<T, A>
where
    T: Timer + 'static,
    A: AttributeService + 'static,
{
    async fn on_timer_fire(&self) {
        let outcome = self.sample_and_decide().await;
        trace!("[{}] timer fire: {:?}", self.name, outcome);
    }
}

#[async_trait]
impl<T, A> AttributeHandler for NotificationScheduler<T, A>
where
    T: Timer + 'static,
    A: AttributeService + 'static,
{
    async fn on_subscription_change(&self, subscribed: bool) {
        NotificationScheduler::on_subscription_change(self, subscribed).await;
    }

    async fn on_period_write(&self, data: &[u8]) {
        if let Err(e) = self.write_period(data) {
            warn!("[{}] ignoring period write: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{DirectSensor, Field, SensorInfo};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    enum TimerCall {
        Start,
        Stop,
        SetPeriod(u32),
    }

    /// Timer that records calls; fires are driven by the test.
    struct ManualTimer {
        running: AtomicBool,
        period_ms: AtomicU32,
        calls: Mutex<Vec<TimerCall>>,
    }

    impl ManualTimer {
        fn new() -> Self {
            Self {
                running: AtomicBool::new(false),
                period_ms: AtomicU32::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<TimerCall> {
            self.calls.lock().clone()
        }

        fn clear_calls(&self) {
            self.calls.lock().clear();
        }
    }

    impl Timer for ManualTimer {
        fn start(&self) {
            self.calls.lock().push(TimerCall::Start);
            self.running.store(true, Ordering::SeqCst);
        }

        fn stop(&self) {
            self.calls.lock().push(TimerCall::Stop);
            self.running.store(false, Ordering::SeqCst);
        }

        fn set_period(&self, period_ms: u32) {
            self.calls.lock().push(TimerCall::SetPeriod(period_ms));
            self.period_ms.store(period_ms, Ordering::SeqCst);
        }

        fn period_ms(&self) -> u32 {
            self.period_ms.load(Ordering::SeqCst)
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingAttributes {
        notifications: Mutex<Vec<Vec<u8>>>,
        period_value: AtomicI32,
    }

    impl RecordingAttributes {
        fn sent(&self) -> Vec<Vec<u8>> {
            self.notifications.lock().clone()
        }
    }

    impl AttributeService for RecordingAttributes {
        fn notify(&self, data: &[u8]) -> bool {
            self.notifications.lock().push(data.to_vec());
            true
        }

        fn set_period_value(&self, period_ms: i32) {
            self.period_value.store(period_ms, Ordering::SeqCst);
        }
    }

    type TestScheduler = NotificationScheduler<ManualTimer, RecordingAttributes>;

    /// Callback source replaying readings in order, empty once exhausted.
    fn scripted(readings: &[[f32; 2]]) -> SampleSource {
        let queue: Mutex<VecDeque<Reading>> =
            Mutex::new(readings.iter().map(|r| Reading::from_fields(r)).collect());
        SampleSource::callback(8, move |buf| match queue.lock().pop_front() {
            Some(reading) => {
                buf[..reading.len()].copy_from_slice(reading.as_bytes());
                reading.len()
            }
            None => 0,
        })
    }

    fn build(
        source: SampleSource,
        default_period_ms: i32,
    ) -> (TestScheduler, Arc<RecordingAttributes>) {
        let attributes = Arc::new(RecordingAttributes::default());
        let scheduler = NotificationScheduler::new(
            source,
            ManualTimer::new(),
            attributes.clone(),
            SchedulerConfig {
                name: "test",
                default_period_ms,
                base_interval_ms: 500,
            },
        );
        (scheduler, attributes)
    }

    fn bytes(fields: [f32; 2]) -> Vec<u8> {
        Reading::from_fields(&fields).as_bytes().to_vec()
    }

    #[test]
    fn test_mode_from_period() {
        assert_eq!(SchedulingMode::from_period(-1), SchedulingMode::Idle);
        assert_eq!(SchedulingMode::from_period(i32::MIN), SchedulingMode::Idle);
        assert_eq!(SchedulingMode::from_period(0), SchedulingMode::OnChange);
        assert_eq!(
            SchedulingMode::from_period(250),
            SchedulingMode::Periodic(250)
        );
    }

    #[test]
    fn test_initial_state() {
        let (scheduler, attributes) = build(scripted(&[]), 1000);
        assert_eq!(scheduler.current_period(), 1000);
        assert_eq!(attributes.period_value.load(Ordering::SeqCst), 1000);
        assert_eq!(scheduler.timer().period_ms(), 1000);
        assert!(!scheduler.timer().is_running());
        assert!(!scheduler.is_subscribed());
        assert!(scheduler.last_reading().is_none());

        // Non-positive default falls back to the base interval
        let (on_change, _) = build(scripted(&[]), 0);
        assert_eq!(on_change.timer().period_ms(), 500);
        assert_eq!(on_change.mode(), SchedulingMode::OnChange);
    }

    #[tokio::test]
    async fn test_idle_suppresses_everything() {
        for period in [-1, -250, i32::MIN] {
            let (scheduler, attributes) = build(scripted(&[[1.0, 2.0]; 4]), 1000);
            scheduler.on_subscription_change(true).await;
            assert!(scheduler.timer().is_running());

            scheduler.set_period(period);
            assert!(!scheduler.timer().is_running());
            assert_eq!(scheduler.mode(), SchedulingMode::Idle);

            // A stray fire is a no-op
            assert_eq!(
                scheduler.sample_and_decide().await,
                CycleOutcome::Skipped(SkipReason::Idle)
            );
            assert!(attributes.sent().is_empty());
        }
    }

    #[tokio::test]
    async fn test_subscribe_while_idle_runs_timer_without_sampling() {
        let reads = Arc::new(AtomicU32::new(0));
        let counter = reads.clone();
        let source = SampleSource::callback(4, move |buf| {
            counter.fetch_add(1, Ordering::SeqCst);
            buf.fill(1);
            4
        });
        let (scheduler, attributes) = build(source, -1);

        assert_eq!(scheduler.on_subscription_change(true).await, None);
        assert!(scheduler.timer().is_running());
        assert_eq!(
            scheduler.sample_and_decide().await,
            CycleOutcome::Skipped(SkipReason::Idle)
        );
        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert!(attributes.sent().is_empty());
    }

    #[tokio::test]
    async fn test_periodic_notifies_every_fire() {
        let (scheduler, attributes) = build(scripted(&[[5.0, 5.0]; 3]), 1000);
        scheduler.set_period(200);
        assert_eq!(scheduler.on_subscription_change(true).await, None);

        for _ in 0..3 {
            assert_eq!(scheduler.sample_and_decide().await, CycleOutcome::Notified);
        }
        assert_eq!(attributes.sent(), vec![bytes([5.0, 5.0]); 3]);
        assert_eq!(scheduler.timer().period_ms(), 200);
    }

    #[tokio::test]
    async fn test_on_change_suppresses_repeats() {
        let (scheduler, attributes) =
            build(scripted(&[[1.0, 1.0], [1.0, 1.0], [1.0, 2.0]]), 1000);
        scheduler.on_subscription_change(true).await;
        scheduler.set_period(0);

        assert_eq!(scheduler.sample_and_decide().await, CycleOutcome::Notified);
        assert_eq!(scheduler.sample_and_decide().await, CycleOutcome::Suppressed);
        assert_eq!(scheduler.sample_and_decide().await, CycleOutcome::Notified);
        assert_eq!(attributes.sent(), vec![bytes([1.0, 1.0]), bytes([1.0, 2.0])]);
    }

    #[tokio::test]
    async fn test_subscribe_in_on_change_samples_immediately() {
        let (scheduler, attributes) = build(scripted(&[[3.0, 4.0]]), 0);

        let outcome = scheduler.on_subscription_change(true).await;
        assert_eq!(outcome, Some(CycleOutcome::Notified));
        assert_eq!(attributes.sent(), vec![bytes([3.0, 4.0])]);
        assert!(scheduler.timer().is_running());
        assert_eq!(scheduler.last_reading(), Some(Reading::from_fields(&[3.0, 4.0])));
    }

    #[tokio::test]
    async fn test_switch_to_on_change_keeps_interval() {
        let (scheduler, _) = build(scripted(&[]), 1000);
        scheduler.on_subscription_change(true).await;
        scheduler.set_period(200);
        scheduler.timer().clear_calls();

        scheduler.set_period(0);
        assert_eq!(scheduler.timer().period_ms(), 200);
        assert!(scheduler.timer().is_running());
        assert!(
            !scheduler
                .timer()
                .calls()
                .iter()
                .any(|call| matches!(call, TimerCall::SetPeriod(_) | TimerCall::Stop))
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_sampling() {
        let (scheduler, attributes) = build(scripted(&[[1.0, 1.0]; 5]), 100);
        scheduler.on_subscription_change(true).await;
        scheduler.on_subscription_change(false).await;
        assert!(!scheduler.timer().is_running());

        for _ in 0..3 {
            assert_eq!(
                scheduler.sample_and_decide().await,
                CycleOutcome::Skipped(SkipReason::Unsubscribed)
            );
        }
        assert!(attributes.sent().is_empty());

        scheduler.on_subscription_change(true).await;
        assert_eq!(scheduler.sample_and_decide().await, CycleOutcome::Notified);
    }

    #[tokio::test]
    async fn test_compares_against_last_seen_reading() {
        let (scheduler, attributes) =
            build(scripted(&[[20.0, 20.0], [20.0, 21.0], [21.0, 21.0]]), 1000);
        scheduler.on_subscription_change(true).await;
        scheduler.set_period(0);

        for _ in 0..3 {
            assert_eq!(scheduler.sample_and_decide().await, CycleOutcome::Notified);
        }
        assert_eq!(
            attributes.sent(),
            vec![bytes([20.0, 20.0]), bytes([20.0, 21.0]), bytes([21.0, 21.0])]
        );
    }

    #[tokio::test]
    async fn test_suppressed_reading_still_becomes_baseline() {
        let (scheduler, attributes) = build(
            scripted(&[[1.0, 0.0], [2.0, 0.0], [2.0, 0.0], [1.0, 0.0]]),
            0,
        );
        scheduler.on_subscription_change(true).await;
        for _ in 0..3 {
            scheduler.sample_and_decide().await;
        }
        assert_eq!(
            attributes.sent(),
            vec![bytes([1.0, 0.0]), bytes([2.0, 0.0]), bytes([1.0, 0.0])]
        );
    }

    #[tokio::test]
    async fn test_truncated_period_write_is_ignored() {
        let (scheduler, attributes) = build(scripted(&[]), 1000);
        scheduler.set_period(300);

        assert!(matches!(
            scheduler.write_period(&[0x10, 0x00]),
            Err(ServiceError::TruncatedWrite(2))
        ));
        AttributeHandler::on_period_write(&scheduler, &[]).await;
        assert_eq!(scheduler.current_period(), 300);
        assert_eq!(attributes.period_value.load(Ordering::SeqCst), 300);
    }

    #[tokio::test]
    async fn test_period_write_parses_little_endian() {
        let (scheduler, attributes) = build(scripted(&[]), 1000);

        assert_eq!(scheduler.write_period(&(-1i32).to_le_bytes()).unwrap(), -1);
        assert_eq!(scheduler.mode(), SchedulingMode::Idle);

        AttributeHandler::on_period_write(&scheduler, &[0xF4, 0x01, 0x00, 0x00, 0xFF]).await;
        assert_eq!(scheduler.current_period(), 500);
        assert_eq!(attributes.period_value.load(Ordering::SeqCst), 500);
        assert_eq!(scheduler.timer().period_ms(), 500);
    }

    #[tokio::test]
    async fn test_positive_period_while_unsubscribed_does_not_start_timer() {
        let (scheduler, _) = build(scripted(&[]), -1);
        scheduler.set_period(250);
        assert_eq!(scheduler.timer().period_ms(), 250);
        assert!(!scheduler.timer().is_running());

        scheduler.on_subscription_change(true).await;
        assert!(scheduler.timer().is_running());
    }

    #[tokio::test]
    async fn test_sample_failures_do_not_stop_scheduling() {
        let (scheduler, attributes) = build(SampleSource::unconfigured(8), 100);
        scheduler.on_subscription_change(true).await;
        assert_eq!(
            scheduler.sample_and_decide().await,
            CycleOutcome::Skipped(SkipReason::SampleFailed)
        );
        assert!(scheduler.timer().is_running());
        assert!(attributes.sent().is_empty());

        let (scheduler, attributes) = scheduler_with_gap();
        scheduler.on_subscription_change(true).await;
        assert_eq!(
            scheduler.sample_and_decide().await,
            CycleOutcome::Skipped(SkipReason::EmptyReading)
        );
        assert_eq!(scheduler.sample_and_decide().await, CycleOutcome::Notified);
        assert_eq!(attributes.sent().len(), 1);
    }

    /// First read is empty, then a real value.
    fn scheduler_with_gap() -> (TestScheduler, Arc<RecordingAttributes>) {
        let calls = AtomicU32::new(0);
        let source = SampleSource::callback(4, move |buf| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                0
            } else {
                buf.copy_from_slice(&7.0f32.to_le_bytes());
                4
            }
        });
        build(source, 100)
    }

    #[tokio::test]
    async fn test_subscription_hook_sees_every_change() {
        let (scheduler, _) = build(scripted(&[]), 1000);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        scheduler.set_subscription_hook(Box::new(move |subscribed| sink.lock().push(subscribed)));

        scheduler.on_subscription_change(true).await;
        scheduler.on_subscription_change(false).await;
        assert_eq!(*seen.lock(), vec![true, false]);
    }

    /// Sensor that stays busy until released by the test.
    struct GatedSensor {
        ready: AtomicBool,
    }

    impl DirectSensor for GatedSensor {
        fn name(&self) -> &'static str {
            "gated"
        }

        fn fields(&self) -> &'static [Field] {
            &[Field::Temperature]
        }

        fn describe(&self) -> Vec<SensorInfo> {
            Vec::new()
        }

        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        fn sample(&self, out: &mut Vec<f32>) {
            out.push(1.0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_period_change_during_sample_is_honoured() {
        let sensor = Arc::new(GatedSensor {
            ready: AtomicBool::new(false),
        });
        let source = SampleSource::direct(sensor.clone())
            .with_ready_wait(Duration::from_millis(1), None);
        let (scheduler, attributes) = build(source, 100);
        let scheduler = Arc::new(scheduler);
        scheduler.on_subscription_change(true).await;

        let cycle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.sample_and_decide().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The write path is not blocked by the pending sample
        scheduler.set_period(-1);
        sensor.ready.store(true, Ordering::SeqCst);

        assert_eq!(
            cycle.await.unwrap(),
            CycleOutcome::Skipped(SkipReason::Idle)
        );
        assert!(attributes.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_timeout_skips_one_cycle_only() {
        let sensor = Arc::new(GatedSensor {
            ready: AtomicBool::new(false),
        });
        let source = SampleSource::direct(sensor.clone())
            .with_ready_wait(Duration::from_millis(1), Some(Duration::from_millis(20)));
        let (scheduler, attributes) = build(source, 100);
        scheduler.on_subscription_change(true).await;

        assert_eq!(
            scheduler.sample_and_decide().await,
            CycleOutcome::Skipped(SkipReason::SampleFailed)
        );
        assert!(scheduler.timer().is_running());
        assert!(attributes.sent().is_empty());

        sensor.ready.store(true, Ordering::SeqCst);
        assert_eq!(scheduler.sample_and_decide().await, CycleOutcome::Notified);
        assert_eq!(attributes.sent(), vec![1.0f32.to_le_bytes().to_vec()]);
    }
}
