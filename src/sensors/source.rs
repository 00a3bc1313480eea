//! Sample source: the read side of a sensor service.
//!
//! A source is either backed by a [`DirectSensor`] or by a measure
//! callback that fills a buffer. The choice is made at construction and
//! fixes the reading length for the lifetime of the source.

use super::{DirectSensor, Reading, SensorInfo};
use crate::error::SampleError;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Fills the buffer and returns how many bytes are valid.
pub type MeasureCallback = Box<dyn Fn(&mut [u8]) -> usize + Send + Sync>;

enum Strategy {
    Direct(Arc<dyn DirectSensor>),
    Callback(MeasureCallback),
    Unconfigured,
}

/// Produces fixed-size readings for one sensor service.
pub struct SampleSource {
    strategy: Strategy,
    capacity: usize,
    ready_poll: Duration,
    ready_timeout: Option<Duration>,
}

impl SampleSource {
    const DEFAULT_READY_POLL: Duration = Duration::from_millis(2);

    /// Sample a physical sensor. The reading length is the sensor's field
    /// count times four bytes.
    pub fn direct(sensor: Arc<dyn DirectSensor>) -> Self {
        Self {
            capacity: sensor.reading_len(),
            strategy: Strategy::Direct(sensor),
            ready_poll: Self::DEFAULT_READY_POLL,
            ready_timeout: None,
        }
    }

    /// Sample through a callback writing into a buffer of `capacity` bytes.
    pub fn callback<F>(capacity: usize, callback: F) -> Self
    where
        F: Fn(&mut [u8]) -> usize + Send + Sync + 'static,
    {
        Self {
            strategy: Strategy::Callback(Box::new(callback)),
            capacity,
            ready_poll: Self::DEFAULT_READY_POLL,
            ready_timeout: None,
        }
    }

    /// A source with nothing behind it. Every read fails with
    /// [`SampleError::NoSource`].
    pub fn unconfigured(capacity: usize) -> Self {
        Self {
            strategy: Strategy::Unconfigured,
            capacity,
            ready_poll: Self::DEFAULT_READY_POLL,
            ready_timeout: None,
        }
    }

    /// Configure how a not-ready direct sensor is waited on.
    ///
    /// `timeout == None` waits until the hardware reports ready.
    pub fn with_ready_wait(mut self, poll: Duration, timeout: Option<Duration>) -> Self {
        self.ready_poll = poll.max(Duration::from_millis(1));
        self.ready_timeout = timeout;
        self
    }

    /// Reading length in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn kind(&self) -> &'static str {
        match &self.strategy {
            Strategy::Direct(sensor) => sensor.name(),
            Strategy::Callback(_) => "callback",
            Strategy::Unconfigured => "unconfigured",
        }
    }

    /// Field metadata when backed by a direct sensor.
    pub fn describe(&self) -> Vec<SensorInfo> {
        match &self.strategy {
            Strategy::Direct(sensor) => sensor.describe(),
            _ => Vec::new(),
        }
    }

    /// Take one reading.
    ///
    /// A direct sensor that is mid-conversion is polled until ready, which
    /// suspends the calling task. Callback results longer than the
    /// capacity are clamped; shorter ones come back short (possibly empty).
    pub async fn read(&self) -> Result<Reading, SampleError> {
        match &self.strategy {
            Strategy::Direct(sensor) => {
                self.wait_ready(sensor.as_ref()).await?;

                let mut fields = Vec::with_capacity(sensor.fields().len());
                sensor.sample(&mut fields);

                let mut bytes = Reading::from_fields(&fields).as_bytes().to_vec();
                bytes.truncate(self.capacity);
                Ok(Reading::from_bytes(bytes))
            }
            Strategy::Callback(callback) => {
                let mut buf = vec![0u8; self.capacity];
                let len = callback(&mut buf).min(self.capacity);
                buf.truncate(len);
                Ok(Reading::from_bytes(buf))
            }
            Strategy::Unconfigured => Err(SampleError::NoSource),
        }
    }

    async fn wait_ready(&self, sensor: &dyn DirectSensor) -> Result<(), SampleError> {
        let started = Instant::now();
        let mut polls = 0u32;

        while !sensor.is_ready() {
            let waited = started.elapsed();
            if let Some(timeout) = self.ready_timeout
                && waited >= timeout
            {
                return Err(SampleError::NotReady {
                    waited_ms: waited.as_millis() as u64,
                });
            }
            polls += 1;
            tokio::time::sleep(self.ready_poll).await;
        }

        if polls > 0 {
            debug!(
                "{} ready after {} polls ({:?})",
                sensor.name(),
                polls,
                started.elapsed()
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for SampleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSource")
            .field("kind", &self.kind())
            .field("capacity", &self.capacity)
            .field("ready_timeout", &self.ready_timeout)
            .finish()
    }
}
