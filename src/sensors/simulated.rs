//! Simulated sensor drivers for running without hardware.
//!
//! Values follow a slow random walk and are quantised, so consecutive
//! samples are often identical. That keeps on-change mode observable.

use super::bme280::Bme280Driver;
use super::ism330dhcx::{AxisData, Ism330dhcxDriver};
use parking_lot::Mutex;
use rand::Rng;
use std::time::{Duration, Instant};

/// Conversion window: the device is busy for `busy` out of every `cycle`.
struct ConversionClock {
    started: Instant,
    cycle: Duration,
    busy: Duration,
}

impl ConversionClock {
    fn new(cycle: Duration, busy: Duration) -> Self {
        Self {
            started: Instant::now(),
            cycle,
            busy,
        }
    }

    fn is_busy(&self) -> bool {
        let cycle_ms = self.cycle.as_millis().max(1);
        let phase = self.started.elapsed().as_millis() % cycle_ms;
        phase < self.busy.as_millis()
    }
}

fn walk(value: &mut f32, step: f32, min: f32, max: f32, quantum: f32) -> f32 {
    let mut rng = rand::thread_rng();
    // Hold still most of the time
    if rng.gen_bool(0.3) {
        *value = (*value + rng.gen_range(-step..=step)).clamp(min, max);
    }
    (*value / quantum).round() * quantum
}

struct EnvState {
    temperature: f32,
    pressure: f32,
    humidity: f32,
}

/// Simulated BME280.
pub struct SimulatedBme280 {
    clock: ConversionClock,
    state: Mutex<EnvState>,
}

impl SimulatedBme280 {
    pub fn new() -> Self {
        Self {
            clock: ConversionClock::new(Duration::from_millis(100), Duration::from_millis(10)),
            state: Mutex::new(EnvState {
                temperature: 21.0,
                pressure: 101_325.0,
                humidity: 45.0,
            }),
        }
    }
}

impl Default for SimulatedBme280 {
    fn default() -> Self {
        Self::new()
    }
}

impl Bme280Driver for SimulatedBme280 {
    fn is_measuring(&self) -> bool {
        self.clock.is_busy()
    }

    fn read_temp_c(&self) -> f32 {
        let mut state = self.state.lock();
        walk(&mut state.temperature, 0.2, -10.0, 45.0, 0.1)
    }

    fn read_float_pressure(&self) -> f32 {
        let mut state = self.state.lock();
        walk(&mut state.pressure, 20.0, 95_000.0, 105_000.0, 10.0)
    }

    fn read_float_humidity(&self) -> f32 {
        let mut state = self.state.lock();
        walk(&mut state.humidity, 0.5, 0.0, 100.0, 0.5)
    }
}

/// Simulated ISM330DHCX lying roughly flat with small jitter.
pub struct SimulatedIsm330dhcx {
    clock: ConversionClock,
    accel: Mutex<AxisData>,
    gyro: Mutex<AxisData>,
}

impl SimulatedIsm330dhcx {
    pub fn new() -> Self {
        Self {
            clock: ConversionClock::new(Duration::from_millis(20), Duration::from_millis(2)),
            accel: Mutex::new(AxisData {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            }),
            gyro: Mutex::new(AxisData::default()),
        }
    }
}

impl Default for SimulatedIsm330dhcx {
    fn default() -> Self {
        Self::new()
    }
}

impl Ism330dhcxDriver for SimulatedIsm330dhcx {
    fn check_status(&self) -> bool {
        !self.clock.is_busy()
    }

    fn accel(&self) -> AxisData {
        let mut a = self.accel.lock();
        AxisData {
            x: walk(&mut a.x, 0.01, -0.2, 0.2, 0.01),
            y: walk(&mut a.y, 0.01, -0.2, 0.2, 0.01),
            z: walk(&mut a.z, 0.01, 0.8, 1.2, 0.01),
        }
    }

    fn gyro(&self) -> AxisData {
        let mut g = self.gyro.lock();
        AxisData {
            x: walk(&mut g.x, 1.0, -20.0, 20.0, 0.5),
            y: walk(&mut g.y, 1.0, -20.0, 20.0, 0.5),
            z: walk(&mut g.z, 1.0, -20.0, 20.0, 0.5),
        }
    }
}
