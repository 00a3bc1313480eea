//! Sensor sampling for the notification services.
//!
//! A [`SampleSource`] turns one or more physical sensor channels into a
//! single fixed-size [`Reading`]. Concrete hardware is reached through the
//! [`DirectSensor`] trait, implemented here for the BME280 environmental
//! sensor and the ISM330DHCX IMU.

pub mod bme280;
pub mod ism330dhcx;
pub mod reading;
pub mod simulated;
pub mod source;

pub use bme280::{Bme280Driver, Bme280Sensor};
pub use ism330dhcx::{AxisData, Ism330dhcxDriver, Ism330dhcxSensor};
pub use reading::Reading;
pub use source::{MeasureCallback, SampleSource};

use strum::{Display, EnumCount};

/// Logical field of a sensor reading. Each field packs as one `f32`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display, EnumCount)]
pub enum Field {
    #[strum(to_string = "temperature")]
    Temperature,
    #[strum(to_string = "pressure")]
    Pressure,
    #[strum(to_string = "humidity")]
    Humidity,
    #[strum(to_string = "accel.x")]
    AccelX,
    #[strum(to_string = "accel.y")]
    AccelY,
    #[strum(to_string = "accel.z")]
    AccelZ,
    #[strum(to_string = "gyro.x")]
    GyroX,
    #[strum(to_string = "gyro.y")]
    GyroY,
    #[strum(to_string = "gyro.z")]
    GyroZ,
}

impl Field {
    /// Unit the field is reported in.
    pub fn unit(&self) -> &'static str {
        match self {
            Field::Temperature => "°C",
            Field::Pressure => "hPa",
            Field::Humidity => "%RH",
            Field::AccelX | Field::AccelY | Field::AccelZ => "m/s²",
            Field::GyroX | Field::GyroY | Field::GyroZ => "rad/s",
        }
    }
}

/// Static description of one sensor field.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorInfo {
    pub name: &'static str,
    pub field: Field,
    pub sensor_id: i32,
    pub min_value: f32,
    pub max_value: f32,
    pub resolution: f32,
    /// Minimum delay between events in microseconds.
    pub min_delay_us: u32,
}

/// A physical sensor that can be sampled directly.
///
/// Implementations read every field from the underlying driver and push
/// them in the order given by [`fields`](DirectSensor::fields).
pub trait DirectSensor: Send + Sync {
    /// Sensor part name, e.g. `"BME280"`.
    fn name(&self) -> &'static str;

    /// Fields in packing order.
    fn fields(&self) -> &'static [Field];

    /// Metadata for each field, in packing order.
    fn describe(&self) -> Vec<SensorInfo>;

    /// False while the device is mid-conversion.
    fn is_ready(&self) -> bool;

    /// Read all fields into `out`. Only called once [`is_ready`](DirectSensor::is_ready)
    /// returned true.
    fn sample(&self, out: &mut Vec<f32>);

    /// Size in bytes of one packed reading.
    fn reading_len(&self) -> usize {
        self.fields().len() * Reading::FIELD_SIZE
    }
}
