//! BME280 environmental sensor adapter.
//!
//! Packs temperature (°C), pressure (hPa) and relative humidity (%RH)
//! into a 12-byte reading.

use super::{DirectSensor, Field, SensorInfo};

const FIELDS: &[Field] = &[Field::Temperature, Field::Pressure, Field::Humidity];

const PA_TO_HPA: f32 = 0.01;

/// Raw register access to a BME280.
pub trait Bme280Driver: Send + Sync {
    /// True while a conversion is in progress.
    fn is_measuring(&self) -> bool;

    fn read_temp_c(&self) -> f32;

    /// Pressure in pascal.
    fn read_float_pressure(&self) -> f32;

    fn read_float_humidity(&self) -> f32;
}

/// [`DirectSensor`] over a BME280 driver.
pub struct Bme280Sensor<D> {
    driver: D,
    sensor_id: i32,
}

impl<D: Bme280Driver> Bme280Sensor<D> {
    /// `sensor_id` is the id of the temperature field; pressure and
    /// humidity take the next two ids.
    pub fn new(driver: D, sensor_id: i32) -> Self {
        Self { driver, sensor_id }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: Bme280Driver> DirectSensor for Bme280Sensor<D> {
    fn name(&self) -> &'static str {
        "BME280"
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn describe(&self) -> Vec<SensorInfo> {
        let info = |offset: i32, field, min_value, max_value, resolution| SensorInfo {
            name: "BME280",
            field,
            sensor_id: self.sensor_id + offset,
            min_value,
            max_value,
            resolution,
            min_delay_us: 12050,
        };
        vec![
            info(0, Field::Temperature, 0.0, 65.0, 1.0),
            info(1, Field::Pressure, 300.0, 1100.0, 18.0),
            info(2, Field::Humidity, 0.0, 100.0, 0.008),
        ]
    }

    fn is_ready(&self) -> bool {
        !self.driver.is_measuring()
    }

    fn sample(&self, out: &mut Vec<f32>) {
        out.push(self.driver.read_temp_c());
        out.push(self.driver.read_float_pressure() * PA_TO_HPA);
        out.push(self.driver.read_float_humidity());
    }
}
