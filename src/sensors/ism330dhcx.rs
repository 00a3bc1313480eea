//! ISM330DHCX 6-axis IMU adapter.
//!
//! Packs acceleration (m/s²) and angular rate (rad/s) for x, y, z into a
//! 24-byte reading.

use super::{DirectSensor, Field, SensorInfo};

const FIELDS: &[Field] = &[
    Field::AccelX,
    Field::AccelY,
    Field::AccelZ,
    Field::GyroX,
    Field::GyroY,
    Field::GyroZ,
];

const G_TO_MS2: f32 = 9.80665;
const DEG_TO_RAD: f32 = 0.017453;

/// Three-axis sample as returned by the driver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AxisData {
    fn scaled(self, factor: f32) -> [f32; 3] {
        [self.x * factor, self.y * factor, self.z * factor]
    }
}

/// Raw register access to an ISM330DHCX.
pub trait Ism330dhcxDriver: Send + Sync {
    /// True once both accelerometer and gyroscope data are available.
    fn check_status(&self) -> bool;

    /// Acceleration in g.
    fn accel(&self) -> AxisData;

    /// Angular rate in degrees per second.
    fn gyro(&self) -> AxisData;
}

/// [`DirectSensor`] over an ISM330DHCX driver.
pub struct Ism330dhcxSensor<D> {
    driver: D,
    sensor_id: i32,
}

impl<D: Ism330dhcxDriver> Ism330dhcxSensor<D> {
    /// `sensor_id` identifies the accelerometer; the gyroscope takes the next id.
    pub fn new(driver: D, sensor_id: i32) -> Self {
        Self { driver, sensor_id }
    }
}

impl<D: Ism330dhcxDriver> DirectSensor for Ism330dhcxSensor<D> {
    fn name(&self) -> &'static str {
        "ISM330DHCX"
    }

    fn fields(&self) -> &'static [Field] {
        FIELDS
    }

    fn describe(&self) -> Vec<SensorInfo> {
        FIELDS
            .iter()
            .map(|&field| {
                let accel = matches!(field, Field::AccelX | Field::AccelY | Field::AccelZ);
                // 16 g and 4000 deg/s full scale
                let (range, resolution) = if accel {
                    (156.9064, 0.0041384)
                } else {
                    (69.812, 0.0024434)
                };
                SensorInfo {
                    name: "ISM330DHCX",
                    field,
                    sensor_id: if accel {
                        self.sensor_id
                    } else {
                        self.sensor_id + 1
                    },
                    min_value: -range,
                    max_value: range,
                    resolution,
                    min_delay_us: 9616,
                }
            })
            .collect()
    }

    fn is_ready(&self) -> bool {
        self.driver.check_status()
    }

    fn sample(&self, out: &mut Vec<f32>) {
        out.extend(self.driver.accel().scaled(G_TO_MS2));
        out.extend(self.driver.gyro().scaled(DEG_TO_RAD));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SampleSource;
    use std::sync::Arc;

    struct LevelImu;

    impl Ism330dhcxDriver for LevelImu {
        fn check_status(&self) -> bool {
            true
        }

        fn accel(&self) -> AxisData {
            AxisData {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            }
        }

        fn gyro(&self) -> AxisData {
            AxisData {
                x: 90.0,
                y: 0.0,
                z: -90.0,
            }
        }
    }

    #[tokio::test]
    async fn test_reading_converts_units() {
        let source = SampleSource::direct(Arc::new(Ism330dhcxSensor::new(LevelImu, -2)));
        assert_eq!(source.capacity(), 24);

        let fields = source.read().await.unwrap().to_fields();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0], 0.0);
        assert_eq!(fields[2], G_TO_MS2);
        assert!((fields[3] - 1.57077).abs() < 1e-4);
        assert!((fields[5] + 1.57077).abs() < 1e-4);
    }

    #[test]
    fn test_describe_splits_accel_and_gyro() {
        let info = Ism330dhcxSensor::new(LevelImu, -2).describe();
        assert_eq!(info.len(), 6);
        assert_eq!(info[0].sensor_id, -2);
        assert_eq!(info[3].sensor_id, -1);
        assert_eq!(info[0].max_value, 156.9064);
        assert_eq!(info[5].min_value, -69.812);
    }
}
