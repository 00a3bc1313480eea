//! Service and characteristic UUIDs.
//!
//! Every UUID128 shares the base `5FE0xxxx-005E-4761-9A7E-947AA3C505FE`;
//! only the 16-bit `xxxx` part differs.

use uuid::Uuid;

/// Measurement period characteristic, shared by every sensor service.
/// `i32`, read + write, milliseconds between measurements
/// (-1 stops reading, 0 reports on change).
pub const MEASUREMENT_PERIOD: u16 = 0x0001;

/// BME280 environmental service.
pub const BME280_SERVICE: u16 = 0x0100;
/// BME280 data: temperature °C, pressure hPa, humidity %RH (3 × f32).
pub const BME280_DATA: u16 = 0x0101;

/// ISM330DHCX IMU service.
pub const ISM330DHCX_SERVICE: u16 = 0x0200;
/// ISM330DHCX data: ax, ay, az, gx, gy, gz (6 × f32).
pub const ISM330DHCX_DATA: u16 = 0x0201;

const BASE: u128 = 0x5FE0_0000_005E_4761_9A7E_947A_A3C5_05FE;

/// Expand a 16-bit id into the full UUID128.
pub const fn sfe_uuid(short: u16) -> Uuid {
    Uuid::from_u128(BASE | ((short as u128) << 96))
}

/// Short id of a UUID built on the shared base, if it is one.
pub fn short_id(uuid: &Uuid) -> Option<u16> {
    let value = uuid.as_u128();
    let short = ((value >> 96) & 0xFFFF) as u16;
    (value & !(0xFFFF_u128 << 96) == BASE).then_some(short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_uuid_string() {
        assert_eq!(
            sfe_uuid(MEASUREMENT_PERIOD).to_string(),
            "5fe00001-005e-4761-9a7e-947aa3c505fe"
        );
    }

    #[test]
    fn test_little_endian_byte_table() {
        // Over-the-air UUID128 byte order is little-endian
        let mut bytes = sfe_uuid(BME280_DATA).as_bytes().to_owned();
        bytes.reverse();
        assert_eq!(
            bytes,
            [
                0xFE, 0x05, 0xC5, 0xA3, 0x7A, 0x94, 0x7E, 0x9A, 0x61, 0x47, 0x5E, 0x00, 0x01, 0x01,
                0xE0, 0x5F
            ]
        );
    }

    #[test]
    fn test_short_id_round_trips_base_only() {
        assert_eq!(short_id(&sfe_uuid(ISM330DHCX_SERVICE)), Some(0x0200));
        assert_eq!(short_id(&Uuid::nil()), None);
    }
}
