//! Packed sensor readings.

/// One sample: an opaque byte buffer, normally a run of little-endian
/// `f32` fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reading(Vec<u8>);

impl Reading {
    /// Bytes per packed field.
    pub const FIELD_SIZE: usize = 4;

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Pack float fields back to back.
    pub fn from_fields(fields: &[f32]) -> Self {
        let mut bytes = Vec::with_capacity(fields.len() * Self::FIELD_SIZE);
        for value in fields {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Self(bytes)
    }

    /// Decode complete 4-byte groups as floats. Trailing bytes are ignored.
    pub fn to_fields(&self) -> Vec<f32> {
        self.0
            .chunks_exact(Self::FIELD_SIZE)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Reading {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
