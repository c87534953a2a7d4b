//! Native event record layout and field accessors.
//!
//! The record shape is fixed by the native SDK and is not ours to change:
//! a 32-byte struct with an `i32` discriminant at offset 0, a 16-byte
//! payload union starting at offset 4, and a generic data address at
//! offset 24. Location events carry their payload in a secondary 48-byte
//! record reached through that address. Fields are native-endian; these
//! are in-process structs, not wire data.

use mobridge_memory::RawAddr;
use thiserror::Error;

/// Errors from record parsing and payload access.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    #[error("{expected} accessor used on event with discriminant {found}")]
    InvalidDiscriminant { expected: &'static str, found: i32 },

    #[error("event record needs {need} bytes, got {got}")]
    RecordTruncated { need: usize, got: usize },
}

/// Event discriminant values, fixed by the native ABI.
pub mod kind {
    pub const KEY_PRESSED: i32 = 1;
    pub const KEY_RELEASED: i32 = 2;
    pub const POINTER_PRESSED: i32 = 8;
    pub const POINTER_DRAGGED: i32 = 9;
    pub const POINTER_RELEASED: i32 = 10;
    pub const CONN: i32 = 11;
    pub const TEXTBOX: i32 = 19;
    pub const SENSOR: i32 = 20;
    pub const LOCATION: i32 = 21;
    pub const WIDGET: i32 = 22;
}

const KEY_KINDS: &[i32] = &[kind::KEY_PRESSED, kind::KEY_RELEASED];
const POINTER_KINDS: &[i32] = &[
    kind::POINTER_PRESSED,
    kind::POINTER_DRAGGED,
    kind::POINTER_RELEASED,
];

/// A decoded-on-demand view of one native event record.
///
/// Holds its own copy of the record bytes; accessors are pure reads with
/// a discriminant precondition enforced per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    bytes: [u8; Self::SIZE],
}

impl EventRecord {
    pub const SIZE: usize = 32;

    const OFF_TYPE: usize = 0;
    const OFF_PAYLOAD: usize = 4;
    const OFF_DATA: usize = 24;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        if bytes.len() < Self::SIZE {
            return Err(EventError::RecordTruncated {
                need: Self::SIZE,
                got: bytes.len(),
            });
        }
        let mut copy = [0u8; Self::SIZE];
        copy.copy_from_slice(&bytes[..Self::SIZE]);
        Ok(Self { bytes: copy })
    }

    /// Copy a record out of memory the native layer populated.
    ///
    /// # Safety
    /// `addr` must point at least [`EventRecord::SIZE`] readable bytes.
    pub unsafe fn from_addr(addr: RawAddr) -> Self {
        Self {
            bytes: core::ptr::read_unaligned(addr.as_ptr() as *const [u8; Self::SIZE]),
        }
    }

    /// The record discriminant; meaningful for every record.
    pub fn discriminant(&self) -> i32 {
        self.i32_at(Self::OFF_TYPE)
    }

    /// The generic data address; carries a pointer to a secondary record
    /// for location and widget events.
    pub fn data_addr(&self) -> RawAddr {
        RawAddr::from_bits(self.u64_at(Self::OFF_DATA))
    }

    // Key payload.

    pub fn key(&self) -> Result<i32, EventError> {
        self.expect("key", KEY_KINDS)?;
        Ok(self.i32_at(Self::OFF_PAYLOAD))
    }

    pub fn native_key(&self) -> Result<i32, EventError> {
        self.expect("key", KEY_KINDS)?;
        Ok(self.i32_at(Self::OFF_PAYLOAD + 4))
    }

    pub fn character(&self) -> Result<u32, EventError> {
        self.expect("key", KEY_KINDS)?;
        Ok(self.u32_at(Self::OFF_PAYLOAD + 8))
    }

    // Pointer/touch payload.

    pub fn pointer_x(&self) -> Result<i32, EventError> {
        self.expect("pointer", POINTER_KINDS)?;
        Ok(self.i32_at(Self::OFF_PAYLOAD))
    }

    pub fn pointer_y(&self) -> Result<i32, EventError> {
        self.expect("pointer", POINTER_KINDS)?;
        Ok(self.i32_at(Self::OFF_PAYLOAD + 4))
    }

    pub fn touch_id(&self) -> Result<i32, EventError> {
        self.expect("pointer", POINTER_KINDS)?;
        Ok(self.i32_at(Self::OFF_PAYLOAD + 8))
    }

    pub fn touch_state(&self) -> Result<i32, EventError> {
        self.expect("pointer", POINTER_KINDS)?;
        Ok(self.i32_at(Self::OFF_PAYLOAD + 12))
    }

    // Connection payload.

    pub fn conn_handle(&self) -> Result<i32, EventError> {
        self.expect("connection", &[kind::CONN])?;
        Ok(self.i32_at(Self::OFF_PAYLOAD))
    }

    pub fn conn_op_type(&self) -> Result<i32, EventError> {
        self.expect("connection", &[kind::CONN])?;
        Ok(self.i32_at(Self::OFF_PAYLOAD + 4))
    }

    pub fn conn_result(&self) -> Result<i32, EventError> {
        self.expect("connection", &[kind::CONN])?;
        Ok(self.i32_at(Self::OFF_PAYLOAD + 8))
    }

    // Text-entry payload.

    pub fn textbox_result(&self) -> Result<i32, EventError> {
        self.expect("text box", &[kind::TEXTBOX])?;
        Ok(self.i32_at(Self::OFF_PAYLOAD))
    }

    pub fn textbox_length(&self) -> Result<i32, EventError> {
        self.expect("text box", &[kind::TEXTBOX])?;
        Ok(self.i32_at(Self::OFF_PAYLOAD + 4))
    }

    // Sensor payload.

    pub fn sensor_type(&self) -> Result<i32, EventError> {
        self.expect("sensor", &[kind::SENSOR])?;
        Ok(self.i32_at(Self::OFF_PAYLOAD))
    }

    pub fn sensor_values(&self) -> Result<[f32; 3], EventError> {
        self.expect("sensor", &[kind::SENSOR])?;
        Ok([
            self.f32_at(Self::OFF_PAYLOAD + 4),
            self.f32_at(Self::OFF_PAYLOAD + 8),
            self.f32_at(Self::OFF_PAYLOAD + 12),
        ])
    }

    fn expect(&self, expected: &'static str, kinds: &[i32]) -> Result<(), EventError> {
        let found = self.discriminant();
        if kinds.contains(&found) {
            Ok(())
        } else {
            Err(EventError::InvalidDiscriminant { expected, found })
        }
    }

    fn i32_at(&self, off: usize) -> i32 {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.bytes[off..off + 4]);
        i32::from_ne_bytes(b)
    }

    fn u32_at(&self, off: usize) -> u32 {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.bytes[off..off + 4]);
        u32::from_ne_bytes(b)
    }

    fn f32_at(&self, off: usize) -> f32 {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.bytes[off..off + 4]);
        f32::from_ne_bytes(b)
    }

    fn u64_at(&self, off: usize) -> u64 {
        let mut b = [0u8; 8];
        b.copy_from_slice(&self.bytes[off..off + 8]);
        u64::from_ne_bytes(b)
    }
}

/// Secondary location record reached through the event's data address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRecord {
    bytes: [u8; Self::SIZE],
}

impl LocationRecord {
    pub const SIZE: usize = 48;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        if bytes.len() < Self::SIZE {
            return Err(EventError::RecordTruncated {
                need: Self::SIZE,
                got: bytes.len(),
            });
        }
        let mut copy = [0u8; Self::SIZE];
        copy.copy_from_slice(&bytes[..Self::SIZE]);
        Ok(Self { bytes: copy })
    }

    /// Copy a record out of memory the native layer populated.
    ///
    /// # Safety
    /// `addr` must point at least [`LocationRecord::SIZE`] readable bytes.
    pub unsafe fn from_addr(addr: RawAddr) -> Self {
        Self {
            bytes: core::ptr::read_unaligned(addr.as_ptr() as *const [u8; Self::SIZE]),
        }
    }

    pub fn state(&self) -> i32 {
        self.i32_at(0)
    }

    pub fn lat(&self) -> f64 {
        self.f64_at(8)
    }

    pub fn lon(&self) -> f64 {
        self.f64_at(16)
    }

    pub fn horz_acc(&self) -> f64 {
        self.f64_at(24)
    }

    pub fn vert_acc(&self) -> f64 {
        self.f64_at(32)
    }

    pub fn alt(&self) -> f32 {
        self.f32_at(40)
    }

    fn i32_at(&self, off: usize) -> i32 {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.bytes[off..off + 4]);
        i32::from_ne_bytes(b)
    }

    fn f32_at(&self, off: usize) -> f32 {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.bytes[off..off + 4]);
        f32::from_ne_bytes(b)
    }

    fn f64_at(&self, off: usize) -> f64 {
        let mut b = [0u8; 8];
        b.copy_from_slice(&self.bytes[off..off + 8]);
        f64::from_ne_bytes(b)
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    fn pointer_record() -> EventRecord {
        let mut raw = [0u8; EventRecord::SIZE];
        put_i32(&mut raw, 0, kind::POINTER_PRESSED);
        put_i32(&mut raw, 4, 120);
        put_i32(&mut raw, 8, 340);
        put_i32(&mut raw, 12, 2);
        put_i32(&mut raw, 16, 1);
        EventRecord::from_bytes(&raw).unwrap()
    }

    #[test]
    fn pointer_fields_decode() {
        let record = pointer_record();
        assert_eq!(record.discriminant(), kind::POINTER_PRESSED);
        assert_eq!(record.pointer_x().unwrap(), 120);
        assert_eq!(record.pointer_y().unwrap(), 340);
        assert_eq!(record.touch_id().unwrap(), 2);
        assert_eq!(record.touch_state().unwrap(), 1);
    }

    #[test]
    fn cross_kind_access_is_rejected() {
        let record = pointer_record();
        assert_eq!(
            record.sensor_values(),
            Err(EventError::InvalidDiscriminant {
                expected: "sensor",
                found: kind::POINTER_PRESSED,
            })
        );
        assert!(record.key().is_err());
        assert!(record.conn_handle().is_err());
    }

    #[test]
    fn key_fields_decode() {
        let mut raw = [0u8; EventRecord::SIZE];
        put_i32(&mut raw, 0, kind::KEY_PRESSED);
        put_i32(&mut raw, 4, 13);
        put_i32(&mut raw, 8, 66);
        put_u32(&mut raw, 12, 'a' as u32);
        let record = EventRecord::from_bytes(&raw).unwrap();

        assert_eq!(record.key().unwrap(), 13);
        assert_eq!(record.native_key().unwrap(), 66);
        assert_eq!(record.character().unwrap(), 'a' as u32);
    }

    #[test]
    fn sensor_fields_decode() {
        let mut raw = [0u8; EventRecord::SIZE];
        put_i32(&mut raw, 0, kind::SENSOR);
        put_i32(&mut raw, 4, 3);
        put_f32(&mut raw, 8, 0.5);
        put_f32(&mut raw, 12, -1.5);
        put_f32(&mut raw, 16, 9.81);
        let record = EventRecord::from_bytes(&raw).unwrap();

        assert_eq!(record.sensor_type().unwrap(), 3);
        assert_eq!(record.sensor_values().unwrap(), [0.5, -1.5, 9.81]);
    }

    #[test]
    fn truncated_record_is_rejected() {
        let raw = [0u8; 16];
        assert_eq!(
            EventRecord::from_bytes(&raw),
            Err(EventError::RecordTruncated { need: 32, got: 16 })
        );
    }

    #[test]
    fn location_record_fields() {
        let mut raw = [0u8; LocationRecord::SIZE];
        put_i32(&mut raw, 0, 2);
        put_f64(&mut raw, 8, 59.3293);
        put_f64(&mut raw, 16, 18.0686);
        put_f64(&mut raw, 24, 5.0);
        put_f64(&mut raw, 32, 8.0);
        put_f32(&mut raw, 40, 28.5);
        let record = LocationRecord::from_bytes(&raw).unwrap();

        assert_eq!(record.state(), 2);
        assert_eq!(record.lat(), 59.3293);
        assert_eq!(record.lon(), 18.0686);
        assert_eq!(record.horz_acc(), 5.0);
        assert_eq!(record.vert_acc(), 8.0);
        assert_eq!(record.alt(), 28.5);
    }

    #[test]
    fn data_addr_round_trips() {
        let mut raw = [0u8; EventRecord::SIZE];
        put_i32(&mut raw, 0, kind::LOCATION);
        put_u64(&mut raw, 24, 0xDEAD_BEEF);
        let record = EventRecord::from_bytes(&raw).unwrap();
        assert_eq!(record.data_addr().to_bits(), 0xDEAD_BEEF);
    }
}
