//! Tagged-union decode of event records.
//!
//! `decode()` resolves the discriminant once and builds an [`Event`]
//! value, so payload-kind mismatches are settled at construction instead
//! of on every field read.

use mobridge_memory::RawAddr;

use crate::record::{kind, EventError, EventRecord, LocationRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Pressed,
    Moved,
    Released,
}

/// One native event, fully decoded.
///
/// Location and widget events carry the address of their secondary
/// record; the host resolves it with [`LocationRecord::from_addr`] /
/// [`WidgetRecord::from_addr`] since only it knows the pointer is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Key {
        key: i32,
        native_key: i32,
        character: u32,
        pressed: bool,
    },
    Pointer {
        phase: PointerPhase,
        x: i32,
        y: i32,
        touch_id: i32,
        state: i32,
    },
    Connection {
        handle: i32,
        op_type: i32,
        result: i32,
    },
    TextBox {
        result: i32,
        length: i32,
    },
    Sensor {
        sensor_type: i32,
        values: [f32; 3],
    },
    Location {
        data: RawAddr,
    },
    Widget {
        data: RawAddr,
    },
    Unknown {
        discriminant: i32,
    },
}

/// Location payload decoded from a [`LocationRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub state: i32,
    pub lat: f64,
    pub lon: f64,
    pub horz_acc: f64,
    pub vert_acc: f64,
    pub alt: f32,
}

impl EventRecord {
    /// Build the tagged union for this record.
    ///
    /// Unrecognized discriminants become [`Event::Unknown`] rather than
    /// an error; the native SDK emits kinds this bridge does not consume.
    pub fn decode(&self) -> Result<Event, EventError> {
        let event = match self.discriminant() {
            k @ (kind::KEY_PRESSED | kind::KEY_RELEASED) => Event::Key {
                key: self.key()?,
                native_key: self.native_key()?,
                character: self.character()?,
                pressed: k == kind::KEY_PRESSED,
            },
            k @ (kind::POINTER_PRESSED | kind::POINTER_DRAGGED | kind::POINTER_RELEASED) => {
                Event::Pointer {
                    phase: match k {
                        kind::POINTER_PRESSED => PointerPhase::Pressed,
                        kind::POINTER_DRAGGED => PointerPhase::Moved,
                        _ => PointerPhase::Released,
                    },
                    x: self.pointer_x()?,
                    y: self.pointer_y()?,
                    touch_id: self.touch_id()?,
                    state: self.touch_state()?,
                }
            }
            kind::CONN => Event::Connection {
                handle: self.conn_handle()?,
                op_type: self.conn_op_type()?,
                result: self.conn_result()?,
            },
            kind::TEXTBOX => Event::TextBox {
                result: self.textbox_result()?,
                length: self.textbox_length()?,
            },
            kind::SENSOR => Event::Sensor {
                sensor_type: self.sensor_type()?,
                values: self.sensor_values()?,
            },
            kind::LOCATION => Event::Location {
                data: self.data_addr(),
            },
            kind::WIDGET => Event::Widget {
                data: self.data_addr(),
            },
            discriminant => Event::Unknown { discriminant },
        };
        Ok(event)
    }
}

impl LocationRecord {
    pub fn decode(&self) -> Location {
        Location {
            state: self.state(),
            lat: self.lat(),
            lon: self.lon(),
            horz_acc: self.horz_acc(),
            vert_acc: self.vert_acc(),
            alt: self.alt(),
        }
    }
}
