//! Mobridge Event Decoding
//!
//! Pure per-record decode of the native platform's fixed-layout event
//! records. The native side populates a record through a pointer obtained
//! from the buffer arena; this crate only reads.
//!
//! Every accessor checks the record discriminant before touching the
//! payload bytes, and [`record::EventRecord::decode`] builds an explicit
//! tagged union so hosts can match once instead of probing fields.

pub mod decode;
pub mod record;
pub mod widget;

pub use decode::{Event, Location, PointerPhase};
pub use record::{kind, EventError, EventRecord, LocationRecord};
pub use widget::{widget_kind, WidgetEvent, WidgetRecord};
