//! Mobridge Geometry Values
//!
//! Point and rect value objects boxed in arena memory, plus the copy-data
//! parameter block handed to the native data-copy call. The native layer
//! reads these structs through their buffer address, so the field layout
//! is part of the ABI: consecutive i32 fields, no padding.

pub mod copydata;
pub mod shapes;

pub use copydata::CopyDataRequest;
pub use shapes::{PointBox, RectBox};
