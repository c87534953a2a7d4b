//! Mobridge Text Services
//!
//! Narrow/wide string conversion over arena buffers, the text-object
//! wrapper around the native font capability, and string-resource
//! loading through the native resource store.

pub mod codec;
pub mod resource;
pub mod screen;
pub mod textobj;

pub use codec::{narrow_to_wide, wide_len, wide_to_narrow, WIDE_UNIT};
pub use resource::{
    load_string_resource, NativeResourceStore, ResourceError, ResourceId, ResourceLoadError,
};
pub use screen::pack_rgb;
pub use textobj::{NativeFont, TextObject};
