//! Mobridge Scripting System
//!
//! JavaScript execution via QuickJS plus the bridge function table that
//! exposes the memory arena, event decoding, geometry boxes, and string
//! codec to scripts as `Sys*` globals.

pub mod bindings;
pub mod runtime;

pub use bindings::{register_bridge, SharedArena};
pub use runtime::{ScriptError, ScriptRuntime};

pub use rquickjs;
