//! Mobridge Memory
//!
//! Raw memory services for the scripting bridge:
//! - Buffer arena with generation-validated handles
//! - Typed element views over untyped byte buffers
//! - Raw address escape for native out-parameters
//! - Fixed-width bit operations

pub mod arena;
pub mod bits;

pub use arena::{scalar_width, BufferArena, BufferHandle, MemoryError, RawAddr, ScalarKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
