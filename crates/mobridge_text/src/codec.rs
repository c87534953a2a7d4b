//! Narrow/wide string conversion.
//!
//! Wide strings are zero-terminated sequences of 2-byte units stored in
//! arena buffers, matching the platform's wchar. Conversion covers the
//! 0-255 code point range only: widening maps each byte to a unit,
//! narrowing truncates each unit to its low 8 bits. The truncation is a
//! documented property of the boundary, not a bug to fix.

use mobridge_memory::{BufferArena, BufferHandle, MemoryError};

/// Width in bytes of one wide unit.
pub const WIDE_UNIT: usize = 2;

/// Widen a byte string into a freshly allocated wide buffer.
///
/// Allocates `(len + 1) * WIDE_UNIT` bytes and zero-terminates; an empty
/// input yields a valid terminator-only buffer. The caller owns the
/// returned handle and releases it like any other arena buffer.
pub fn narrow_to_wide(
    arena: &mut BufferArena,
    text: &[u8],
) -> Result<BufferHandle, MemoryError> {
    let handle = arena.allocate((text.len() + 1) * WIDE_UNIT)?;
    let data = arena.bytes_mut(handle)?;
    for (i, &b) in text.iter().enumerate() {
        data[i * WIDE_UNIT..(i + 1) * WIDE_UNIT].copy_from_slice(&(b as u16).to_ne_bytes());
    }
    // Terminator units are already zero from allocation.
    Ok(handle)
}

/// Narrow a wide buffer back to bytes, stopping at the terminator.
///
/// Each unit keeps only its low 8 bits. The returned bytes do not include
/// a terminator. Unterminated buffers narrow in full.
pub fn wide_to_narrow(
    arena: &BufferArena,
    handle: BufferHandle,
) -> Result<Vec<u8>, MemoryError> {
    let data = arena.bytes(handle)?;
    Ok(units(data)
        .take_while(|&u| u != 0)
        .map(|u| (u & 0xFF) as u8)
        .collect())
}

/// Number of wide units before the terminator.
pub fn wide_len(arena: &BufferArena, handle: BufferHandle) -> Result<usize, MemoryError> {
    let data = arena.bytes(handle)?;
    Ok(units(data).take_while(|&u| u != 0).count())
}

fn units(data: &[u8]) -> impl Iterator<Item = u16> + '_ {
    data.chunks_exact(WIDE_UNIT)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
}
