//! Buffer arena with generation-validated handles.
//!
//! The scripting host allocates untyped byte buffers here and addresses
//! them through opaque handles. A handle carries the slot index plus the
//! slot generation at allocation time; the generation is bumped on each
//! release, so stale handles are rejected instead of corrupting memory.
//!
//! Buffers have no inherent type. The typed read/write methods impose a
//! view on the bytes per call, and overlapping views of different widths
//! over the same buffer are allowed and intentional (type punning).

use std::fmt;
use std::ops::Range;

use thiserror::Error;
use tracing::trace;

/// Errors from buffer allocation, lifecycle, and typed access.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("allocation of {size} bytes failed")]
    AllocationFailed { size: usize },

    #[error("bytes {start}..{end} out of range for {handle} ({len} bytes)")]
    OutOfBounds {
        handle: BufferHandle,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("{handle} used after release")]
    UseAfterRelease { handle: BufferHandle },

    #[error("{handle} released twice")]
    DoubleRelease { handle: BufferHandle },
}

/// Opaque reference to a buffer owned by a [`BufferArena`].
///
/// Packs into `u64` bits for crossing the script boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    index: u32,
    generation: u32,
}

impl BufferHandle {
    pub fn to_bits(self) -> u64 {
        ((self.index as u64) << 32) | self.generation as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: (bits >> 32) as u32,
            generation: bits as u32,
        }
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer #{}v{}", self.index, self.generation)
    }
}

/// Raw address of a byte inside an arena buffer.
///
/// This is the single escape hatch for native calls that write through a
/// pointer (event records, resource reads). Nothing else on the arena API
/// exposes pointers. The address is valid until the backing buffer is
/// released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAddr(*mut u8);

impl RawAddr {
    pub fn as_ptr(self) -> *mut u8 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    pub fn to_bits(self) -> u64 {
        self.0 as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        Self(bits as *mut u8)
    }
}

/// Scalar kinds the host can view a buffer as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Byte,
    Int32,
    Float32,
    Float64,
}

/// Width in bytes of each scalar kind.
///
/// Single source of truth for the host's element index math; the host
/// must consult this instead of hardcoding widths.
pub fn scalar_width(kind: ScalarKind) -> usize {
    match kind {
        ScalarKind::Byte => 1,
        ScalarKind::Int32 => 4,
        ScalarKind::Float32 => 4,
        ScalarKind::Float64 => 8,
    }
}

struct Slot {
    generation: u32,
    data: Option<Box<[u8]>>,
}

/// Arena of owned byte buffers addressed by [`BufferHandle`].
///
/// Slots are recycled through a LIFO free list; a released slot's
/// generation is bumped so handles to the old allocation go stale.
#[derive(Default)]
pub struct BufferArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate a zero-filled buffer of `size` bytes.
    ///
    /// `size` may be zero; the result is a valid zero-length handle that
    /// must still be released.
    pub fn allocate(&mut self, size: usize) -> Result<BufferHandle, MemoryError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| MemoryError::AllocationFailed { size })?;
        bytes.resize(size, 0);
        let data = bytes.into_boxed_slice();

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index].data = Some(data);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                self.slots.len() - 1
            }
        };

        let handle = BufferHandle {
            index: index as u32,
            generation: self.slots[index].generation,
        };
        trace!(%handle, size, "allocated buffer");
        Ok(handle)
    }

    /// Release a buffer. Releasing an already-released handle fails with
    /// [`MemoryError::DoubleRelease`]; the arena state is untouched.
    pub fn release(&mut self, handle: BufferHandle) -> Result<(), MemoryError> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.data.is_some() => {
                slot.data = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(handle.index as usize);
                trace!(%handle, "released buffer");
                Ok(())
            }
            _ => Err(MemoryError::DoubleRelease { handle }),
        }
    }

    /// Whether the handle refers to a live buffer.
    pub fn is_live(&self, handle: BufferHandle) -> bool {
        self.lookup(handle).is_some()
    }

    /// Number of live buffers.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }

    /// Length in bytes of a live buffer.
    pub fn len(&self, handle: BufferHandle) -> Result<usize, MemoryError> {
        Ok(self.bytes(handle)?.len())
    }

    /// Borrow the raw bytes of a live buffer.
    pub fn bytes(&self, handle: BufferHandle) -> Result<&[u8], MemoryError> {
        self.lookup(handle)
            .ok_or(MemoryError::UseAfterRelease { handle })
    }

    /// Borrow the raw bytes of a live buffer mutably.
    pub fn bytes_mut(&mut self, handle: BufferHandle) -> Result<&mut [u8], MemoryError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.data.as_deref_mut())
            .ok_or(MemoryError::UseAfterRelease { handle })
    }

    /// Read element `index` of the buffer viewed as `[T]`.
    ///
    /// The byte offset is `index * size_of::<T>()`; out-of-range indices
    /// fail with [`MemoryError::OutOfBounds`].
    pub fn read<T: bytemuck::Pod>(
        &self,
        handle: BufferHandle,
        index: usize,
    ) -> Result<T, MemoryError> {
        let data = self.bytes(handle)?;
        let span = element_span::<T>(handle, index, data.len())?;
        Ok(bytemuck::pod_read_unaligned(&data[span]))
    }

    /// Write element `index` of the buffer viewed as `[T]`.
    pub fn write<T: bytemuck::Pod>(
        &mut self,
        handle: BufferHandle,
        index: usize,
        value: T,
    ) -> Result<(), MemoryError> {
        let data = self.bytes_mut(handle)?;
        let span = element_span::<T>(handle, index, data.len())?;
        data[span].copy_from_slice(bytemuck::bytes_of(&value));
        Ok(())
    }

    pub fn read_u8(&self, handle: BufferHandle, index: usize) -> Result<u8, MemoryError> {
        self.read(handle, index)
    }

    pub fn read_i32(&self, handle: BufferHandle, index: usize) -> Result<i32, MemoryError> {
        self.read(handle, index)
    }

    pub fn read_f32(&self, handle: BufferHandle, index: usize) -> Result<f32, MemoryError> {
        self.read(handle, index)
    }

    pub fn read_f64(&self, handle: BufferHandle, index: usize) -> Result<f64, MemoryError> {
        self.read(handle, index)
    }

    pub fn write_u8(
        &mut self,
        handle: BufferHandle,
        index: usize,
        value: u8,
    ) -> Result<(), MemoryError> {
        self.write(handle, index, value)
    }

    pub fn write_i32(
        &mut self,
        handle: BufferHandle,
        index: usize,
        value: i32,
    ) -> Result<(), MemoryError> {
        self.write(handle, index, value)
    }

    pub fn write_f32(
        &mut self,
        handle: BufferHandle,
        index: usize,
        value: f32,
    ) -> Result<(), MemoryError> {
        self.write(handle, index, value)
    }

    pub fn write_f64(
        &mut self,
        handle: BufferHandle,
        index: usize,
        value: f64,
    ) -> Result<(), MemoryError> {
        self.write(handle, index, value)
    }

    /// Unchecked typed read: no bounds check on `index`.
    ///
    /// # Safety
    /// `handle` must be live and `(index + 1) * size_of::<T>()` must not
    /// exceed the buffer length.
    pub unsafe fn read_unchecked<T: bytemuck::Pod>(
        &self,
        handle: BufferHandle,
        index: usize,
    ) -> T {
        let slot = self.slots.get_unchecked(handle.index as usize);
        let data = slot.data.as_deref().unwrap_unchecked();
        core::ptr::read_unaligned(data.as_ptr().add(index * core::mem::size_of::<T>()) as *const T)
    }

    /// Unchecked typed write: no bounds check on `index`.
    ///
    /// # Safety
    /// Same contract as [`BufferArena::read_unchecked`].
    pub unsafe fn write_unchecked<T: bytemuck::Pod>(
        &mut self,
        handle: BufferHandle,
        index: usize,
        value: T,
    ) {
        let slot = self.slots.get_unchecked_mut(handle.index as usize);
        let data = slot.data.as_deref_mut().unwrap_unchecked();
        core::ptr::write_unaligned(
            data.as_mut_ptr().add(index * core::mem::size_of::<T>()) as *mut T,
            value,
        );
    }

    /// Copy `count` bytes in strictly forward order.
    ///
    /// When source and destination ranges overlap within the same buffer,
    /// the result is that of a sequential byte-by-byte forward copy, not
    /// memmove. Callers depend on the smear; do not "fix" this.
    pub fn copy_bytes(
        &mut self,
        src: BufferHandle,
        src_offset: usize,
        dst: BufferHandle,
        dst_offset: usize,
        count: usize,
    ) -> Result<(), MemoryError> {
        check_range(src, src_offset, count, self.len(src)?)?;
        check_range(dst, dst_offset, count, self.len(dst)?)?;

        if src.index == dst.index {
            let data = self.bytes_mut(dst)?;
            for i in 0..count {
                data[dst_offset + i] = data[src_offset + i];
            }
            return Ok(());
        }

        let (si, di) = (src.index as usize, dst.index as usize);
        let (src_data, dst_data) = if si < di {
            let (left, right) = self.slots.split_at_mut(di);
            (
                live_bytes(&left[si], src)?,
                live_bytes_mut(&mut right[0], dst)?,
            )
        } else {
            let (left, right) = self.slots.split_at_mut(si);
            (
                live_bytes(&right[0], src)?,
                live_bytes_mut(&mut left[di], dst)?,
            )
        };
        dst_data[dst_offset..dst_offset + count]
            .copy_from_slice(&src_data[src_offset..src_offset + count]);
        Ok(())
    }

    /// Raw address of the byte at `byte_offset`, for handing to native
    /// calls that populate memory through a pointer.
    ///
    /// `byte_offset` may equal the buffer length (one-past-end), which is
    /// useful for zero-length reads but must not be written through.
    pub fn address_of(
        &mut self,
        handle: BufferHandle,
        byte_offset: usize,
    ) -> Result<RawAddr, MemoryError> {
        let data = self.bytes_mut(handle)?;
        if byte_offset > data.len() {
            return Err(MemoryError::OutOfBounds {
                handle,
                start: byte_offset,
                end: byte_offset,
                len: data.len(),
            });
        }
        // Boxed slices never reallocate, so the address stays valid until
        // the buffer is released.
        Ok(RawAddr(unsafe { data.as_mut_ptr().add(byte_offset) }))
    }

    fn lookup(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.data.as_deref())
    }
}

fn live_bytes(slot: &Slot, handle: BufferHandle) -> Result<&[u8], MemoryError> {
    slot.data
        .as_deref()
        .filter(|_| slot.generation == handle.generation)
        .ok_or(MemoryError::UseAfterRelease { handle })
}

fn live_bytes_mut(slot: &mut Slot, handle: BufferHandle) -> Result<&mut [u8], MemoryError> {
    if slot.generation != handle.generation {
        return Err(MemoryError::UseAfterRelease { handle });
    }
    slot.data
        .as_deref_mut()
        .ok_or(MemoryError::UseAfterRelease { handle })
}

fn element_span<T>(
    handle: BufferHandle,
    index: usize,
    len: usize,
) -> Result<Range<usize>, MemoryError> {
    let elem = core::mem::size_of::<T>();
    let start = index.checked_mul(elem);
    let end = start.and_then(|s| s.checked_add(elem));
    match (start, end) {
        (Some(start), Some(end)) if end <= len => Ok(start..end),
        _ => Err(MemoryError::OutOfBounds {
            handle,
            start: index.saturating_mul(elem),
            end: index.saturating_mul(elem).saturating_add(elem),
            len,
        }),
    }
}

fn check_range(
    handle: BufferHandle,
    offset: usize,
    count: usize,
    len: usize,
) -> Result<(), MemoryError> {
    match offset.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(MemoryError::OutOfBounds {
            handle,
            start: offset,
            end: offset.saturating_add(count),
            len,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_round_trips() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(64).unwrap();

        arena.write_i32(buf, 3, -123456).unwrap();
        assert_eq!(arena.read_i32(buf, 3).unwrap(), -123456);

        arena.write_u8(buf, 63, 0xAB).unwrap();
        assert_eq!(arena.read_u8(buf, 63).unwrap(), 0xAB);

        arena.write_f32(buf, 7, 1.5).unwrap();
        assert_eq!(arena.read_f32(buf, 7).unwrap(), 1.5);

        arena.write_f64(buf, 2, -0.25).unwrap();
        assert_eq!(arena.read_f64(buf, 2).unwrap(), -0.25);
    }

    #[test]
    fn type_punning_matches_native_layout() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(4).unwrap();
        let value: i32 = 0x1234_5678;

        arena.write_i32(buf, 0, value).unwrap();

        let expected = value.to_ne_bytes();
        for (i, &b) in expected.iter().enumerate() {
            assert_eq!(arena.read_u8(buf, i).unwrap(), b);
        }
    }

    #[test]
    fn out_of_bounds_is_reported() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(8).unwrap();

        // Element 1 of an f64 view ends at byte 16.
        let err = arena.read_f64(buf, 1).unwrap_err();
        assert!(matches!(err, MemoryError::OutOfBounds { len: 8, .. }));

        assert!(arena.read_i32(buf, 1).is_ok());
        assert!(arena.read_i32(buf, 2).is_err());
    }

    #[test]
    fn copy_between_buffers() {
        let mut arena = BufferArena::new();
        let src = arena.allocate(8).unwrap();
        let dst = arena.allocate(8).unwrap();
        for i in 0..8 {
            arena.write_u8(src, i, i as u8).unwrap();
        }

        arena.copy_bytes(src, 0, dst, 0, 8).unwrap();
        for i in 0..8 {
            assert_eq!(arena.read_u8(dst, i).unwrap(), i as u8);
        }
    }

    #[test]
    fn copy_with_released_buffer_is_rejected() {
        let mut arena = BufferArena::new();
        let src = arena.allocate(8).unwrap();
        let dst = arena.allocate(8).unwrap();
        arena.release(src).unwrap();

        assert_eq!(
            arena.copy_bytes(src, 0, dst, 0, 4),
            Err(MemoryError::UseAfterRelease { handle: src })
        );
        assert_eq!(
            arena.copy_bytes(dst, 0, src, 0, 4),
            Err(MemoryError::UseAfterRelease { handle: src })
        );
    }

    #[test]
    fn overlapping_copy_is_forward_order() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(6).unwrap();
        for i in 0..6 {
            arena.write_u8(buf, i, i as u8).unwrap();
        }

        // Forward copy of [0,1,2,3] onto offset 1 smears byte 0:
        // each step reads a byte the previous step just wrote.
        arena.copy_bytes(buf, 0, buf, 1, 4).unwrap();
        let got: Vec<u8> = (0..6).map(|i| arena.read_u8(buf, i).unwrap()).collect();
        assert_eq!(got, vec![0, 0, 0, 0, 0, 5]);
    }

    #[test]
    fn zero_length_allocation_is_valid() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(0).unwrap();
        assert_eq!(arena.len(buf).unwrap(), 0);
        assert!(arena.read_u8(buf, 0).is_err());
        arena.release(buf).unwrap();
    }

    #[test]
    fn double_release_is_detected() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(16).unwrap();
        arena.release(buf).unwrap();

        assert_eq!(
            arena.release(buf),
            Err(MemoryError::DoubleRelease { handle: buf })
        );
    }

    #[test]
    fn use_after_release_is_detected() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(16).unwrap();
        arena.release(buf).unwrap();

        assert_eq!(
            arena.read_i32(buf, 0),
            Err(MemoryError::UseAfterRelease { handle: buf })
        );
        assert_eq!(
            arena.write_i32(buf, 0, 1),
            Err(MemoryError::UseAfterRelease { handle: buf })
        );
    }

    #[test]
    fn recycled_slot_gets_fresh_generation() {
        let mut arena = BufferArena::new();
        let first = arena.allocate(4).unwrap();
        arena.release(first).unwrap();

        let second = arena.allocate(4).unwrap();
        assert_ne!(first, second);
        assert!(arena.is_live(second));
        assert!(!arena.is_live(first));
    }

    #[test]
    fn handle_bits_round_trip() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(4).unwrap();
        assert_eq!(BufferHandle::from_bits(buf.to_bits()), buf);
    }

    #[test]
    fn address_of_writes_through() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(4).unwrap();
        let addr = arena.address_of(buf, 0).unwrap();

        // Simulate a native call populating the buffer through the pointer.
        unsafe {
            core::ptr::write_unaligned(addr.as_ptr() as *mut i32, 77);
        }
        assert_eq!(arena.read_i32(buf, 0).unwrap(), 77);

        assert!(arena.address_of(buf, 5).is_err());
    }

    #[test]
    fn unchecked_views_match_checked_views() {
        let mut arena = BufferArena::new();
        let buf = arena.allocate(16).unwrap();
        unsafe {
            arena.write_unchecked::<i32>(buf, 2, 42);
        }
        assert_eq!(arena.read_i32(buf, 2).unwrap(), 42);
        assert_eq!(unsafe { arena.read_unchecked::<i32>(buf, 2) }, 42);
    }

    #[test]
    fn scalar_widths_are_fixed() {
        assert_eq!(scalar_width(ScalarKind::Byte), 1);
        assert_eq!(scalar_width(ScalarKind::Int32), 4);
        assert_eq!(scalar_width(ScalarKind::Float32), 4);
        assert_eq!(scalar_width(ScalarKind::Float64), 8);
    }
}
