//! Point and rect boxes.

use mobridge_memory::{scalar_width, BufferArena, BufferHandle, MemoryError, ScalarKind};

fn field_index(slot: usize) -> usize {
    // Fields are consecutive i32s; the arena's width table keeps the
    // index math honest if widths ever change.
    debug_assert_eq!(scalar_width(ScalarKind::Int32), 4);
    slot
}

/// A Point{x, y} allocated in arena memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointBox {
    handle: BufferHandle,
}

impl PointBox {
    pub const SIZE: usize = 8;

    pub fn new(arena: &mut BufferArena) -> Result<Self, MemoryError> {
        Ok(Self {
            handle: arena.allocate(Self::SIZE)?,
        })
    }

    /// Wrap an existing buffer holding a point, e.g. one the native layer
    /// populated.
    pub fn from_handle(handle: BufferHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn x(&self, arena: &BufferArena) -> Result<i32, MemoryError> {
        arena.read_i32(self.handle, field_index(0))
    }

    pub fn y(&self, arena: &BufferArena) -> Result<i32, MemoryError> {
        arena.read_i32(self.handle, field_index(1))
    }

    pub fn set_x(&self, arena: &mut BufferArena, x: i32) -> Result<(), MemoryError> {
        arena.write_i32(self.handle, field_index(0), x)
    }

    pub fn set_y(&self, arena: &mut BufferArena, y: i32) -> Result<(), MemoryError> {
        arena.write_i32(self.handle, field_index(1), y)
    }

    pub fn release(self, arena: &mut BufferArena) -> Result<(), MemoryError> {
        arena.release(self.handle)
    }
}

/// A Rect{left, top, width, height} allocated in arena memory.
///
/// Negative widths and heights pass through unvalidated; consumers of
/// the native ABI decide what they mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectBox {
    handle: BufferHandle,
}

impl RectBox {
    pub const SIZE: usize = 16;

    pub fn new(arena: &mut BufferArena) -> Result<Self, MemoryError> {
        Ok(Self {
            handle: arena.allocate(Self::SIZE)?,
        })
    }

    pub fn from_handle(handle: BufferHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn left(&self, arena: &BufferArena) -> Result<i32, MemoryError> {
        arena.read_i32(self.handle, field_index(0))
    }

    pub fn top(&self, arena: &BufferArena) -> Result<i32, MemoryError> {
        arena.read_i32(self.handle, field_index(1))
    }

    pub fn width(&self, arena: &BufferArena) -> Result<i32, MemoryError> {
        arena.read_i32(self.handle, field_index(2))
    }

    pub fn height(&self, arena: &BufferArena) -> Result<i32, MemoryError> {
        arena.read_i32(self.handle, field_index(3))
    }

    pub fn set_left(&self, arena: &mut BufferArena, left: i32) -> Result<(), MemoryError> {
        arena.write_i32(self.handle, field_index(0), left)
    }

    pub fn set_top(&self, arena: &mut BufferArena, top: i32) -> Result<(), MemoryError> {
        arena.write_i32(self.handle, field_index(1), top)
    }

    pub fn set_width(&self, arena: &mut BufferArena, width: i32) -> Result<(), MemoryError> {
        arena.write_i32(self.handle, field_index(2), width)
    }

    pub fn set_height(&self, arena: &mut BufferArena, height: i32) -> Result<(), MemoryError> {
        arena.write_i32(self.handle, field_index(3), height)
    }

    pub fn release(self, arena: &mut BufferArena) -> Result<(), MemoryError> {
        arena.release(self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_fields_round_trip() {
        let mut arena = BufferArena::new();
        let point = PointBox::new(&mut arena).unwrap();

        point.set_x(&mut arena, 120).unwrap();
        point.set_y(&mut arena, -45).unwrap();
        assert_eq!(point.x(&arena).unwrap(), 120);
        assert_eq!(point.y(&arena).unwrap(), -45);

        point.release(&mut arena).unwrap();
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn rect_fields_round_trip() {
        let mut arena = BufferArena::new();
        let rect = RectBox::new(&mut arena).unwrap();

        rect.set_left(&mut arena, 5).unwrap();
        rect.set_top(&mut arena, 10).unwrap();
        rect.set_width(&mut arena, 320).unwrap();
        rect.set_height(&mut arena, 240).unwrap();

        assert_eq!(rect.left(&arena).unwrap(), 5);
        assert_eq!(rect.top(&arena).unwrap(), 10);
        assert_eq!(rect.width(&arena).unwrap(), 320);
        assert_eq!(rect.height(&arena).unwrap(), 240);
    }

    #[test]
    fn negative_sizes_pass_through() {
        let mut arena = BufferArena::new();
        let rect = RectBox::new(&mut arena).unwrap();
        rect.set_width(&mut arena, -1).unwrap();
        assert_eq!(rect.width(&arena).unwrap(), -1);
    }

    #[test]
    fn layout_is_consecutive_i32s() {
        let mut arena = BufferArena::new();
        let rect = RectBox::new(&mut arena).unwrap();
        rect.set_height(&mut arena, 0x0102_0304).unwrap();

        // The native layer reads field 3 at byte offset 12.
        let bytes = arena.bytes(rect.handle()).unwrap();
        assert_eq!(bytes[12..16], 0x0102_0304i32.to_ne_bytes());
    }

    #[test]
    fn released_box_goes_stale() {
        let mut arena = BufferArena::new();
        let point = PointBox::new(&mut arena).unwrap();
        let copy = point;
        point.release(&mut arena).unwrap();
        assert!(copy.x(&arena).is_err());
    }
}
