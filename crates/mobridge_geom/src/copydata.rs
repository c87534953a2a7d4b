//! Copy-data parameter block for the native data-copy call.

use mobridge_memory::{BufferArena, BufferHandle, MemoryError};

/// Parameters of a native resource-to-resource copy: five consecutive
/// i32 fields in the order the native call expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyDataRequest {
    pub dst: i32,
    pub dst_offset: i32,
    pub src: i32,
    pub src_offset: i32,
    pub size: i32,
}

impl CopyDataRequest {
    pub const SIZE: usize = 20;

    /// Box the request in arena memory so its address can be handed to
    /// the native call. The caller owns the returned handle.
    pub fn store(&self, arena: &mut BufferArena) -> Result<BufferHandle, MemoryError> {
        let handle = arena.allocate(Self::SIZE)?;
        for (i, field) in self.fields().into_iter().enumerate() {
            arena.write_i32(handle, i, field)?;
        }
        Ok(handle)
    }

    /// Read a request back from arena memory.
    pub fn load(arena: &BufferArena, handle: BufferHandle) -> Result<Self, MemoryError> {
        Ok(Self {
            dst: arena.read_i32(handle, 0)?,
            dst_offset: arena.read_i32(handle, 1)?,
            src: arena.read_i32(handle, 2)?,
            src_offset: arena.read_i32(handle, 3)?,
            size: arena.read_i32(handle, 4)?,
        })
    }

    fn fields(&self) -> [i32; 5] {
        [self.dst, self.dst_offset, self.src, self.src_offset, self.size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_request_round_trips() {
        let mut arena = BufferArena::new();
        let request = CopyDataRequest {
            dst: 4,
            dst_offset: 16,
            src: 2,
            src_offset: 0,
            size: 128,
        };

        let handle = request.store(&mut arena).unwrap();
        assert_eq!(arena.len(handle).unwrap(), CopyDataRequest::SIZE);
        assert_eq!(CopyDataRequest::load(&arena, handle).unwrap(), request);
    }
}
