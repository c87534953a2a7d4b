//! String-resource loading through the native resource store.

use mobridge_memory::{BufferArena, BufferHandle, MemoryError, RawAddr};
use thiserror::Error;
use tracing::debug;

pub type ResourceId = i32;

/// Errors reported by a native resource store.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    #[error("resource {id} not found")]
    NotFound { id: ResourceId },

    #[error("reading resource {id} failed")]
    ReadFailed { id: ResourceId },
}

/// Capability exposed by the native resource store.
///
/// `read` writes through the destination address; that is how the native
/// SDK works, so the arena's address escape is the handoff point.
pub trait NativeResourceStore {
    fn size_of(&self, id: ResourceId) -> Result<usize, ResourceError>;
    fn read(
        &self,
        id: ResourceId,
        dest: RawAddr,
        offset: usize,
        len: usize,
    ) -> Result<(), ResourceError>;
}

/// Errors from materializing a resource into an arena buffer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLoadError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Store(#[from] ResourceError),
}

/// Materialize a resource's bytes into a zero-terminated arena buffer.
///
/// Allocates `size + 1` bytes and lets the store fill the first `size`
/// through the buffer's address; the terminator byte stays zero. The
/// caller owns the returned handle.
pub fn load_string_resource(
    arena: &mut BufferArena,
    store: &impl NativeResourceStore,
    id: ResourceId,
) -> Result<BufferHandle, ResourceLoadError> {
    let size = store.size_of(id)?;
    let handle = arena.allocate(size + 1)?;
    let dest = match arena.address_of(handle, 0) {
        Ok(dest) => dest,
        Err(err) => {
            let _ = arena.release(handle);
            return Err(err.into());
        }
    };
    if let Err(err) = store.read(id, dest, 0, size) {
        let _ = arena.release(handle);
        return Err(err.into());
    }
    debug!(id, size, "loaded string resource");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory store that writes through the destination address the
    /// way the native SDK would.
    struct StubStore {
        resources: HashMap<ResourceId, Vec<u8>>,
    }

    impl NativeResourceStore for StubStore {
        fn size_of(&self, id: ResourceId) -> Result<usize, ResourceError> {
            self.resources
                .get(&id)
                .map(Vec::len)
                .ok_or(ResourceError::NotFound { id })
        }

        fn read(
            &self,
            id: ResourceId,
            dest: RawAddr,
            offset: usize,
            len: usize,
        ) -> Result<(), ResourceError> {
            let bytes = self.resources.get(&id).ok_or(ResourceError::NotFound { id })?;
            let slice = bytes
                .get(offset..offset + len)
                .ok_or(ResourceError::ReadFailed { id })?;
            unsafe {
                core::ptr::copy_nonoverlapping(slice.as_ptr(), dest.as_ptr(), slice.len());
            }
            Ok(())
        }
    }

    #[test]
    fn resource_lands_zero_terminated() {
        let mut arena = BufferArena::new();
        let store = StubStore {
            resources: HashMap::from([(7, b"greeting".to_vec())]),
        };

        let handle = load_string_resource(&mut arena, &store, 7).unwrap();
        assert_eq!(arena.len(handle).unwrap(), 9);

        let data = arena.bytes(handle).unwrap();
        assert_eq!(&data[..8], b"greeting");
        assert_eq!(data[8], 0);
    }

    #[test]
    fn missing_resource_leaks_nothing() {
        let mut arena = BufferArena::new();
        let store = StubStore {
            resources: HashMap::new(),
        };

        let err = load_string_resource(&mut arena, &store, 3).unwrap_err();
        assert_eq!(
            err,
            ResourceLoadError::Store(ResourceError::NotFound { id: 3 })
        );
        assert_eq!(arena.live_count(), 0);
    }
}
