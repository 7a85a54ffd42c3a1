use super::{BufferDescriptor, BufferHandle, ProviderId};
use crate::core::{EngineError, Result};

/// Allocates, locks and releases typed working buffers.
///
/// Every handle returned by `lock_buffer` must eventually be passed to
/// `release_buffer` of the same provider, exactly once.
pub trait BufferProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn descriptor_for(&self, size: usize) -> BufferDescriptor {
        BufferDescriptor::new(self.id(), size)
    }

    /// Descriptor for a buffer large enough to hold one value of `T`
    fn descriptor_for_type<T>(&self) -> BufferDescriptor
    where
        Self: Sized,
    {
        let slots = std::mem::size_of::<T>().div_ceil(std::mem::size_of::<f64>());
        self.descriptor_for(slots.max(1))
    }

    /// Declare the need for `count` buffers of this kind in advance.
    /// Returns how many can actually be provided; fails if none can.
    fn announce(&self, count: usize, descriptor: &BufferDescriptor) -> Result<usize>;

    fn lock_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle>;

    /// Mark the buffer contents as final; allowed at most once per lock
    fn emit_buffer(&self, handle: &BufferHandle) -> Result<()>;

    fn release_buffer(&self, handle: &BufferHandle) -> Result<()>;

    fn verify_descriptor(&self, descriptor: &BufferDescriptor) -> Result<()> {
        if descriptor.provider() != self.id() {
            return Err(EngineError::BufferManagement(
                "descriptor was not created by this provider".to_string(),
            ));
        }
        Ok(())
    }
}
