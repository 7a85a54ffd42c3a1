pub mod block;
pub mod handle;
pub mod heap;
pub mod pool;
pub mod provider;
pub mod state;
pub mod tracking;

pub use block::Block;
pub use handle::{BufferDescriptor, BufferHandle, ProviderId};
pub use heap::HeapBufferProvider;
pub use pool::BufferPool;
pub use provider::BufferProvider;
pub use state::BufferState;
pub use tracking::TrackingHeapBlockProvider;
