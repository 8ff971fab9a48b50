pub mod allocator;
pub mod blob;

pub use allocator::Allocator;
pub use blob::{Blob, MemoryHandle};
