use std::fmt;
use std::sync::Arc;

/// The single real buffer backing every planned tensor of a graph.
///
/// Storage is a boxed slice of `u64` words so the base address is at least
/// 8-byte aligned.
#[derive(Debug)]
pub struct Blob {
    words: Box<[u64]>,
    size: usize,
}

impl Blob {
    /// Allocate a zero-filled buffer of at least `size` bytes.
    pub fn new(size: usize) -> Self {
        let n_words = size.div_ceil(std::mem::size_of::<u64>());
        Blob {
            words: vec![0u64; n_words].into_boxed_slice(),
            size,
        }
    }

    /// Requested size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.words.as_ptr().cast::<u8>()
    }

    pub fn base_addr(&self) -> usize {
        self.as_ptr() as usize
    }
}

/// A tensor's view into a `Blob`: byte offset plus byte length.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    blob: Arc<Blob>,
    offset: usize,
    len: usize,
}

impl MemoryHandle {
    pub fn new(blob: Arc<Blob>, offset: usize, len: usize) -> Self {
        MemoryHandle { blob, offset, len }
    }

    pub fn blob(&self) -> &Arc<Blob> {
        &self.blob
    }

    /// Byte displacement from the blob's base address.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes (element count times element size).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resolved address: base pointer plus offset.
    pub fn addr(&self) -> usize {
        self.blob.base_addr() + self.offset
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.blob.as_ptr().wrapping_add(self.offset)
    }

    /// True when both handles point into the same backing buffer.
    pub fn shares_blob(&self, other: &MemoryHandle) -> bool {
        Arc::ptr_eq(&self.blob, &other.blob)
    }
}

impl fmt::Display for MemoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}+{}({} bytes)", self.blob.base_addr(), self.offset, self.len)
    }
}
