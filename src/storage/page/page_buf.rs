//! PageBuf - the raw 4KB content of a page.
//!
//! A [`PageBuf`] is the unit of I/O between the buffer pool and its disk
//! collaborator. The buffer pool assigns no meaning to its bytes.

use crate::common::config::PAGE_SIZE;

/// A page-sized byte buffer (4KB, 4KB-aligned).
///
/// # Memory Layout
/// - Size: 4096 bytes
/// - Alignment: 4096 bytes (for Direct I/O with O_DIRECT)
///
/// `PageBuf` does NOT implement `Clone` outside tests; copying 4KB should be
/// explicit via [`PageBuf::copy_from`].
///
/// # Example
/// ```
/// use clockpool::PageBuf;
///
/// let mut buf = PageBuf::new();
/// buf.as_mut_slice()[0] = 0xFF;
/// assert_eq!(buf.as_slice()[0], 0xFF);
/// ```
#[repr(align(4096))]
pub struct PageBuf {
    data: [u8; PAGE_SIZE],
}

impl PageBuf {
    /// Create a new zeroed buffer.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Create a zeroed buffer on the heap.
    #[inline]
    pub fn boxed() -> Box<Self> {
        Box::new(Self::new())
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite this buffer with `src`.
    ///
    /// # Panics
    /// Panics if `src` is not exactly [`PAGE_SIZE`] bytes.
    pub fn copy_from(&mut self, src: &[u8]) {
        self.data.copy_from_slice(src);
    }

    /// Zero out the entire buffer.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }
}

impl Default for PageBuf {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Clone for PageBuf {
    fn clone(&self) -> Self {
        let mut buf = PageBuf::new();
        buf.copy_from(&self.data);
        buf
    }
}
