//! Configuration for clockpool.

use crate::buffer::replacer::ReplacerKind;
use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Fixed for the whole process. Every frame, every disk read and every disk
/// write moves exactly this many bytes.
///
/// # Alignment
/// Page buffers are aligned to 4096 bytes so file-backed collaborators can
/// use Direct I/O.
pub const PAGE_SIZE: usize = 4096;

/// Number of frames used by [`BufferPoolConfig::default`].
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Construction parameters for a [`BufferPoolManager`](crate::BufferPoolManager).
///
/// # Example
/// ```
/// use clockpool::{BufferPoolConfig, ReplacerKind};
///
/// let config = BufferPoolConfig::default()
///     .with_pool_size(16)
///     .with_replacer(ReplacerKind::Fifo);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub pool_size: usize,

    /// Eviction policy used once the free list is empty.
    pub replacer: ReplacerKind,
}

impl BufferPoolConfig {
    /// Set the number of frames.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the eviction policy.
    pub fn with_replacer(mut self, replacer: ReplacerKind) -> Self {
        self.replacer = replacer;
        self
    }

    /// Check the configuration can build a pool.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if `pool_size` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::InvalidConfig("pool_size must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            replacer: ReplacerKind::Clock,
        }
    }
}
