//! Error types for clockpool.

use thiserror::Error;

use crate::common::PageId;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors surfaced by the buffer pool and its disk collaborators.
///
/// None of these are retried internally; retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a file-backed disk collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The disk collaborator has no such page (never allocated, or deallocated).
    #[error("{0} not found on disk")]
    PageNotFound(PageId),

    /// No frame could be obtained: the free list is empty and every
    /// resident page is pinned.
    #[error("buffer pool exhausted: every frame is pinned")]
    PoolExhausted,

    /// Unpin called on a page whose pin count is already zero.
    ///
    /// This indicates a caller bug - every unpin must match a fetch or new.
    #[error("unbalanced unpin of {0}: pin count is already zero")]
    UnbalancedUnpin(PageId),

    /// Delete requested on a page that is still pinned.
    #[error("{0} is in use and cannot be deleted")]
    PageInUse(PageId),

    /// Flush requested on a page that is not held by any frame.
    #[error("{0} is not resident in the buffer pool")]
    NotResident(PageId),

    /// Construction parameters were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
