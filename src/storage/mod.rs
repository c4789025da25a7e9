//! Storage layer - disk collaborators and page frames.
//!
//! - [`DiskManager`] - The disk I/O interface the buffer pool consumes
//! - [`FileDiskManager`] - Single-file implementation
//! - [`MemoryDiskManager`] - In-memory implementation with I/O counters
//! - [`page`] - Page frames and content buffers

mod disk_manager;
mod memory_disk_manager;
pub mod page;

pub use disk_manager::{DiskManager, FileDiskManager};
pub use memory_disk_manager::MemoryDiskManager;
