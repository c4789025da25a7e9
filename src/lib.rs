//! clockpool - a disk-backed page cache with pluggable eviction policies.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Upper layers (indexes, table heaps)             │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ↓ fetch / new / unpin / flush / delete
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Buffer Pool (buffer/)                           │
//! │   BufferPoolManager + PageReadGuard/PageWriteGuard + Stats      │
//! │   ┌─────────────────────────────────────────────────────────┐   │
//! │   │  Replacer trait:  ClockReplacer | FifoReplacer           │   │
//! │   └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//!                               ↓ read / write / allocate / deallocate
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Storage (storage/)                              │
//! │   DiskManager trait: FileDiskManager | MemoryDiskManager        │
//! │   Page (frame slot + latches), PageBuf (aligned content)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool management and eviction policies
//! - [`storage`] - Disk collaborators and page frames
//!
//! # Quick Start
//! ```
//! use clockpool::{BufferPoolManager, MemoryDiskManager};
//!
//! let bpm = BufferPoolManager::new(8, MemoryDiskManager::new());
//!
//! let (page_id, page) = bpm.new_page().unwrap();
//! page.data_mut()[0] = 0xAB;
//! bpm.unpin_page(page_id, true).unwrap();
//!
//! bpm.flush_page(page_id).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

pub use common::config::{BufferPoolConfig, DEFAULT_POOL_SIZE, PAGE_SIZE};
pub use common::{Error, FrameId, PageId, Result};

pub use buffer::replacer::{ClockReplacer, FifoReplacer, Replacer, ReplacerKind};
pub use buffer::{BufferPoolManager, BufferPoolStats, PageReadGuard, PageWriteGuard, StatsSnapshot};
pub use storage::page::{Page, PageBuf};
pub use storage::{DiskManager, FileDiskManager, MemoryDiskManager};
