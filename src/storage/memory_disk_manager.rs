//! In-memory disk collaborator.
//!
//! [`MemoryDiskManager`] keeps pages in a hash map and counts every read and
//! write. Clones share the same storage, so a test can hand one clone to a
//! [`BufferPoolManager`](crate::BufferPoolManager) and keep another to
//! observe the I/O the pool issues, or to make writes to chosen pages fail.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::PageBuf;
use crate::storage::DiskManager;

#[derive(Default)]
struct PageRecord {
    data: Option<Box<PageBuf>>,
    reads: u64,
    writes: u64,
}

#[derive(Default)]
struct MemoryDisk {
    pages: HashMap<PageId, PageRecord>,
    next_page_id: u32,
    deallocations: u64,
    failing_writes: HashSet<PageId>,
}

impl MemoryDisk {
    fn live(&mut self, page_id: PageId) -> Result<&mut PageRecord> {
        match self.pages.get_mut(&page_id) {
            Some(record) if record.data.is_some() => Ok(record),
            _ => Err(Error::PageNotFound(page_id)),
        }
    }
}

/// Disk collaborator backed by memory.
///
/// Deallocated pages are dropped; reading or writing them afterwards fails
/// with [`Error::PageNotFound`]. Identities are never reused.
///
/// # Example
/// ```
/// use clockpool::{DiskManager, MemoryDiskManager, PAGE_SIZE};
///
/// let mut disk = MemoryDiskManager::new();
/// let observer = disk.clone();
///
/// let page_id = disk.allocate_page().unwrap();
/// disk.write_page(page_id, &[7u8; PAGE_SIZE]).unwrap();
/// assert_eq!(observer.write_count(page_id), 1);
/// ```
#[derive(Clone, Default)]
pub struct MemoryDiskManager {
    inner: Arc<Mutex<MemoryDisk>>,
}

impl MemoryDiskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reads issued for `page_id`.
    pub fn read_count(&self, page_id: PageId) -> u64 {
        self.inner.lock().pages.get(&page_id).map_or(0, |r| r.reads)
    }

    /// Number of writes issued for `page_id`.
    pub fn write_count(&self, page_id: PageId) -> u64 {
        self.inner.lock().pages.get(&page_id).map_or(0, |r| r.writes)
    }

    /// Total reads across all pages.
    pub fn total_reads(&self) -> u64 {
        self.inner.lock().pages.values().map(|r| r.reads).sum()
    }

    /// Total writes across all pages.
    pub fn total_writes(&self) -> u64 {
        self.inner.lock().pages.values().map(|r| r.writes).sum()
    }

    /// Number of identities handed out so far.
    pub fn allocated_count(&self) -> u32 {
        self.inner.lock().next_page_id
    }

    /// Number of deallocate calls received.
    pub fn deallocation_count(&self) -> u64 {
        self.inner.lock().deallocations
    }

    /// Whether `page_id` is allocated and not deallocated.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.inner
            .lock()
            .pages
            .get(&page_id)
            .is_some_and(|r| r.data.is_some())
    }

    /// Copy of the stored content of `page_id`, bypassing the I/O counters.
    /// Make every write to `page_id` fail with an I/O error until
    /// [`MemoryDiskManager::restore_writes`] is called.
    pub fn fail_writes(&self, page_id: PageId) {
        self.inner.lock().failing_writes.insert(page_id);
    }

    pub fn restore_writes(&self, page_id: PageId) {
        self.inner.lock().failing_writes.remove(&page_id);
    }

    pub fn page_content(&self, page_id: PageId) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .pages
            .get(&page_id)
            .and_then(|r| r.data.as_ref())
            .map(|buf| buf.as_slice().to_vec())
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&mut self, page_id: PageId, dst: &mut [u8]) -> Result<()> {
        let mut disk = self.inner.lock();
        let record = disk.live(page_id)?;
        if let Some(buf) = record.data.as_ref() {
            dst[..PAGE_SIZE].copy_from_slice(buf.as_slice());
        }
        record.reads += 1;
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, src: &[u8]) -> Result<()> {
        let mut disk = self.inner.lock();
        if disk.failing_writes.contains(&page_id) {
            return Err(std::io::Error::other(format!("write to {} failed", page_id)).into());
        }
        let record = disk.live(page_id)?;
        if let Some(buf) = record.data.as_mut() {
            buf.copy_from(&src[..PAGE_SIZE]);
        }
        record.writes += 1;
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let mut disk = self.inner.lock();
        let page_id = PageId::new(disk.next_page_id);
        disk.next_page_id += 1;
        disk.pages.insert(
            page_id,
            PageRecord {
                data: Some(PageBuf::boxed()),
                ..PageRecord::default()
            },
        );
        Ok(page_id)
    }

    fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        let mut disk = self.inner.lock();
        disk.deallocations += 1;
        if let Some(record) = disk.pages.get_mut(&page_id) {
            record.data = None;
        }
        Ok(())
    }
}
