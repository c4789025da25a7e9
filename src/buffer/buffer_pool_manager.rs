//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between a disk collaborator and memory
//! - Pin-based reference counting
//! - Dirty page write-back on eviction and flush
//! - Pluggable eviction policies

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::buffer::replacer::{Replacer, ReplacerKind};
use crate::buffer::{BufferPoolStats, PageReadGuard, PageWriteGuard};
use crate::common::config::BufferPoolConfig;
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

/// Everything the pool lock protects.
struct PoolState {
    /// Maps resident page IDs to frame IDs.
    page_table: HashMap<PageId, FrameId>,

    /// Frames holding no page, consumed from the front.
    free_list: VecDeque<FrameId>,

    disk: Box<dyn DiskManager>,
}

/// Manages a fixed pool of frames caching disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────────── state: Mutex ────────────────────┐   │
/// │  │ page_table: PageId → FrameId                         │   │
/// │  │ free_list:  VecDeque<FrameId>                        │   │
/// │  │ disk:       Box<dyn DiskManager>                     │   │
/// │  └──────────────────────────────────────────────────────┘   │
/// │  ┌──────────────────────────┐  ┌───────────────────────┐    │
/// │  │ pages: Vec<Page>         │  │ replacer:             │    │
/// │  │ [F0] [F1] [F2] ...       │  │ Box<dyn Replacer>     │    │
/// │  └──────────────────────────┘  └───────────────────────┘    │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `state`: one `Mutex` serializing every public operation, including
///   the disk I/O it performs. Only one eviction decision is ever in flight.
/// - `replacer`: its own internal lock; only called with `state` held,
///   except [`BufferPoolManager::replacer_size`].
/// - `pages`: fixed arena; each [`Page`] latches its own metadata and content.
/// - `stats`: atomic counters.
///
/// # Pinning
/// Every successful [`fetch_page`](Self::fetch_page) or
/// [`new_page`](Self::new_page) pins the page once; the caller must release
/// that pin with exactly one [`unpin_page`](Self::unpin_page). The guard
/// methods do this automatically.
///
/// # Usage
/// ```
/// use clockpool::{BufferPoolManager, MemoryDiskManager};
///
/// let bpm = BufferPoolManager::new(10, MemoryDiskManager::new());
///
/// // Allocate a new page
/// let mut guard = bpm.new_page_write().unwrap();
/// guard.as_mut_slice()[0] = 0xAB;
/// let page_id = guard.page_id();
/// drop(guard); // marked dirty, unpinned
///
/// // Fetch it again for reading
/// let guard = bpm.fetch_page_read(page_id).unwrap();
/// assert_eq!(guard.as_slice()[0], 0xAB);
/// ```
pub struct BufferPoolManager {
    /// One page slot per frame, allocated at startup.
    pages: Vec<Page>,

    /// Eviction policy over frames whose pin count is zero.
    replacer: Box<dyn Replacer>,

    state: Mutex<PoolState>,

    stats: BufferPoolStats,

    pool_size: usize,

    replacer_kind: ReplacerKind,
}

impl BufferPoolManager {
    /// Create a buffer pool with `pool_size` frames and the clock policy.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new<D: DiskManager + 'static>(pool_size: usize, disk: D) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        let config = BufferPoolConfig::default().with_pool_size(pool_size);
        Self::build(config, Box::new(disk))
    }

    /// Create a buffer pool from a validated configuration.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if the configuration is rejected.
    pub fn with_config<D: DiskManager + 'static>(config: BufferPoolConfig, disk: D) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, Box::new(disk)))
    }

    fn build(config: BufferPoolConfig, disk: Box<dyn DiskManager>) -> Self {
        let pool_size = config.pool_size;

        let pages: Vec<Page> = (0..pool_size).map(|_| Page::new()).collect();
        let free_list: VecDeque<FrameId> = (0..pool_size).map(FrameId::new).collect();

        log::info!(
            "buffer pool created: {} frames, {:?} replacer",
            pool_size,
            config.replacer
        );

        Self {
            pages,
            replacer: config.replacer.build(pool_size),
            state: Mutex::new(PoolState {
                page_table: HashMap::with_capacity(pool_size),
                free_list,
                disk,
            }),
            stats: BufferPoolStats::new(),
            pool_size,
            replacer_kind: config.replacer,
        }
    }

    // ========================================================================
    // Public API: pin-based access
    // ========================================================================

    /// Pin `page_id` in a frame, loading it from disk if it is not resident.
    ///
    /// # Errors
    /// - `Error::PoolExhausted` if every frame is pinned
    /// - `Error::PageNotFound` if the disk collaborator has no such page
    /// - I/O errors from the read or from writing back an evicted page
    pub fn fetch_page(&self, page_id: PageId) -> Result<&Page> {
        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            self.pages[frame_id.index()].pin();
            self.replacer.pin(frame_id);
            self.stats.record_hit();
            log::trace!("hit {} in {}", page_id, frame_id);
            return Ok(&self.pages[frame_id.index()]);
        }

        self.stats.record_miss();
        let frame_id = self.acquire_frame(&mut state)?;
        let page = &self.pages[frame_id.index()];

        if let Err(err) = page.load(page_id, state.disk.as_mut()) {
            state.free_list.push_front(frame_id);
            return Err(err);
        }
        self.stats.record_read();

        state.page_table.insert(page_id, frame_id);
        self.replacer.pin(frame_id);
        log::trace!("miss {} loaded into {}", page_id, frame_id);

        Ok(page)
    }

    /// Allocate a fresh page on disk and pin it in a zeroed frame.
    ///
    /// A frame is secured before the disk is asked for an identity, so an
    /// exhausted pool allocates nothing.
    ///
    /// # Errors
    /// - `Error::PoolExhausted` if every frame is pinned
    /// - I/O errors from allocation or from writing back an evicted page
    pub fn new_page(&self) -> Result<(PageId, &Page)> {
        let mut state = self.state.lock();

        let frame_id = self.acquire_frame(&mut state)?;
        let page_id = match state.disk.allocate_page() {
            Ok(page_id) => page_id,
            Err(err) => {
                state.free_list.push_front(frame_id);
                return Err(err);
            }
        };

        let page = &self.pages[frame_id.index()];
        page.reset(page_id, 1);

        state.page_table.insert(page_id, frame_id);
        self.replacer.pin(frame_id);
        self.stats.record_allocation();
        log::trace!("new {} in {}", page_id, frame_id);

        Ok((page_id, page))
    }

    /// Release one pin on `page_id`, marking it dirty if `is_dirty`.
    ///
    /// Unpinning a page that is not resident is a successful no-op. When the
    /// pin count reaches zero the frame becomes eligible for eviction.
    ///
    /// # Errors
    /// `Error::UnbalancedUnpin` if the page's pin count is already zero.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<()> {
        let state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(());
        };

        match self.pages[frame_id.index()].unpin(is_dirty) {
            None => {
                log::warn!("unbalanced unpin of {}", page_id);
                Err(Error::UnbalancedUnpin(page_id))
            }
            Some(0) => {
                self.replacer.unpin(frame_id);
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    /// Delete `page_id` from the pool and deallocate it on disk.
    ///
    /// The disk collaborator is told to deallocate first, whether or not the
    /// page is resident and whether or not the delete then succeeds.
    ///
    /// # Errors
    /// - `Error::PageInUse` if the page is resident and pinned
    /// - Errors from the collaborator's deallocation
    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut state = self.state.lock();

        state.disk.deallocate_page(page_id)?;

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(());
        };

        let page = &self.pages[frame_id.index()];
        if page.is_pinned() {
            log::warn!(
                "refusing to delete {} with pin count {}",
                page_id,
                page.pin_count()
            );
            return Err(Error::PageInUse(page_id));
        }

        state.page_table.remove(&page_id);
        self.replacer.pin(frame_id);
        page.clear();
        state.free_list.push_back(frame_id);

        self.stats.record_delete();
        log::debug!("deleted {} from {}", page_id, frame_id);
        Ok(())
    }

    // ========================================================================
    // Public API: flush pages
    // ========================================================================

    /// Write `page_id` back to disk if it is dirty.
    ///
    /// Flushing does not require the page to be unpinned. If a writer holds
    /// the page's content latch, the pool lock is released while waiting for
    /// it, so other threads (including the writer) keep using the pool. A
    /// thread must still not flush a page while it holds that page's
    /// [`PageWriteGuard`].
    ///
    /// # Errors
    /// - `Error::NotResident` if the page is not in the pool
    /// - I/O errors from the write
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let mut waited = false;
        loop {
            let mut state = self.state.lock();
            let frame_id = match state.page_table.get(&page_id) {
                Some(&frame_id) => frame_id,
                // Evicted while we waited; eviction wrote it back.
                None if waited => return Ok(()),
                None => return Err(Error::NotResident(page_id)),
            };

            let page = &self.pages[frame_id.index()];
            match page.try_write_back(state.disk.as_mut())? {
                Some(written) => {
                    if written {
                        self.stats.record_write();
                    }
                    return Ok(());
                }
                None => {
                    drop(state);
                    log::trace!("flush of {} waiting for writer", page_id);
                    page.wait_for_writer();
                    waited = true;
                }
            }
        }
    }

    /// Write every dirty resident page back to disk.
    ///
    /// Pages whose content is latched for writing are skipped and stay
    /// dirty.
    ///
    /// # Errors
    /// Stops at the first failed write.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut state = self.state.lock();

        let resident: Vec<(PageId, FrameId)> =
            state.page_table.iter().map(|(&p, &f)| (p, f)).collect();
        let mut written = 0usize;
        let mut skipped = 0usize;
        for (page_id, frame_id) in &resident {
            match self.pages[frame_id.index()].try_write_back(state.disk.as_mut())? {
                Some(true) => {
                    self.stats.record_write();
                    written += 1;
                }
                Some(false) => {}
                None => {
                    log::trace!("flush skipped {}: latched by a writer", page_id);
                    skipped += 1;
                }
            }
        }

        log::debug!(
            "flushed {} of {} resident pages ({} latched)",
            written,
            resident.len(),
            skipped
        );
        Ok(())
    }

    // ========================================================================
    // Public API: guarded access
    // ========================================================================

    /// Fetch a page for reading (shared content latch).
    ///
    /// The page is unpinned, clean, when the guard drops.
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let page = self.fetch_page(page_id)?;
        Ok(PageReadGuard::new(self, page_id, page.data()))
    }

    /// Fetch a page for writing (exclusive content latch).
    ///
    /// The page is marked dirty before the latch is taken, so a flush that
    /// waits for the guard sees the write. It is marked dirty again and
    /// unpinned when the guard drops.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let page = self.fetch_page(page_id)?;
        page.mark_dirty();
        Ok(PageWriteGuard::new(self, page_id, page.data_mut()))
    }

    /// Allocate a new page and return a write guard for it.
    pub fn new_page_write(&self) -> Result<PageWriteGuard<'_>> {
        let (page_id, page) = self.new_page()?;
        page.mark_dirty();
        Ok(PageWriteGuard::new(self, page_id, page.data_mut()))
    }

    // ========================================================================
    // Public API: stats and info
    // ========================================================================

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn replacer_kind(&self) -> ReplacerKind {
        self.replacer_kind
    }

    /// Number of frames on the free list.
    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Number of resident pages.
    pub fn page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    /// Number of frames the replacer considers evictable.
    ///
    /// Reads the replacer under its shared lock without taking the pool lock.
    pub fn replacer_size(&self) -> usize {
        self.replacer.size()
    }

    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// Pin count of `page_id`, or `None` if it is not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.resident_page(page_id).map(Page::pin_count)
    }

    /// Dirty flag of `page_id`, or `None` if it is not resident.
    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.resident_page(page_id).map(Page::is_dirty)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn resident_page(&self, page_id: PageId) -> Option<&Page> {
        let state = self.state.lock();
        let frame_id = state.page_table.get(&page_id).copied()?;
        Some(&self.pages[frame_id.index()])
    }

    /// Take a free frame, or evict the replacer's victim.
    ///
    /// The returned frame is empty and untracked by the replacer.
    fn acquire_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let Some(frame_id) = self.replacer.victim() else {
            self.stats.record_exhausted();
            log::warn!("buffer pool exhausted: all {} frames pinned", self.pool_size);
            return Err(Error::PoolExhausted);
        };

        self.evict(state, frame_id)?;
        Ok(frame_id)
    }

    /// Write back and unmap whatever page `frame_id` holds.
    fn evict(&self, state: &mut PoolState, frame_id: FrameId) -> Result<()> {
        let page = &self.pages[frame_id.index()];
        let old_page_id = page.page_id();
        if !old_page_id.is_valid() {
            return Ok(());
        }
        debug_assert_eq!(page.pin_count(), 0, "victim {} is pinned", frame_id);

        match page.write_back(state.disk.as_mut()) {
            Ok(true) => self.stats.record_write(),
            Ok(false) => {}
            // Deallocated while resident: nothing left on disk to write to.
            Err(Error::PageNotFound(_)) => {
                log::debug!("discarding {}: no longer on disk", old_page_id);
            }
            Err(err) => {
                self.replacer.unpin(frame_id);
                return Err(err);
            }
        }

        state.page_table.remove(&old_page_id);
        page.clear();
        self.stats.record_eviction();
        log::debug!("evicted {} from {}", old_page_id, frame_id);
        Ok(())
    }

}
