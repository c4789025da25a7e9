//! Page - one frame slot of the buffer pool.
//!
//! A [`Page`] owns a [`PageBuf`] plus the metadata the buffer pool needs:
//! - Which logical page is loaded ([`PageId::INVALID`] when empty)
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking
//!
//! The pool allocates one `Page` per frame at startup and never frees it;
//! only its contents are recycled.

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::common::{PageId, Result};
use crate::storage::page::PageBuf;
use crate::storage::DiskManager;

#[derive(Debug, Clone, Copy)]
struct PageMeta {
    page_id: PageId,
    pin_count: u32,
    is_dirty: bool,
}

impl PageMeta {
    const EMPTY: PageMeta = PageMeta {
        page_id: PageId::INVALID,
        pin_count: 0,
        is_dirty: false,
    };
}

/// A frame slot holding at most one resident page.
///
/// # Latching
/// - `meta`: the page latch. Metadata is mutated only under its write mode;
///   the public accessors take its read mode.
/// - `data`: the content latch. Callers holding a pin read and write the
///   content through [`Page::data`] / [`Page::data_mut`].
///
/// When both are needed they are taken `meta` first, then `data`. The buffer
/// pool only touches metadata of pages other callers may be using, and only
/// blocks on the content of unpinned pages. Flushing a pinned page tries
/// `data` without blocking and waits for a writer only after the pool lock
/// is released.
pub struct Page {
    meta: RwLock<PageMeta>,
    data: RwLock<Box<PageBuf>>,
}

impl Page {
    /// Create an empty frame slot.
    pub fn new() -> Self {
        Self {
            meta: RwLock::new(PageMeta::EMPTY),
            data: RwLock::new(PageBuf::boxed()),
        }
    }

    // ========================================================================
    // Metadata accessors (read latch)
    // ========================================================================

    /// Identity of the loaded page, or [`PageId::INVALID`] if empty.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.meta.read().page_id
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.meta.read().pin_count
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Whether the content differs from what the disk collaborator holds.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.meta.read().is_dirty
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.page_id().is_valid()
    }

    // ========================================================================
    // Content access (content latch)
    // ========================================================================

    /// Shared access to the page content.
    pub fn data(&self) -> MappedRwLockReadGuard<'_, [u8]> {
        RwLockReadGuard::map(self.data.read(), |buf| buf.as_slice())
    }

    /// Exclusive access to the page content.
    ///
    /// Writing does not mark the page dirty; pass `is_dirty = true` to
    /// [`BufferPoolManager::unpin_page`](crate::BufferPoolManager::unpin_page).
    pub fn data_mut(&self) -> MappedRwLockWriteGuard<'_, [u8]> {
        RwLockWriteGuard::map(self.data.write(), |buf| buf.as_mut_slice())
    }

    // ========================================================================
    // Buffer pool internals (write latch)
    // ========================================================================

    /// Add a pin. Returns the new pin count.
    pub(crate) fn pin(&self) -> u32 {
        let mut meta = self.meta.write();
        meta.pin_count += 1;
        meta.pin_count
    }

    /// Drop a pin and OR in the dirty flag. Returns the new pin count, or
    /// `None` if the page was not pinned.
    pub(crate) fn unpin(&self, mark_dirty: bool) -> Option<u32> {
        let mut meta = self.meta.write();
        if meta.pin_count == 0 {
            return None;
        }
        meta.pin_count -= 1;
        meta.is_dirty |= mark_dirty;
        Some(meta.pin_count)
    }

    /// Zero the content and install fresh metadata.
    pub(crate) fn reset(&self, page_id: PageId, pin_count: u32) {
        let mut meta = self.meta.write();
        self.data.write().reset();
        *meta = PageMeta {
            page_id,
            pin_count,
            is_dirty: false,
        };
    }

    /// Return the slot to the empty state.
    pub(crate) fn clear(&self) {
        self.reset(PageId::INVALID, 0);
    }

    /// Reset the slot to hold `page_id` pinned once, then read its content.
    ///
    /// Both latches are held in write mode across the read. On error the
    /// slot is left empty.
    pub(crate) fn load(&self, page_id: PageId, disk: &mut dyn DiskManager) -> Result<()> {
        let mut meta = self.meta.write();
        let mut data = self.data.write();
        data.reset();

        if let Err(err) = disk.read_page(page_id, data.as_mut_slice()) {
            data.reset();
            *meta = PageMeta::EMPTY;
            return Err(err);
        }

        *meta = PageMeta {
            page_id,
            pin_count: 1,
            is_dirty: false,
        };
        Ok(())
    }

    /// Set the dirty flag without dropping a pin.
    pub(crate) fn mark_dirty(&self) {
        self.meta.write().is_dirty = true;
    }

    /// Write the content back if dirty, then clear the dirty flag.
    ///
    /// Returns `true` if a write was issued. The dirty flag survives a
    /// failed write. Blocks on the content latch, so only call this for a
    /// page nobody holds a pin on.
    pub(crate) fn write_back(&self, disk: &mut dyn DiskManager) -> Result<bool> {
        let mut meta = self.meta.write();
        if !meta.is_dirty || !meta.page_id.is_valid() {
            return Ok(false);
        }

        let data = self.data.read();
        Self::store(&mut meta, &data, disk)
    }

    /// Like [`Page::write_back`], but returns `Ok(None)` instead of waiting
    /// when someone holds the content latch for writing.
    pub(crate) fn try_write_back(&self, disk: &mut dyn DiskManager) -> Result<Option<bool>> {
        let mut meta = self.meta.write();
        if !meta.is_dirty || !meta.page_id.is_valid() {
            return Ok(Some(false));
        }

        let Some(data) = self.data.try_read() else {
            return Ok(None);
        };
        Self::store(&mut meta, &data, disk).map(Some)
    }

    /// Block until no writer holds the content latch.
    pub(crate) fn wait_for_writer(&self) {
        drop(self.data.read());
    }

    fn store(meta: &mut PageMeta, data: &PageBuf, disk: &mut dyn DiskManager) -> Result<bool> {
        disk.write_page(meta.page_id, data.as_slice())?;
        meta.is_dirty = false;
        Ok(true)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
