//! RAII guards for page access.
//!
//! These guards provide safe access to pages in the buffer pool:
//! - [`PageReadGuard`] - Shared read access (multiple allowed)
//! - [`PageWriteGuard`] - Exclusive write access (auto-marks dirty)
//!
//! Both guards release the content latch first, then unpin the page.

use std::ops::{Deref, DerefMut};

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use crate::buffer::BufferPoolManager;
use crate::common::PageId;

/// Guard for read-only page access.
///
/// Multiple `PageReadGuard`s can exist for the same page simultaneously.
/// The page is unpinned clean when the guard is dropped.
///
/// # Example
/// ```
/// use clockpool::{BufferPoolManager, MemoryDiskManager};
///
/// let bpm = BufferPoolManager::new(4, MemoryDiskManager::new());
/// let page_id = bpm.new_page_write().unwrap().page_id();
///
/// let guard = bpm.fetch_page_read(page_id).unwrap();
/// assert_eq!(guard[0], 0);
/// drop(guard);
/// assert_eq!(bpm.pin_count(page_id), Some(0));
/// ```
pub struct PageReadGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    /// `None` once released.
    lock: Option<MappedRwLockReadGuard<'a, [u8]>>,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        page_id: PageId,
        lock: MappedRwLockReadGuard<'a, [u8]>,
    ) -> Self {
        Self {
            bpm,
            page_id,
            lock: Some(lock),
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self
    }

    /// Release the latch and the pin now. Later calls have no effect.
    pub fn drop_guard(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(lock) = self.lock.take() {
            drop(lock);
            if let Err(err) = self.bpm.unpin_page(self.page_id, false) {
                log::error!("read guard for {} failed to unpin: {}", self.page_id, err);
            }
        }
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match &self.lock {
            Some(lock) => lock,
            None => &[],
        }
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Guard for exclusive write access to a page.
///
/// Only one `PageWriteGuard` can exist for a page at a time.
/// The page is marked dirty and unpinned when the guard is dropped.
pub struct PageWriteGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    lock: Option<MappedRwLockWriteGuard<'a, [u8]>>,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        page_id: PageId,
        lock: MappedRwLockWriteGuard<'a, [u8]>,
    ) -> Self {
        Self {
            bpm,
            page_id,
            lock: Some(lock),
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }

    /// Release the latch and the pin now, marking the page dirty.
    pub fn drop_guard(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(lock) = self.lock.take() {
            drop(lock);
            if let Err(err) = self.bpm.unpin_page(self.page_id, true) {
                log::error!("write guard for {} failed to unpin: {}", self.page_id, err);
            }
        }
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match &self.lock {
            Some(lock) => lock,
            None => &[],
        }
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        match &mut self.lock {
            Some(lock) => lock,
            None => &mut [],
        }
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use crate::storage::MemoryDiskManager;
    use crate::BufferPoolManager;

    #[test]
    fn test_read_guard_unpins_clean() {
        let bpm = BufferPoolManager::new(4, MemoryDiskManager::new());
        let (pid, _) = bpm.new_page().unwrap();
        bpm.unpin_page(pid, false).unwrap();

        {
            let g1 = bpm.fetch_page_read(pid).unwrap();
            let g2 = bpm.fetch_page_read(pid).unwrap();
            assert_eq!(g1.page_id(), pid);
            assert_eq!(g1.as_slice(), g2.as_slice());
            assert_eq!(bpm.pin_count(pid), Some(2));
        }

        assert_eq!(bpm.pin_count(pid), Some(0));
        assert_eq!(bpm.is_dirty(pid), Some(false));
    }

    #[test]
    fn test_write_guard_marks_dirty() {
        let bpm = BufferPoolManager::new(4, MemoryDiskManager::new());
        let mut guard = bpm.new_page_write().unwrap();
        let pid = guard.page_id();
        guard[..4].copy_from_slice(&[1, 2, 3, 4]);
        drop(guard);

        assert_eq!(bpm.pin_count(pid), Some(0));
        assert_eq!(bpm.is_dirty(pid), Some(true));

        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(&guard[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_drop_guard_releases_once() {
        let bpm = BufferPoolManager::new(4, MemoryDiskManager::new());
        let pid = bpm.new_page_write().unwrap().page_id();

        // Extra pin so a double unpin would show up
        bpm.fetch_page(pid).unwrap();

        let mut guard = bpm.fetch_page_write(pid).unwrap();
        guard.drop_guard();
        guard.drop_guard();
        assert_eq!(bpm.pin_count(pid), Some(1));
        assert!(guard.is_empty());
        drop(guard);
        assert_eq!(bpm.pin_count(pid), Some(1));

        bpm.unpin_page(pid, false).unwrap();
        assert_eq!(bpm.pin_count(pid), Some(0));
    }

    #[test]
    fn test_write_guard_excludes_readers() {
        let bpm = Arc::new(BufferPoolManager::new(4, MemoryDiskManager::new()));
        let pid = bpm.new_page_write().unwrap().page_id();

        let mut guard = bpm.fetch_page_write(pid).unwrap();
        let reader = {
            let bpm = Arc::clone(&bpm);
            thread::spawn(move || {
                let guard = bpm.fetch_page_read(pid).unwrap();
                guard[0]
            })
        };

        guard[0] = 0x5A;
        drop(guard);

        assert_eq!(reader.join().unwrap(), 0x5A);
        assert_eq!(bpm.pin_count(pid), Some(0));
    }
}
