//! Disk collaborator interface and the file-backed implementation.
//!
//! The buffer pool never touches files directly. It talks to a
//! [`DiskManager`], which reads and writes whole pages and hands out fresh
//! page identities.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};

/// Page-granular storage consumed by the buffer pool.
///
/// All calls block until complete. Methods take `&mut self`: the
/// [`BufferPoolManager`](crate::BufferPoolManager) owns its collaborator and
/// serializes every call under its pool lock.
pub trait DiskManager: Send {
    /// Fill `dst` (exactly [`PAGE_SIZE`] bytes) with the stored content of `page_id`.
    fn read_page(&mut self, page_id: PageId, dst: &mut [u8]) -> Result<()>;

    /// Persist `src` (exactly [`PAGE_SIZE`] bytes) as the content of `page_id`.
    fn write_page(&mut self, page_id: PageId, src: &[u8]) -> Result<()>;

    /// Hand out a fresh, never-used page identity. Its content reads as zeroes.
    fn allocate_page(&mut self) -> Result<PageId>;

    /// Reclaim the space of `page_id`. May be a no-op.
    fn deallocate_page(&mut self, page_id: PageId) -> Result<()>;
}

/// Stores pages in a single file.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// # Durability
/// Writes and allocations are followed by `sync_data()`.
///
/// # Deallocation
/// Deallocation is a no-op: identities are never reused and the file never
/// shrinks.
pub struct FileDiskManager {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
}

impl FileDiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
        })
    }

    /// Open an existing database file.
    ///
    /// A trailing partial page is ignored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let page_count = page_count_for(file.metadata()?.len())?;

        Ok(Self { file, page_count })
    }

    /// Open an existing database file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Number of pages allocated in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Size of the database file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        u64::from(self.page_count) * PAGE_SIZE as u64
    }

    fn check_allocated(&self, page_id: PageId) -> Result<()> {
        if !page_id.is_valid() || page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id));
        }
        Ok(())
    }
}

/// Whole pages in a file of `file_size` bytes.
fn page_count_for(file_size: u64) -> Result<u32> {
    let pages = file_size / PAGE_SIZE as u64;
    u32::try_from(pages).map_err(|_| {
        std::io::Error::other(format!("file holds {} pages, beyond the page id space", pages))
            .into()
    })
}

impl DiskManager for FileDiskManager {
    fn read_page(&mut self, page_id: PageId, dst: &mut [u8]) -> Result<()> {
        self.check_allocated(page_id)?;

        self.file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        self.file.read_exact(&mut dst[..PAGE_SIZE])?;
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, src: &[u8]) -> Result<()> {
        self.check_allocated(page_id)?;

        self.file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        self.file.write_all(&src[..PAGE_SIZE])?;
        self.file.sync_data()?;
        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);
        if !page_id.is_valid() {
            return Err(std::io::Error::other("page id space exhausted").into());
        }

        // Extend file with a zeroed page
        self.file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.sync_data()?;

        self.page_count += 1;
        log::debug!("allocated {} (file now {} pages)", page_id, self.page_count);
        Ok(page_id)
    }

    fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        log::debug!("deallocate {} ignored by file disk manager", page_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn page_of(byte: u8) -> Vec<u8> {
        vec![byte; PAGE_SIZE]
    }

    #[test]
    fn test_create_new_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let dm = FileDiskManager::create(&path).unwrap();
        assert_eq!(dm.page_count(), 0);
        assert_eq!(dm.file_size(), 0);

        // A second create on the same path fails
        assert!(FileDiskManager::create(&path).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.db");

        assert!(matches!(FileDiskManager::open(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_allocate_reads_zeroes() {
        let dir = tempdir().unwrap();
        let mut dm = FileDiskManager::create(dir.path().join("test.db")).unwrap();

        let page_id = dm.allocate_page().unwrap();
        assert_eq!(page_id, PageId::new(0));
        assert_eq!(dm.page_count(), 1);

        let mut buf = page_of(0xEE);
        dm.read_page(page_id, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let mut dm = FileDiskManager::create(dir.path().join("test.db")).unwrap();

        let first = dm.allocate_page().unwrap();
        let second = dm.allocate_page().unwrap();

        dm.write_page(first, &page_of(0xAB)).unwrap();
        dm.write_page(second, &page_of(0xCD)).unwrap();

        let mut buf = page_of(0);
        dm.read_page(first, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xAB));

        dm.read_page(second, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xCD));
        assert_eq!(dm.file_size(), 2 * PAGE_SIZE as u64);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = FileDiskManager::open_or_create(&path).unwrap();
            let page_id = dm.allocate_page().unwrap();
            dm.write_page(page_id, &page_of(0x42)).unwrap();
        }

        {
            let mut dm = FileDiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 1);

            let mut buf = page_of(0);
            dm.read_page(PageId::new(0), &mut buf).unwrap();
            assert_eq!(buf[0], 0x42);

            // Identities keep growing after reopen
            assert_eq!(dm.allocate_page().unwrap(), PageId::new(1));
        }
    }

    #[test]
    fn test_unallocated_page_rejected() {
        let dir = tempdir().unwrap();
        let mut dm = FileDiskManager::create(dir.path().join("test.db")).unwrap();
        dm.allocate_page().unwrap();

        let mut buf = page_of(0);
        assert!(matches!(
            dm.read_page(PageId::new(1), &mut buf),
            Err(Error::PageNotFound(_))
        ));
        assert!(matches!(
            dm.write_page(PageId::INVALID, &buf),
            Err(Error::PageNotFound(_))
        ));
    }

    #[test]
    fn test_page_count_for_file_size() {
        let page = PAGE_SIZE as u64;
        assert_eq!(page_count_for(0).unwrap(), 0);
        assert_eq!(page_count_for(3 * page + 17).unwrap(), 3);
        assert_eq!(page_count_for(u64::from(u32::MAX) * page).unwrap(), u32::MAX);

        // One page beyond what a u32 can count
        assert!(matches!(
            page_count_for((u64::from(u32::MAX) + 1) * page),
            Err(Error::Io(_))
        ));
        assert!(matches!(page_count_for(u64::MAX), Err(Error::Io(_))));
    }

    #[test]
    fn test_deallocate_is_noop() {
        let dir = tempdir().unwrap();
        let mut dm = FileDiskManager::create(dir.path().join("test.db")).unwrap();
        let page_id = dm.allocate_page().unwrap();

        dm.deallocate_page(page_id).unwrap();

        assert_eq!(dm.page_count(), 1);
        assert_eq!(dm.allocate_page().unwrap(), PageId::new(1));
    }
}
