//! Helpers shared by the integration tests.

#![allow(dead_code)]

use clockpool::{BufferPoolManager, DiskManager, FileDiskManager, MemoryDiskManager, PageId};
use tempfile::{tempdir, TempDir};

/// Route `log` output through the test harness. Set `RUST_LOG=trace` to see it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A file-backed pool in a fresh temporary directory.
pub fn create_bpm(pool_size: usize) -> (BufferPoolManager, TempDir) {
    init_logging();
    let dir = tempdir().unwrap();
    let dm = FileDiskManager::create(dir.path().join("test.db")).unwrap();
    (BufferPoolManager::new(pool_size, dm), dir)
}

/// A file-backed pool whose disk already holds `num_pages` zeroed pages.
pub fn create_bpm_with_pages(
    pool_size: usize,
    num_pages: usize,
) -> (BufferPoolManager, Vec<PageId>, TempDir) {
    init_logging();
    let dir = tempdir().unwrap();
    let mut dm = FileDiskManager::create(dir.path().join("test.db")).unwrap();
    let page_ids = (0..num_pages).map(|_| dm.allocate_page().unwrap()).collect();
    (BufferPoolManager::new(pool_size, dm), page_ids, dir)
}

/// A memory-backed pool plus an observer sharing its disk.
pub fn create_memory_bpm(pool_size: usize) -> (BufferPoolManager, MemoryDiskManager) {
    init_logging();
    let disk = MemoryDiskManager::new();
    (BufferPoolManager::new(pool_size, disk.clone()), disk)
}

/// Write a null-terminated string to page data.
pub fn copy_string(data: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    data[..bytes.len()].copy_from_slice(bytes);
    data[bytes.len()] = 0;
}

/// Read a null-terminated string from page data.
pub fn read_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).to_string()
}
