//! Integration tests for the disk manager and page store

use leafdb::buffer::PageStore;
use leafdb::common::PageId;
use leafdb::storage::disk::DiskManager;
use leafdb::LeafDbError;
use tempfile::NamedTempFile;

const PAGE_SIZE: usize = 4096;

#[test]
fn test_disk_manager_empty_file() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::open(temp_file.path(), PAGE_SIZE).unwrap();

    assert_eq!(dm.num_pages_on_disk(), 0);
    assert_eq!(dm.get_num_reads(), 0);
    assert_eq!(dm.get_num_writes(), 0);
}

#[test]
fn test_disk_manager_read_write_page() {
    let temp_file = NamedTempFile::new().unwrap();
    let dm = DiskManager::open(temp_file.path(), PAGE_SIZE).unwrap();

    // Write pattern
    let write_data: Vec<u8> = (0..PAGE_SIZE).map(|i| (i % 256) as u8).collect();
    dm.write_page(PageId::new(2), &write_data).unwrap();

    // Read back
    let mut read_data = vec![0u8; PAGE_SIZE];
    dm.read_page(PageId::new(2), &mut read_data).unwrap();
    assert_eq!(write_data, read_data);

    // The gap before page 2 reads as zeros
    dm.read_page(PageId::new(0), &mut read_data).unwrap();
    assert!(read_data.iter().all(|&b| b == 0));

    assert_eq!(dm.get_num_writes(), 1);
    assert_eq!(dm.get_num_reads(), 2);
}

#[test]
fn test_disk_manager_rejects_partial_page() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), vec![7u8; PAGE_SIZE + 1]).unwrap();

    assert!(matches!(
        DiskManager::open(temp_file.path(), PAGE_SIZE),
        Err(LeafDbError::CorruptFile { .. })
    ));
}

#[test]
fn test_page_store_out_of_bounds() {
    let temp_file = NamedTempFile::new().unwrap();
    let mut store = PageStore::open(temp_file.path(), PAGE_SIZE, 100).unwrap();

    assert!(store.get_page(PageId::new(99)).is_ok());
    assert!(matches!(
        store.get_page(PageId::new(100)),
        Err(LeafDbError::PageOutOfBounds { max_pages: 100, .. })
    ));
}

#[test]
fn test_page_store_persists_on_flush() {
    let temp_file = NamedTempFile::new().unwrap();

    {
        let mut store = PageStore::open(temp_file.path(), PAGE_SIZE, 10).unwrap();
        for i in 0..3 {
            let id = store.get_unused_page_num();
            assert_eq!(id, PageId::new(i));
            store.get_page(id).unwrap()[0] = i as u8 + 10;
        }
        assert_eq!(store.flush_all().unwrap(), 3);
    }

    let mut store = PageStore::open(temp_file.path(), PAGE_SIZE, 10).unwrap();
    assert_eq!(store.num_pages(), 3);
    assert_eq!(store.cached_page_count(), 0);
    assert_eq!(store.get_page(PageId::new(1)).unwrap()[0], 11);
    assert_eq!(store.get_unused_page_num(), PageId::new(3));
}

#[test]
fn test_page_store_flush_uncached_page() {
    let temp_file = NamedTempFile::new().unwrap();
    let store = PageStore::open(temp_file.path(), PAGE_SIZE, 10).unwrap();

    assert!(matches!(
        store.flush(PageId::new(0)),
        Err(LeafDbError::PageNotCached(_))
    ));
}
