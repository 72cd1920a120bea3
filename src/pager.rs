//! Fixed-size page I/O over the database file.
//!
//! The pager owns the file handle and every page buffer. Pages are loaded
//! lazily, cached for the rest of the session and written back on
//! [`Pager::close`]. Nothing is evicted; the cache holds at most the pages
//! touched this session, never more than `max_pages`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace};

use crate::{DbError, PAGE_SIZE, Result};

pub type Page = [u8; PAGE_SIZE];

struct CachedPage {
    data: Box<Page>,
    dirty: bool,
}

pub struct Pager {
    file: File,
    /// Pages present in the file when it was opened.
    file_pages: u32,
    num_pages: u32,
    max_pages: u32,
    pages: HashMap<u32, CachedPage>,
}

impl Pager {
    pub fn open(path: &Path, max_pages: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        if len % PAGE_SIZE as u64 != 0 {
            return Err(DbError::CorruptFile {
                len,
                reason: "not a whole number of pages",
            });
        }
        let file_pages = u32::try_from(len / PAGE_SIZE as u64).unwrap_or(u32::MAX);
        if file_pages > max_pages {
            return Err(DbError::CorruptFile {
                len,
                reason: "more pages than the configured maximum",
            });
        }

        debug!(path = %path.display(), pages = file_pages, "opened database file");

        Ok(Self {
            file,
            file_pages,
            num_pages: file_pages,
            max_pages,
            pages: HashMap::new(),
        })
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Returns the next unused page number. The page reads as zeroes until written.
    pub fn allocate_page(&mut self) -> Result<u32> {
        if self.num_pages >= self.max_pages {
            return Err(DbError::TableFull);
        }
        let page_num = self.num_pages;
        self.num_pages += 1;
        debug!(page = page_num, "allocated page");
        Ok(page_num)
    }

    pub fn get_page(&mut self, page_num: u32) -> Result<&Page> {
        let cached = self.load(page_num)?;
        Ok(&*cached.data)
    }

    /// Like [`Pager::get_page`], but marks the page dirty so it is written on close.
    pub fn get_page_mut(&mut self, page_num: u32) -> Result<&mut Page> {
        let cached = self.load(page_num)?;
        cached.dirty = true;
        Ok(&mut *cached.data)
    }

    fn load(&mut self, page_num: u32) -> Result<&mut CachedPage> {
        if page_num >= self.num_pages {
            return Err(DbError::PageOutOfBounds {
                page: page_num,
                max: self.num_pages,
            });
        }

        match self.pages.entry(page_num) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut data = Box::new([0u8; PAGE_SIZE]);
                if page_num < self.file_pages {
                    trace!(page = page_num, "reading page from disk");
                    self.file
                        .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
                    self.file.read_exact(&mut data[..])?;
                }
                Ok(entry.insert(CachedPage { data, dirty: false }))
            }
        }
    }

    /// Writes one cached page back to its offset in the file.
    pub fn flush(&mut self, page_num: u32) -> Result<()> {
        let Some(cached) = self.pages.get(&page_num) else {
            return Err(DbError::PageOutOfBounds {
                page: page_num,
                max: self.num_pages,
            });
        };

        trace!(page = page_num, "flushing page");
        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(&cached.data[..])?;
        Ok(())
    }

    /// Flushes every page that changed or that is new to the file, then syncs.
    pub fn close(mut self) -> Result<()> {
        // Allocated but never fetched pages must still reach the file, or
        // its length stops matching the page count.
        for page_num in self.file_pages..self.num_pages {
            self.load(page_num)?;
        }

        let mut flushed = 0;
        for page_num in 0..self.num_pages {
            let needs_flush = match self.pages.get(&page_num) {
                Some(cached) => cached.dirty || page_num >= self.file_pages,
                None => false,
            };
            if needs_flush {
                self.flush(page_num)?;
                flushed += 1;
            }
        }

        self.file.sync_all()?;
        debug!(flushed, pages = self.num_pages, "closed database file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn db_path(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join("test.db")
    }

    #[test]
    fn opens_a_new_file_empty() {
        let dir = TempDir::new().unwrap();
        let pager = Pager::open(&db_path(&dir), 10).unwrap();
        assert_eq!(pager.num_pages(), 0);
        assert_eq!(pager.max_pages, 10);
    }

    #[test]
    fn rejects_a_partial_page_file() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);
        std::fs::write(&path, vec![0u8; PAGE_SIZE + 1]).unwrap();

        assert!(matches!(
            Pager::open(&path, 10),
            Err(DbError::CorruptFile { len, .. }) if len == PAGE_SIZE as u64 + 1
        ));
    }

    #[test]
    fn rejects_a_file_larger_than_the_ceiling() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);
        std::fs::write(&path, vec![0u8; PAGE_SIZE * 3]).unwrap();

        assert!(matches!(
            Pager::open(&path, 2),
            Err(DbError::CorruptFile { .. })
        ));
    }

    #[test]
    fn allocates_up_to_the_ceiling() {
        let dir = TempDir::new().unwrap();
        let mut pager = Pager::open(&db_path(&dir), 2).unwrap();

        assert_eq!(pager.allocate_page().unwrap(), 0);
        assert_eq!(pager.allocate_page().unwrap(), 1);
        assert!(matches!(pager.allocate_page(), Err(DbError::TableFull)));
        assert_eq!(pager.num_pages(), 2);
    }

    #[test]
    fn opens_with_the_largest_ceiling_without_reserving_it() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);

        let mut pager = Pager::open(&path, u32::MAX).unwrap();
        assert_eq!(pager.max_pages, u32::MAX);
        let page_num = pager.allocate_page().unwrap();
        pager.get_page_mut(page_num).unwrap()[0] = 1;
        pager.close().unwrap();

        let mut pager = Pager::open(&path, u32::MAX).unwrap();
        assert_eq!(pager.num_pages(), 1);
        assert_eq!(pager.get_page(0).unwrap()[0], 1);
    }

    #[test]
    fn new_pages_read_as_zeroes() {
        let dir = TempDir::new().unwrap();
        let mut pager = Pager::open(&db_path(&dir), 2).unwrap();
        let page_num = pager.allocate_page().unwrap();

        assert!(pager.get_page(page_num).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn refuses_unallocated_pages() {
        let dir = TempDir::new().unwrap();
        let mut pager = Pager::open(&db_path(&dir), 2).unwrap();

        assert!(matches!(
            pager.get_page(0),
            Err(DbError::PageOutOfBounds { page: 0, max: 0 })
        ));
    }

    #[test]
    fn persists_pages_across_close() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);

        let mut pager = Pager::open(&path, 4).unwrap();
        let first = pager.allocate_page().unwrap();
        let second = pager.allocate_page().unwrap();
        pager.get_page_mut(first).unwrap()[0] = 0xAB;
        pager.get_page_mut(second).unwrap()[PAGE_SIZE - 1] = 0xCD;
        pager.close().unwrap();

        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            2 * PAGE_SIZE as u64
        );

        let mut pager = Pager::open(&path, 4).unwrap();
        assert_eq!(pager.num_pages(), 2);
        assert_eq!(pager.get_page(first).unwrap()[0], 0xAB);
        assert_eq!(pager.get_page(second).unwrap()[PAGE_SIZE - 1], 0xCD);
    }

    #[test]
    fn writes_allocated_pages_that_were_never_touched() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);

        let mut pager = Pager::open(&path, 4).unwrap();
        pager.allocate_page().unwrap();
        pager.allocate_page().unwrap();
        pager.close().unwrap();

        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            2 * PAGE_SIZE as u64
        );
    }
}
