use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::error::{PagerError, PagerResult};
use super::{PageNum, PAGE_SIZE, TABLE_MAX_PAGES};

/// A single cached page buffer
pub type PageBuffer = [u8; PAGE_SIZE];

/// Owns the backing file and mediates all page access.
///
/// Pages are loaded lazily on first access and cached in a fixed array of
/// [`TABLE_MAX_PAGES`] slots indexed by page number. A cached buffer stays
/// at a stable address until [`Pager::close`]; callers mutate the returned
/// bytes in place and the pager writes them back at close.
pub struct Pager {
    file: File,
    file_length: u64,
    num_pages: PageNum,
    pages: [Option<Box<PageBuffer>>; TABLE_MAX_PAGES],
}

impl Pager {
    /// Open or create the backing file.
    ///
    /// The file length must be a whole number of pages; anything else means
    /// a previous session was cut off mid-write.
    pub fn open<P: AsRef<Path>>(path: P) -> PagerResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let file_length = file.metadata()?.len();
        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(PagerError::CorruptFile);
        }

        Ok(Self {
            file,
            file_length,
            num_pages: (file_length / PAGE_SIZE as u64) as PageNum,
            pages: std::array::from_fn(|_| None),
        })
    }

    /// Highest page number ever allocated, plus one.
    pub fn num_pages(&self) -> PageNum {
        self.num_pages
    }

    /// Get the cached buffer for a page, loading it from the file on a miss.
    ///
    /// A page past the current file extent comes back zero-filled; the file
    /// itself grows only when the page is flushed.
    pub fn get_page(&mut self, page_num: PageNum) -> PagerResult<&mut PageBuffer> {
        self.ensure_loaded(page_num)?;
        Ok(self.pages[page_num as usize]
            .as_deref_mut()
            .expect("page was just loaded"))
    }

    /// Get two distinct cached pages mutably at once.
    ///
    /// Splits need to write the old and the new leaf in the same pass;
    /// index-based access into the cache array keeps the borrows disjoint.
    pub fn get_page_pair(
        &mut self,
        a: PageNum,
        b: PageNum,
    ) -> PagerResult<(&mut PageBuffer, &mut PageBuffer)> {
        assert_ne!(a, b, "get_page_pair requires two distinct pages");
        self.ensure_loaded(a)?;
        self.ensure_loaded(b)?;

        let (lo, hi) = (a.min(b) as usize, a.max(b) as usize);
        let (head, tail) = self.pages.split_at_mut(hi);
        let lo_page = head[lo].as_deref_mut().expect("page was just loaded");
        let hi_page = tail[0].as_deref_mut().expect("page was just loaded");

        if a < b {
            Ok((lo_page, hi_page))
        } else {
            Ok((hi_page, lo_page))
        }
    }

    fn ensure_loaded(&mut self, page_num: PageNum) -> PagerResult<()> {
        if page_num as usize >= TABLE_MAX_PAGES {
            return Err(PagerError::PageOutOfBounds(
                page_num,
                TABLE_MAX_PAGES as u32,
            ));
        }

        if self.pages[page_num as usize].is_none() {
            let mut page = Box::new([0u8; PAGE_SIZE]);

            // A partial page at the end of the file still counts as on disk.
            let pages_on_disk = self.file_length.div_ceil(PAGE_SIZE as u64);
            if (page_num as u64) < pages_on_disk {
                self.file
                    .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
                read_up_to_page(&mut self.file, page.as_mut())?;
            }

            self.pages[page_num as usize] = Some(page);
            if page_num >= self.num_pages {
                self.num_pages = page_num + 1;
            }
        }

        Ok(())
    }

    /// Write the first `size` bytes of a cached page to its file offset.
    pub fn flush(&mut self, page_num: PageNum, size: usize) -> PagerResult<()> {
        let page = self
            .pages
            .get(page_num as usize)
            .and_then(|slot| slot.as_deref())
            .ok_or(PagerError::NullFlush(page_num))?;

        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        let written = self.file.write(&page[..size])?;
        if written != size {
            return Err(PagerError::ShortWrite {
                written,
                expected: size,
            });
        }

        Ok(())
    }

    /// Flush every cached page as a full page, drop the buffers and sync.
    ///
    /// Safe to call more than once; a second call finds nothing cached.
    pub fn close(&mut self) -> PagerResult<()> {
        for page_num in 0..self.num_pages {
            if self.pages[page_num as usize].is_some() {
                self.flush(page_num, PAGE_SIZE)?;
                self.pages[page_num as usize] = None;
            }
        }
        self.file.sync_all()?;
        Ok(())
    }
}

/// Read up to one page, tolerating a short read at the end of the file.
/// Whatever is not read stays zeroed.
fn read_up_to_page(file: &mut File, buf: &mut [u8]) -> PagerResult<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
