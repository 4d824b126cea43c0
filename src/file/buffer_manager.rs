use std::collections::{HashMap, VecDeque};
use std::path::Path;

use lru::LruCache;

use super::disk_manager::DiskManager;
use super::error::{FileError, FileResult};
use super::{FrameId, PageId, INVALID_PAGE_ID, PAGE_SIZE};
use crate::record::Page;

/// One slot of the pool: a page plus its residency bookkeeping
struct Frame {
    /// Page held by this frame, INVALID_PAGE_ID when the frame is free
    page_id: PageId,
    page: Page,
    /// Outstanding borrows; a pinned frame is never evicted or deleted
    pin_count: u32,
    /// Whether the page has been modified since its last write-back
    is_dirty: bool,
}

impl Frame {
    fn new() -> Self {
        Self {
            page_id: INVALID_PAGE_ID,
            page: Page::new(),
            pin_count: 0,
            is_dirty: false,
        }
    }

    fn clear(&mut self) {
        self.page_id = INVALID_PAGE_ID;
        self.pin_count = 0;
        self.is_dirty = false;
    }
}

/// Fixed-size pool of frames caching pages of a single database file
///
/// Callers borrow pages through [`new_page`](Self::new_page) and
/// [`fetch_page`](Self::fetch_page); every successful call takes a pin that
/// must be released with [`unpin_page`](Self::unpin_page). When no frame is
/// free the least recently used unpinned page is written back (if dirty)
/// and its frame reused. A page is resident in at most one frame.
///
/// The pool is single-threaded: no internal synchronisation, all disk I/O
/// blocks the caller.
pub struct BufferPoolManager {
    /// Fixed backing storage, allocated once at construction
    frames: Vec<Frame>,
    /// Resident pages only; at most one frame per page id
    page_table: HashMap<PageId, FrameId>,
    /// Frames available for reuse, handed out FIFO
    free_frames: VecDeque<FrameId>,
    /// Resident frames in access order; unbounded, the pool itself decides
    /// what to evict because pinned frames must be skipped
    lru: LruCache<FrameId, ()>,
    disk: DiskManager,
    /// Next page id to hand out, derived from the file length at startup
    /// so reopening a file never re-allocates an id that reached disk
    next_page_id: PageId,
}

impl BufferPoolManager {
    /// Create a pool of `pool_size` frames over the file at `path`,
    /// creating the file if it does not exist
    pub fn new<P: AsRef<Path>>(pool_size: usize, path: P) -> FileResult<Self> {
        let disk = DiskManager::open(path)?;
        let next_page_id = disk.page_count()? as PageId;

        let mut frames = Vec::with_capacity(pool_size);
        let mut free_frames = VecDeque::with_capacity(pool_size);
        for frame_id in 0..pool_size {
            frames.push(Frame::new());
            free_frames.push_back(frame_id);
        }

        Ok(Self {
            frames,
            page_table: HashMap::new(),
            free_frames,
            lru: LruCache::unbounded(),
            disk,
            next_page_id,
        })
    }

    /// Allocate a fresh page, pinned in a frame
    ///
    /// The page starts dirty so it reaches disk even if the caller never
    /// writes to it.
    pub fn new_page(&mut self) -> FileResult<(PageId, &mut Page)> {
        let frame_id = self.acquire_frame()?;

        let page_id = self.next_page_id;
        self.next_page_id += 1;

        let frame = &mut self.frames[frame_id];
        frame.page.reset_memory();
        frame.page.set_page_id(page_id);
        frame.page_id = page_id;
        frame.pin_count = 1;
        frame.is_dirty = true;

        self.page_table.insert(page_id, frame_id);
        self.lru.put(frame_id, ());

        Ok((page_id, &mut self.frames[frame_id].page))
    }

    /// Pin a page, reading it from disk when it is not resident
    ///
    /// A fetch of a page the file does not hold yet returns a fresh zeroed
    /// page (recently allocated pages may not have been flushed).
    pub fn fetch_page(&mut self, page_id: PageId) -> FileResult<&mut Page> {
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            let frame = &mut self.frames[frame_id];
            frame.pin_count += 1;
            self.lru.put(frame_id, ());
            return Ok(&mut self.frames[frame_id].page);
        }

        let frame_id = self.acquire_frame()?;

        match self
            .disk
            .read_page(page_id, self.frames[frame_id].page.data_mut())
        {
            // a page the file does not fully hold yet starts fresh
            Ok(bytes_read) if bytes_read < PAGE_SIZE => {
                self.frames[frame_id].page.reset_memory()
            }
            Ok(_) => {}
            Err(err) => {
                // the frame never entered the page table, hand it back
                self.free_frames.push_back(frame_id);
                return Err(err);
            }
        }

        let frame = &mut self.frames[frame_id];
        frame.page.set_page_id(page_id);
        frame.page_id = page_id;
        frame.pin_count = 1;
        frame.is_dirty = false;

        self.page_table.insert(page_id, frame_id);
        self.lru.put(frame_id, ());

        Ok(&mut self.frames[frame_id].page)
    }

    /// Release one pin
    ///
    /// A true `is_dirty` hint marks the page dirty; the bit is monotonic
    /// and a false hint never clears it. The LRU position was taken when
    /// the pin was acquired and is not touched here.
    pub fn unpin_page(&mut self, page_id: PageId, is_dirty: bool) -> FileResult<()> {
        let frame_id = self.resident_frame(page_id)?;
        let frame = &mut self.frames[frame_id];

        if frame.pin_count == 0 {
            return Err(FileError::AlreadyUnpinned(page_id));
        }

        frame.pin_count -= 1;
        if is_dirty {
            frame.is_dirty = true;
        }
        Ok(())
    }

    /// Write a resident page to disk if it is dirty
    ///
    /// A resident but clean page is a successful no-op.
    pub fn flush_page(&mut self, page_id: PageId) -> FileResult<()> {
        let frame_id = self.resident_frame(page_id)?;

        if self.frames[frame_id].is_dirty {
            self.disk
                .write_page(page_id, self.frames[frame_id].page.data())?;
            self.disk.sync()?;
            self.frames[frame_id].is_dirty = false;
        }
        Ok(())
    }

    /// Write back every resident dirty page, then sync the file once
    pub fn flush_all_dirty_pages(&mut self) -> FileResult<()> {
        for frame_id in 0..self.frames.len() {
            let frame = &self.frames[frame_id];
            if frame.page_id != INVALID_PAGE_ID && frame.is_dirty {
                self.disk.write_page(frame.page_id, frame.page.data())?;
                self.frames[frame_id].is_dirty = false;
            }
        }
        self.disk.sync()
    }

    /// Drop an unpinned resident page from the pool
    ///
    /// A dirty page is written back first. The on-disk bytes are left as
    /// they are; a later fetch reloads them.
    pub fn delete_page(&mut self, page_id: PageId) -> FileResult<()> {
        let frame_id = self.resident_frame(page_id)?;

        if self.frames[frame_id].pin_count > 0 {
            return Err(FileError::PagePinned(page_id));
        }
        if self.frames[frame_id].is_dirty {
            self.disk
                .write_page(page_id, self.frames[frame_id].page.data())?;
        }

        self.frames[frame_id].clear();
        self.page_table.remove(&page_id);
        self.lru.pop(&frame_id);
        self.free_frames.push_back(frame_id);
        Ok(())
    }

    /// Number of frames in the pool
    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    /// Number of pages currently resident
    pub fn resident_page_count(&self) -> usize {
        self.page_table.len()
    }

    /// Whether a page is resident
    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.page_table.contains_key(&page_id)
    }

    /// Number of resident pages with unflushed modifications
    pub fn dirty_page_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.page_id != INVALID_PAGE_ID && frame.is_dirty)
            .count()
    }

    /// Pin count of a resident page, None when not resident
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.page_table
            .get(&page_id)
            .map(|&frame_id| self.frames[frame_id].pin_count)
    }

    /// Pop a free frame, evicting the LRU unpinned page when none is free
    fn acquire_frame(&mut self) -> FileResult<FrameId> {
        if self.free_frames.is_empty() {
            self.evict_page()?;
        }
        self.free_frames.pop_front().ok_or(FileError::PoolExhausted)
    }

    /// Write back and release the least recently used unpinned frame
    fn evict_page(&mut self) -> FileResult<()> {
        let victim = self
            .lru
            .iter()
            .rev() // oldest first
            .map(|(&frame_id, _)| frame_id)
            .find(|&frame_id| self.frames[frame_id].pin_count == 0)
            .ok_or(FileError::PoolExhausted)?;

        let frame = &self.frames[victim];
        let page_id = frame.page_id;
        if frame.is_dirty {
            self.disk.write_page(page_id, frame.page.data())?;
        }

        self.lru.pop(&victim);
        self.page_table.remove(&page_id);
        self.frames[victim].clear();
        self.free_frames.push_back(victim);
        Ok(())
    }

    fn resident_frame(&self, page_id: PageId) -> FileResult<FrameId> {
        self.page_table
            .get(&page_id)
            .copied()
            .ok_or(FileError::PageNotResident(page_id))
    }
}

impl Drop for BufferPoolManager {
    fn drop(&mut self) {
        // best-effort write-back on shutdown
        let _ = self.flush_all_dirty_pages();
    }
}
