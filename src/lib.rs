pub mod file;
pub mod record;

pub use file::{
    BufferPoolManager, DiskManager, FileError, FileResult, PageId, DEFAULT_POOL_SIZE,
    INVALID_PAGE_ID, PAGE_SIZE,
};
pub use record::{Page, PageStats, RecordError, RecordResult, SlotId};
