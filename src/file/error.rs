use std::io;
use thiserror::Error;

use super::PageId;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("all frames are pinned, no page could be evicted")]
    PoolExhausted,

    #[error("page {0} is not resident in the buffer pool")]
    PageNotResident(PageId),

    #[error("page {0} is pinned")]
    PagePinned(PageId),

    #[error("page {0} is already unpinned")]
    AlreadyUnpinned(PageId),
}

pub type FileResult<T> = Result<T, FileError>;
