use thiserror::Error;

use super::SlotId;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("page is full")]
    PageFull,

    #[error("record of {need} bytes does not fit ({have} bytes free)")]
    RecordTooLarge { need: usize, have: usize },

    #[error("no record at slot {0}")]
    InvalidSlot(SlotId),
}

pub type RecordResult<T> = Result<T, RecordError>;
