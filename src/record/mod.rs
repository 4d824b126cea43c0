mod error;
mod page;

pub use error::{RecordError, RecordResult};
pub use page::{Page, PageStats};

/// Slot identifier within a page
pub type SlotId = usize;
