mod error;
mod pager;

pub use error::{PagerError, PagerResult};
pub use pager::Pager;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages a table may occupy. The page cache is a fixed
/// array of this many slots, indexed directly by page number.
pub const TABLE_MAX_PAGES: usize = 100;

/// Page number type
pub type PageNum = u32;
