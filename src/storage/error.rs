use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PagerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File is not a whole number of pages: corrupt database file")]
    CorruptFile,

    #[error("Page number out of bounds: {0} >= {1}")]
    PageOutOfBounds(u32, u32),

    #[error("Tried to flush a page that was never loaded: {0}")]
    NullFlush(u32),

    #[error("Short write: wrote {written} bytes, expected {expected}")]
    ShortWrite { written: usize, expected: usize },
}

pub type PagerResult<T> = Result<T, PagerError>;
