use thiserror::Error;

use crate::storage::PagerError;

/// Errors that can occur during B+ tree operations
#[derive(Debug, Error)]
pub enum BTreeError {
    #[error("Pager error: {0}")]
    Pager(#[from] PagerError),

    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(u8),

    #[error("Splitting a non-root leaf is not supported")]
    NonRootSplit,
}

pub type BTreeResult<T> = Result<T, BTreeError>;
