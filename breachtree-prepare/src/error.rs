use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tree(#[from] breachtree::Error),

    #[error("line {line}: not a 40-character hex digest")]
    InvalidDigest { line: u64 },

    #[error("line {line}: digest out of order; the corpus must be sorted ascending")]
    OutOfOrder { line: u64 },

    #[error("File '{path}' exists. Use --force to overwrite.")]
    FileExists { path: PathBuf },

    #[error("order must be at least 1")]
    InvalidOrder,
}
