#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tree(#[from] breachtree::Error),

    #[error("--hash must be a 40-character hex SHA-1 digest")]
    InvalidHash,

    #[error("exactly one of --hash or --password must be given")]
    InvalidArgs,
}
