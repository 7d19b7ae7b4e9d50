use crate::node::NodePointer;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid tree header: {reason}")]
    InvalidHeader { reason: &'static str },

    #[error("corrupt tree at node {node}: {reason}")]
    Corrupt {
        node: NodePointer,
        reason: &'static str,
    },
}
