use std::path::PathBuf;

/// Every fatal error kind the engine can raise. All of them are global and
/// unrecoverable by design (§7): a single rank's failure must terminate the
/// whole job rather than desynchronize the next collective call.
#[derive(Debug, thiserror::Error)]
pub enum StencilError {
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("could not open {path}: {source}")]
    IoOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("short read from {path}: expected {expected} bytes, got {got}")]
    IoRead {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    #[error("short write to {path}: expected {expected} bytes, got {got}")]
    IoWrite {
        path: PathBuf,
        expected: usize,
        got: usize,
    },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    #[error(
        "partition infeasible: rank {rank} owns {local_height} rows but padding is {padding}"
    )]
    PartitionInfeasible {
        rank: usize,
        local_height: usize,
        padding: usize,
    },
}

pub type Result<T> = std::result::Result<T, StencilError>;
