use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced by the incremental reader
///
/// Every variant is scoped to a single open or poll: callers keep polling
/// and the file may come back (e.g. log rotation).
#[derive(Error, Debug)]
pub enum TailError {
    #[error("log file {} is unavailable", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TailError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Unavailable { path, .. } | Self::Read { path, .. } => path,
        }
    }
}
