use thiserror::Error;

/// Errors surfaced by the core engine.
///
/// Fatal variants (`Protocol`, `Integrity`, `Config`) are meant to reach the
/// `load` binary's `main` and become a process exit code of 1; the others are
/// per-client and are logged and absorbed by the pool.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("i/o error: {0}")]
    Io(#[source] std::io::Error),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("data mismatch for key {keyid}: {detail}")]
    Integrity { keyid: u64, detail: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error should be treated as fatal to the whole benchmark
    /// run, rather than just the client that hit it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Protocol(_) | Error::Integrity { .. } | Error::Config(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
