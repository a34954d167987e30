use thiserror::Error;

/// Describes the potential error conditions that might arise from mingit
/// operations.
///
/// Variants are grouped by how the command-line driver reports them:
/// bad invocations and plain I/O failures exit with code 1, while protocol
/// violations and corrupt data exit with code 128, matching git's own
/// convention.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("pack error: {0}")]
    Pack(String),

    #[error("object error: {0}")]
    Object(String),
}

impl Error {
    /// The process exit code the command-line driver should report
    /// for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) | Error::Io(_) | Error::Http(_) => 1,
            Error::Protocol(_) | Error::Pack(_) | Error::Object(_) => 128,
        }
    }
}

/// A specialized [`Result`] type for mingit operations.
///
/// [`Result`]: https://doc.rust-lang.org/std/result/enum.Result.html
pub type Result<T> = std::result::Result<T, Error>;
