use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for a downloader run.
///
/// The variants map onto the three reaction policies: `BadAlbumUrl` skips one
/// input line, `Api` stops the remaining albums without raising, everything
/// else terminates the process with an exit code from [`Error::exit_code`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid album link: {0}")]
    BadAlbumUrl(String),

    #[error("cannot read {}: {source}", .path.display())]
    InputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
        /// The fix-it line printed under the error, specific to which of the
        /// two input files failed to open.
        guidance: &'static str,
    },

    #[error("unable to read user credentials")]
    ShortCredentials,

    #[error("could not authenticate to vk.com")]
    Auth { detail: String },

    #[error("[{code}] {message}")]
    Api { code: i64, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            // mirrors the OS errno when the input file could not be opened
            Error::InputFile { source, .. } => source.raw_os_error().unwrap_or(1),
            _ => 1,
        }
    }
}
