use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type alias for operations that may fail with [`TriangleError`].
pub type TriangleResult<T> = std::result::Result<T, TriangleError>;

/// Error types that can occur while resolving or running the `triangle` binary.
///
/// This enum covers binary resolution, subprocess execution, option validation
/// and the I/O around the temporary input and output files.
#[derive(Debug, Error)]
pub enum TriangleError {
    /// Neither a bundled nor a globally installed binary could be found.
    #[error("no usable triangle binary found (bundled: {}, global lookup: {lookup})", display_bundled(.bundled))]
    BinaryNotFound {
        bundled: Option<PathBuf>,
        lookup: String,
    },
    /// The subprocess could not be started at all.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The subprocess ran but exited unsuccessfully.
    #[error("`{program}` exited with {status}: {stderr}")]
    Subprocess {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    /// The binary finished without producing any SVG data.
    #[error("`{program}` produced no output")]
    EmptyOutput { program: String },
    /// The image handed to the plugin cannot be triangulated.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
    /// A plugin option is unknown or carries a value of the wrong kind.
    #[error("invalid plugin option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// Image loading or format detection error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
}

fn display_bundled(bundled: &Option<PathBuf>) -> String {
    match bundled {
        Some(path) => format!("{} is missing", path.display()),
        None => "unsupported platform".to_string(),
    }
}
