use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BottleError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Authorization is not a valid header value: {0}")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),

    #[error("No bottle available for {0}")]
    NotBottled(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("Extraction task did not finish: {0}")]
    Extract(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, BottleError>;

/// A bottle asset could not be downloaded into the cache.
#[derive(Error, Debug)]
#[error("Failed to download bottle for \"{formula}\": {cause}")]
pub struct FetchError {
    pub formula: String,
    #[source]
    pub cause: FetchFailure,
}

impl FetchError {
    pub(crate) fn new(formula: &str, cause: impl Into<FetchFailure>) -> Self {
        Self {
            formula: formula.to_string(),
            cause: cause.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(StatusCode),

    #[error("redirect target responded with {0}")]
    RedirectStatus(StatusCode),

    #[error("asset {found} is not the bottle {expected}")]
    AssetMismatch { expected: String, found: String },

    #[error("redirect response has no usable Location header")]
    MissingLocation,

    #[error("invalid asset URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A downloaded bottle could not be extracted into the install directory.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Bottle archive not found: {}", .0.display())]
    MissingArchive(PathBuf),

    #[error("Failed to create install directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open bottle {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read bottle {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported {kind} entry in bottle: {}", entry.display())]
    UnsupportedEntry { entry: PathBuf, kind: String },

    #[error("Refusing to extract entry outside the install directory: {}", .0.display())]
    UnsafePath(PathBuf),

    #[error("Refusing symlink {} pointing outside the install directory: {}", entry.display(), target.display())]
    UnsafeLink { entry: PathBuf, target: PathBuf },

    #[error("Failed to extract {}: {source}", entry.display())]
    Unpack {
        entry: PathBuf,
        source: std::io::Error,
    },
}

/// Reasons a lookup came back empty. Never leaves the crate.
#[derive(Error, Debug)]
pub(crate) enum LookupError {
    #[error("invalid release URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("got {status} from {url}")]
    Status { status: StatusCode, url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_formula_and_cause() {
        let err = FetchError::new("test-bottle", FetchFailure::Status(StatusCode::NOT_FOUND));
        let message = err.to_string();
        assert!(message.contains("\"test-bottle\""));
        assert!(message.contains("404"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_bottle_error_is_transparent_over_fetch() {
        let err: BottleError =
            FetchError::new("wget", FetchFailure::MissingLocation).into();
        assert!(matches!(err, BottleError::Fetch(_)));
        assert!(err.to_string().starts_with("Failed to download bottle for \"wget\""));
    }
}
