//! Library interface for ghbottle
//!
//! Finds bottles published as assets on a GitHub release tagged `bottles`,
//! downloads them into a local cache and pours them into an install directory.

pub mod api;
pub mod cache;
pub mod cellar;
mod download;
pub mod error;
pub mod extract;
pub mod formula;
pub mod github;
pub mod platform;

// Re-export commonly used types
pub use api::{AssetId, Release, ReleaseAsset, ReleaseEndpoint};
pub use error::{BottleError, FetchError, FetchFailure, InstallError, Result};
pub use formula::FormulaRef;
pub use github::{BottleAsset, Credential, GithubBottles, Lookup};
