//! GitHub release wire model for bottle lookups.
//!
//! Bottles live as assets on a single release tagged `bottles`. Two endpoints
//! under the project's API root are used:
//!
//! ```text
//! GET {endpoint}releases/tags/bottles     -> Release { assets: [{ name, id }] }
//! GET {endpoint}releases/assets/{id}      -> raw bytes, or 3xx + Location
//! ```
//!
//! # Examples
//!
//! ```
//! use github_bottles::ReleaseEndpoint;
//!
//! let endpoint = ReleaseEndpoint::new("https://api.github.com/repos/acme/tools");
//! assert_eq!(endpoint.as_str(), "https://api.github.com/repos/acme/tools/");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Tag of the release that carries every bottle.
pub const BOTTLES_TAG: &str = "bottles";

/// Base URL of a project's GitHub API root, always ending in exactly one `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEndpoint(String);

impl ReleaseEndpoint {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        let trimmed = base.trim_end_matches('/');
        Self(format!("{}/", trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of the release listing that is scanned for bottles.
    pub fn release_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}releases/tags/{}", self.0, BOTTLES_TAG))
    }

    /// URL of a single release asset.
    pub fn asset_url(&self, id: &AssetId) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}releases/assets/{}", self.0, id))
    }
}

impl fmt::Display for ReleaseEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque asset identifier. GitHub hands out integers, mirrors sometimes strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetId {
    Number(u64),
    Text(String),
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Number(id) => write!(f, "{}", id),
            AssetId::Text(id) => f.write_str(id),
        }
    }
}

/// A single downloadable file attached to a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub id: AssetId,
}

/// Release description returned by `releases/tags/{tag}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// First asset whose name is exactly `name`.
    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}
