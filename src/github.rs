//! Bottle lookup against a project's GitHub `bottles` release.
//!
//! [`GithubBottles`] walks a one-way state machine:
//!
//! ```text
//! Unchecked -> Found(asset) | NotFound        (bottled, once per instance)
//! Found(asset) -> cache file                  (fetch)
//! cache file -> install dir                   (extract)
//! ```
//!
//! The lookup never fails: transport errors, bad statuses and unparseable
//! bodies are logged and remembered as "no bottle". Fetch and install errors
//! always reach the caller.
//!
//! # Examples
//!
//! ```no_run
//! use github_bottles::{FormulaRef, GithubBottles, ReleaseEndpoint};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let endpoint = ReleaseEndpoint::new("https://api.github.com/repos/acme/tools");
//!     let mut bottles = GithubBottles::new(endpoint, None, "arm64_sonoma")?;
//!     let formula = FormulaRef::new("hello", "2.12");
//!
//!     if bottles.bottled(&formula).await {
//!         bottles
//!             .pour(Path::new("/tmp/cache"), &formula, Path::new("/tmp/hello"))
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

use crate::api::{AssetId, Release, ReleaseEndpoint};
use crate::error::{BottleError, LookupError, Result};
use crate::extract;
use crate::formula::FormulaRef;
use reqwest::header::{self, HeaderValue};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Opaque `Authorization` header value, sent verbatim with every request.
#[derive(Clone)]
pub struct Credential(HeaderValue);

impl Credential {
    pub fn new(value: &str) -> Result<Self> {
        let mut header = HeaderValue::from_str(value)?;
        header.set_sensitive(true);
        Ok(Self(header))
    }

    pub(crate) fn header_value(&self) -> &HeaderValue {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A bottle asset resolved by a successful lookup.
///
/// Only [`GithubBottles::bottled`] can produce one, so a fetch always refers
/// to an asset that was actually listed on the release. Its name is the bottle
/// filename of the formula it was looked up for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottleAsset {
    id: AssetId,
    name: String,
}

impl BottleAsset {
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this asset is the bottle of `formula` on `platform_tag`.
    pub fn is_bottle_for(&self, formula: &FormulaRef, platform_tag: &str) -> bool {
        self.name == formula.bottle_filename(platform_tag)
    }
}

/// Outcome of the one-shot existence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Unchecked,
    Found(BottleAsset),
    NotFound,
}

/// Locates, downloads and pours bottles published on a GitHub release.
///
/// Not meant to be shared between tasks: the lookup result is per instance
/// and mutating it needs `&mut self`.
#[derive(Debug)]
pub struct GithubBottles {
    pub(crate) endpoint: ReleaseEndpoint,
    pub(crate) credential: Option<Credential>,
    pub(crate) platform_tag: String,
    pub(crate) client: reqwest::Client,
    lookup: Lookup,
}

impl GithubBottles {
    pub fn new(
        endpoint: ReleaseEndpoint,
        credential: Option<Credential>,
        platform_tag: impl Into<String>,
    ) -> Result<Self> {
        // Redirects are followed by hand, at most one hop
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(format!("ghbottle/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint,
            credential,
            platform_tag: platform_tag.into(),
            client,
            lookup: Lookup::Unchecked,
        })
    }

    pub fn endpoint(&self) -> &ReleaseEndpoint {
        &self.endpoint
    }

    pub fn platform_tag(&self) -> &str {
        &self.platform_tag
    }

    /// Current lookup state, without triggering a lookup.
    pub fn lookup_state(&self) -> &Lookup {
        &self.lookup
    }

    /// The resolved asset, if the lookup found one.
    pub fn asset(&self) -> Option<&BottleAsset> {
        match &self.lookup {
            Lookup::Found(asset) => Some(asset),
            _ => None,
        }
    }

    /// Whether a bottle for `formula` exists on the release.
    ///
    /// Queries the release at most once per instance. Every later call
    /// returns the remembered answer, even for a different formula.
    pub async fn bottled(&mut self, formula: &FormulaRef) -> bool {
        if self.lookup == Lookup::Unchecked {
            self.lookup = match self.find_asset(formula).await {
                Ok(Some(asset)) => {
                    info!("Found a bottle for {}", asset.name);
                    Lookup::Found(asset)
                }
                Ok(None) => {
                    debug!(
                        "No bottle named {} on the release",
                        formula.bottle_filename(&self.platform_tag)
                    );
                    Lookup::NotFound
                }
                Err(e) => {
                    warn!("Something went wrong trying to find the bottle from GitHub - {}", e);
                    Lookup::NotFound
                }
            };
        }

        matches!(self.lookup, Lookup::Found(_))
    }

    async fn find_asset(
        &self,
        formula: &FormulaRef,
    ) -> std::result::Result<Option<BottleAsset>, LookupError> {
        let url = self.endpoint.release_url()?;
        let response = self.request(url.clone()).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(LookupError::Status {
                status,
                url: url.to_string(),
            });
        }

        let release: Release = response.json().await?;
        let filename = formula.bottle_filename(&self.platform_tag);

        Ok(release.find_asset(&filename).map(|asset| BottleAsset {
            id: asset.id.clone(),
            name: asset.name.clone(),
        }))
    }

    /// GET with the credential attached, when there is one.
    pub(crate) fn request(&self, url: reqwest::Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.credential {
            Some(credential) => {
                request.header(header::AUTHORIZATION, credential.header_value().clone())
            }
            None => request,
        }
    }

    /// Look up, download and extract the bottle for `formula` into `install_dir`.
    ///
    /// The lookup is remembered per instance, so an instance that already
    /// found another formula's bottle reports `NotBottled` for this one.
    /// Extraction runs on the blocking thread pool. Returns the path of the
    /// cached archive.
    pub async fn pour(
        &mut self,
        cache_root: &Path,
        formula: &FormulaRef,
        install_dir: &Path,
    ) -> Result<PathBuf> {
        if !self.bottled(formula).await {
            return Err(BottleError::NotBottled(formula.name.clone()));
        }
        let asset = match self.asset() {
            Some(asset) if asset.is_bottle_for(formula, &self.platform_tag) => asset.clone(),
            _ => return Err(BottleError::NotBottled(formula.name.clone())),
        };

        let cache_file = self.fetch(cache_root, formula, &asset).await?;

        info!(
            "Pouring {} to {}",
            asset.name(),
            install_dir.display()
        );
        let archive = cache_file.clone();
        let target = install_dir.to_path_buf();
        tokio::task::spawn_blocking(move || extract::extract_bottle(&archive, &target)).await??;

        Ok(cache_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_instance_is_unchecked() {
        let bottles =
            GithubBottles::new(ReleaseEndpoint::new("https://api.github.com"), None, "osx")
                .unwrap();
        assert_eq!(bottles.lookup_state(), &Lookup::Unchecked);
        assert!(bottles.asset().is_none());
        assert_eq!(bottles.endpoint().as_str(), "https://api.github.com/");
        assert_eq!(bottles.platform_tag(), "osx");
    }

    #[test]
    fn test_credential_is_redacted() {
        let credential = Credential::new("token secret").unwrap();
        assert_eq!(format!("{:?}", credential), "Credential(***)");
        assert!(credential.header_value().is_sensitive());
    }

    #[test]
    fn test_asset_belongs_to_one_formula_and_tag() {
        let asset = BottleAsset {
            id: AssetId::Number(1234),
            name: "hello-2.12.osx.bottle.tar.gz".to_string(),
        };

        assert!(asset.is_bottle_for(&FormulaRef::new("hello", "2.12"), "osx"));
        assert!(!asset.is_bottle_for(&FormulaRef::new("hello", "2.13"), "osx"));
        assert!(!asset.is_bottle_for(&FormulaRef::new("wget", "2.12"), "osx"));
        assert!(!asset.is_bottle_for(&FormulaRef::new("hello", "2.12"), "x86_64_linux"));
    }

    #[test]
    fn test_credential_rejects_newlines() {
        assert!(matches!(
            Credential::new("token foo\nX-Injected: 1"),
            Err(BottleError::InvalidCredential(_))
        ));
    }
}
