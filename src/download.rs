//! Bottle download into the local cache.
//!
//! GitHub answers asset requests with a redirect to storage. The hop is
//! followed by hand, exactly once:
//!
//! ```text
//! GET releases/assets/{id}   2xx -> payload
//!                            3xx -> GET Location   200 -> payload
//!                                                  else -> FetchError
//!                            else -> FetchError
//! ```

use crate::cache;
use crate::error::{FetchError, FetchFailure};
use crate::formula::FormulaRef;
use crate::github::{BottleAsset, GithubBottles};
use reqwest::header::{self, HeaderValue};
use reqwest::{Response, StatusCode, Url};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const OCTET_STREAM: &str = "application/octet-stream";

impl GithubBottles {
    /// Download `asset` to `{cache_root}/{name}/{bottle filename}`.
    ///
    /// Any previous file at that path is replaced. The write is not atomic;
    /// an interrupted download leaves a truncated file behind. An `asset`
    /// found for another formula is refused before any request is made.
    pub async fn fetch(
        &self,
        cache_root: &Path,
        formula: &FormulaRef,
        asset: &BottleAsset,
    ) -> Result<PathBuf, FetchError> {
        let expected = formula.bottle_filename(&self.platform_tag);
        if asset.name() != expected {
            return Err(FetchError::new(
                &formula.name,
                FetchFailure::AssetMismatch {
                    expected,
                    found: asset.name().to_string(),
                },
            ));
        }

        let asset_url = self
            .endpoint
            .asset_url(asset.id())
            .map_err(|e| FetchError::new(&formula.name, e))?;

        info!("Downloading {}", asset_url);

        let response = self
            .download(asset_url)
            .await
            .map_err(|cause| FetchError::new(&formula.name, cause))?;

        let output_path = cache::bottle_cache_path(cache_root, formula, &self.platform_tag);
        write_payload(response, &output_path)
            .await
            .map_err(|cause| FetchError::new(&formula.name, cause))?;

        Ok(output_path)
    }

    /// Initial request, then at most one redirect hop.
    async fn download(&self, asset_url: Url) -> Result<Response, FetchFailure> {
        let response = self.asset_request(asset_url.clone()).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }
        if !status.is_redirection() {
            return Err(FetchFailure::Status(status));
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(FetchFailure::MissingLocation)?;
        let redirect_url = asset_url.join(location)?;
        debug!("Following redirect to {}", redirect_url);

        let redirected = self.asset_request(redirect_url).send().await?;
        if redirected.status() != StatusCode::OK {
            return Err(FetchFailure::RedirectStatus(redirected.status()));
        }

        Ok(redirected)
    }

    fn asset_request(&self, url: Url) -> reqwest::RequestBuilder {
        self.request(url)
            .header(header::ACCEPT, HeaderValue::from_static(OCTET_STREAM))
    }
}

async fn write_payload(mut response: Response, output_path: &Path) -> Result<(), FetchFailure> {
    let write_error = |source| FetchFailure::Write {
        path: output_path.to_path_buf(),
        source,
    };

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let mut file = fs::File::create(output_path).await.map_err(write_error)?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await.map_err(write_error)?;
    }
    file.flush().await.map_err(write_error)?;

    Ok(())
}
