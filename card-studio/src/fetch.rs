//! Image loading over HTTP and from the local asset directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use card_renderer::{ImageLoader, ImageRequest, RenderError, RenderResult};
use reqwest::Client;

/// Loads `http(s)` URLs with reqwest and everything else from `asset_root`.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    http: Client,
    asset_root: PathBuf,
}

impl HttpImageLoader {
    /// Create a loader rooted at `asset_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(asset_root: impl Into<PathBuf>) -> RenderResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("vibescard-studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RenderError::Resource(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            asset_root: asset_root.into(),
        })
    }

    /// Local file a non-URL path maps to, refusing to leave the asset root.
    #[must_use]
    pub fn local_path(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        (!escapes).then(|| self.asset_root.join(relative))
    }

    async fn fetch_remote(&self, url: &str) -> RenderResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Resource(format!("{url}: HTTP {status}")));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, request: &ImageRequest) -> RenderResult<Vec<u8>> {
        if is_remote(&request.path) {
            return self.fetch_remote(&request.path).await;
        }

        let file = self.local_path(&request.path).ok_or_else(|| {
            RenderError::Resource(format!("{} is outside the asset root", request.path))
        })?;
        tokio::fs::read(&file)
            .await
            .map_err(|e| RenderError::Resource(format!("{}: {e}", file.display())))
    }
}
