//! Image resolution and embedding.
//!
//! Image elements are loaded through an [`ImageLoader`] against an ordered
//! list of candidate paths, each attempt bounded by a timeout. Sources that
//! are already data URIs are decoded in place. For export, external sources
//! are re-encoded as PNG data URIs so the raster never depends on a remote
//! fetch.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use card_core::{DesignElement, ElementKind};
use futures::future::join_all;

use crate::error::{RenderError, RenderResult};

/// Per-attempt image load timeout.
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF.
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }
        Self::Unknown
    }

    /// MIME type for data URIs.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png | Self::Unknown => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

/// Cross-origin policy requested for a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrossOrigin {
    /// Fetch without credentials so the pixels stay exportable.
    #[default]
    Anonymous,
}

/// One load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Candidate path or URL.
    pub path: String,
    /// Cross-origin policy.
    pub cross_origin: CrossOrigin,
}

/// Fetches raw image bytes.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Fetch the bytes at `request.path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be fetched.
    async fn load(&self, request: &ImageRequest) -> RenderResult<Vec<u8>>;
}

/// A decoded image ready for drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Candidate path that succeeded.
    pub path: String,
    /// Encoded bytes as fetched.
    pub bytes: Vec<u8>,
    /// Detected format.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl LoadedImage {
    /// Decode `bytes` far enough to validate them and read dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a supported image.
    pub fn decode(path: impl Into<String>, bytes: Vec<u8>) -> RenderResult<Self> {
        let img = image::load_from_memory(&bytes)?;
        Ok(Self {
            path: path.into(),
            format: ImageFormat::from_magic_bytes(&bytes),
            width: img.width(),
            height: img.height(),
            bytes,
        })
    }

    /// The image as a data URI in its original encoding.
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Load status of one image source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    /// Load in progress.
    Pending,
    /// Decoded and drawable.
    Loaded(Arc<LoadedImage>),
    /// Every candidate failed.
    Failed(String),
}

impl ImageState {
    /// Whether the load has finished, successfully or not.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Whether `src` is an inline data URI.
#[must_use]
pub fn is_data_uri(src: &str) -> bool {
    src.starts_with("data:")
}

/// Ordered list of paths to try for `src`.
///
/// Sources under `/src/` are also tried with that prefix collapsed to `/`
/// and without their leading slash.
#[must_use]
pub fn candidate_paths(src: &str) -> Vec<String> {
    if src.starts_with("/src/") {
        vec![
            src.to_string(),
            src.replacen("/src/", "/", 1),
            src[1..].to_string(),
        ]
    } else {
        vec![src.to_string()]
    }
}

/// Split a data URI into its MIME type and decoded payload.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...`
///
/// # Errors
///
/// Returns an error if the data URI is malformed.
pub fn parse_data_uri(uri: &str) -> RenderResult<(String, Vec<u8>)> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let comma_pos = uri_data
        .find(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    let metadata = &uri_data[..comma_pos];
    let encoded_data = &uri_data[comma_pos + 1..];
    let mime = metadata.split(';').next().unwrap_or_default().to_string();

    let bytes = if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data)
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(encoded_data)?
    };

    Ok((mime, bytes))
}

/// Percent-decoding for non-base64 data URIs.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(hex);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }
    Ok(result)
}

/// Base64 PNG data URI for already-encoded PNG bytes.
#[must_use]
pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// Decode any supported image and re-encode it as a PNG data URI.
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded or encoded.
pub fn reencode_as_png_data_uri(bytes: &[u8]) -> RenderResult<String> {
    let img = image::load_from_memory(bytes)?;
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(png_data_uri(&buf.into_inner()))
}

/// Loads image sources through candidate paths with a per-attempt timeout.
#[derive(Clone)]
pub struct ImageResolver {
    loader: Arc<dyn ImageLoader>,
    timeout: Duration,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ImageResolver {
    /// Resolver with the default 10 second attempt timeout.
    #[must_use]
    pub fn new(loader: Arc<dyn ImageLoader>) -> Self {
        Self::with_timeout(loader, DEFAULT_IMAGE_TIMEOUT)
    }

    /// Resolver with a custom attempt timeout.
    #[must_use]
    pub fn with_timeout(loader: Arc<dyn ImageLoader>, timeout: Duration) -> Self {
        Self { loader, timeout }
    }

    /// Per-attempt timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, path: &str) -> RenderResult<LoadedImage> {
        let request = ImageRequest {
            path: path.to_string(),
            cross_origin: CrossOrigin::Anonymous,
        };
        let bytes = tokio::time::timeout(self.timeout, self.loader.load(&request))
            .await
            .map_err(|_| RenderError::Timeout(path.to_string()))??;
        LoadedImage::decode(path, bytes)
    }

    /// Fetch and decode `src`, trying each candidate path in order.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ImageUnavailable`] if every candidate fails.
    pub async fn fetch(&self, src: &str) -> RenderResult<LoadedImage> {
        if is_data_uri(src) {
            let (_, bytes) = parse_data_uri(src)?;
            return LoadedImage::decode("data:", bytes);
        }

        for path in candidate_paths(src) {
            match self.attempt(&path).await {
                Ok(image) => {
                    tracing::debug!("Image loaded from {}", path);
                    return Ok(image);
                }
                Err(e) => tracing::warn!("Image attempt failed for {}: {}, trying next", path, e),
            }
        }
        Err(RenderError::ImageUnavailable(src.to_string()))
    }

    /// Resolve `src` to its settled state. Never fails.
    pub async fn resolve(&self, src: &str) -> ImageState {
        match self.fetch(src).await {
            Ok(image) => ImageState::Loaded(Arc::new(image)),
            Err(e) => ImageState::Failed(e.to_string()),
        }
    }

    /// Resolve several sources concurrently.
    pub async fn resolve_all<I>(&self, sources: I) -> Vec<(String, ImageState)>
    where
        I: IntoIterator<Item = String>,
    {
        join_all(sources.into_iter().map(|src| async move {
            let state = self.resolve(&src).await;
            (src, state)
        }))
        .await
    }

    /// Fetch `src` and return it as a PNG data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be fetched or re-encoded.
    pub async fn embed(&self, src: &str) -> RenderResult<String> {
        let image = self.fetch(src).await?;
        reencode_as_png_data_uri(&image.bytes)
    }

    /// Copy `elements`, replacing every external image source with an
    /// embedded PNG data URI.
    ///
    /// Sources that are already data URIs are skipped; sources that fail to
    /// embed keep their original value.
    pub async fn preload_for_export(&self, elements: &[DesignElement]) -> Vec<DesignElement> {
        let external: Vec<(String, String)> = elements
            .iter()
            .filter_map(|el| {
                el.kind
                    .image_src()
                    .filter(|src| !src.is_empty() && !is_data_uri(src))
                    .map(|src| (el.id.as_str().to_string(), src.to_string()))
            })
            .collect();

        tracing::info!("Preloading {} images for export", external.len());

        let embedded: HashMap<String, String> = join_all(external.into_iter().map(
            |(id, src)| async move {
                match self.embed(&src).await {
                    Ok(uri) => Some((id, uri)),
                    Err(e) => {
                        tracing::warn!("Failed to embed image {}: {}", src, e);
                        None
                    }
                }
            },
        ))
        .await
        .into_iter()
        .flatten()
        .collect();

        tracing::info!("Preloading complete, embedded {} images", embedded.len());

        elements
            .iter()
            .cloned()
            .map(|mut el| {
                if let Some(uri) = embedded.get(el.id.as_str()) {
                    if let ElementKind::Image { content, .. } = &mut el.kind {
                        content.src.clone_from(uri);
                    }
                }
                el
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_paths_for_src_prefix() {
        assert_eq!(
            candidate_paths("/src/assets/a.png"),
            vec!["/src/assets/a.png", "/assets/a.png", "src/assets/a.png"]
        );
        assert_eq!(
            candidate_paths("https://x.test/a.png"),
            vec!["https://x.test/a.png"]
        );
    }

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            ImageFormat::Jpeg
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(ImageFormat::from_magic_bytes(&[0, 1]), ImageFormat::Unknown);
    }

    #[test]
    fn test_parse_data_uri_variants() {
        let (mime, bytes) = parse_data_uri("data:text/plain;base64,aGk=").expect("base64");
        assert_eq!(mime, "text/plain");
        assert_eq!(bytes, b"hi");

        let (_, bytes) = parse_data_uri("data:,a%20b").expect("percent");
        assert_eq!(bytes, b"a b");

        assert!(parse_data_uri("data:,bad%2").is_err());
        assert!(parse_data_uri("https://x").is_err());
        assert!(parse_data_uri("data:nocomma").is_err());
    }

    #[test]
    fn test_reencode_produces_png() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut jpeg = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut jpeg, image::ImageFormat::Jpeg)
            .expect("jpeg");

        let uri = reencode_as_png_data_uri(&jpeg.into_inner()).expect("reencode");
        assert!(uri.starts_with("data:image/png;base64,"));
        let (_, png) = parse_data_uri(&uri).expect("parse");
        assert_eq!(ImageFormat::from_magic_bytes(&png), ImageFormat::Png);

        assert!(reencode_as_png_data_uri(b"not an image").is_err());
    }
}
