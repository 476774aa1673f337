//! Export raster checks.

use crate::error::{RenderError, RenderResult};
use crate::image::png_data_uri;

/// Pixel ratio used for export rasters.
pub const EXPORT_PIXEL_RATIO: f32 = 2.0;

/// Pixel ratio of the single retry after a failed export raster.
pub const FALLBACK_PIXEL_RATIO: f32 = 1.0;

/// Data URIs shorter than this are rejected.
pub const MIN_RASTER_URI_LEN: usize = 100;

/// Data URIs shorter than this are accepted with a warning.
pub const SUSPICIOUS_RASTER_URI_LEN: usize = 1000;

/// A PNG raster of the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    png: Vec<u8>,
    data_uri: String,
}

impl Raster {
    /// Wrap PNG bytes and check that they look like real content.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyRaster`] or [`RenderError::RasterTooSmall`]
    /// when the encoded raster is unusable.
    pub fn from_png(png: Vec<u8>) -> RenderResult<Self> {
        let data_uri = png_data_uri(&png);
        validate_data_uri(&data_uri)?;
        Ok(Self { png, data_uri })
    }

    /// Encoded PNG bytes.
    #[must_use]
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// The raster as a `data:image/png;base64,` URI.
    #[must_use]
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// Consume into PNG bytes.
    #[must_use]
    pub fn into_png(self) -> Vec<u8> {
        self.png
    }
}

/// Reject empty or implausibly small raster data URIs.
///
/// # Errors
///
/// Returns [`RenderError::EmptyRaster`] for `data:,` or an empty payload and
/// [`RenderError::RasterTooSmall`] below [`MIN_RASTER_URI_LEN`].
pub fn validate_data_uri(uri: &str) -> RenderResult<()> {
    let payload = uri.split_once(',').map_or("", |(_, data)| data);
    if uri == "data:," || payload.is_empty() {
        return Err(RenderError::EmptyRaster);
    }
    if uri.len() < MIN_RASTER_URI_LEN {
        return Err(RenderError::RasterTooSmall(uri.len()));
    }
    if uri.len() < SUSPICIOUS_RASTER_URI_LEN {
        tracing::warn!(
            "Generated image is very small ({} bytes), export may be blank",
            uri.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_uris_rejected() {
        assert!(matches!(
            validate_data_uri("data:,"),
            Err(RenderError::EmptyRaster)
        ));
        assert!(matches!(
            validate_data_uri("data:image/png;base64,"),
            Err(RenderError::EmptyRaster)
        ));
    }

    #[test]
    fn test_short_uri_rejected_with_length() {
        let uri = "data:image/png;base64,AAAA";
        match validate_data_uri(uri) {
            Err(RenderError::RasterTooSmall(len)) => assert_eq!(len, uri.len()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_small_but_valid_uri_accepted() {
        let uri = format!("data:image/png;base64,{}", "A".repeat(200));
        assert!(validate_data_uri(&uri).is_ok());
    }

    #[test]
    fn test_raster_from_png_bytes() {
        let raster = Raster::from_png(vec![7u8; 512]).expect("raster");
        assert!(raster.data_uri().starts_with("data:image/png;base64,"));
        assert_eq!(raster.png().len(), 512);
        assert!(Raster::from_png(Vec::new()).is_err());
    }
}
