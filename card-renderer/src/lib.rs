//! # VibesCard Renderer
//!
//! Keeps a retained-mode stage in step with the element store and turns it
//! into export rasters.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   scaled nodes   ┌───────────────────┐
//! │ ElementStore │ ───────────────▶ │ CanvasSynchronizer│
//! └──────────────┘ ◀─────────────── └─────────┬─────────┘
//!        drag / transform patches             │
//!                                   ┌─────────▼─────────┐
//!      ImageResolver ─────────────▶ │   RenderBackend   │
//!      (candidates, timeout)        │   (SvgStage)      │
//!                                   └─────────┬─────────┘
//!                                             │ SVG → resvg
//!                                             ▼
//!                                        PNG Raster
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod error;
pub mod image;
pub mod node;
pub mod raster;
pub mod sync;

pub use backend::svg::{StageDocument, SvgStage};
pub use backend::{Layer, RenderBackend, SceneSerializer};
pub use error::{RenderError, RenderResult};
pub use image::{
    candidate_paths, CrossOrigin, ImageLoader, ImageRequest, ImageResolver, ImageState,
    LoadedImage,
};
pub use node::{DrawKind, DrawNode, NodeGeometry, Paint, PlaceholderKind, Stroke};
pub use raster::Raster;
pub use sync::{CanvasSynchronizer, SceneSource};

/// Renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
