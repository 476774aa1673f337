//! # VibesCard Studio
//!
//! Editor session, export/publish pipeline and persistence API client.
//!
//! ```text
//! ┌───────────────┐  mutations   ┌──────────────┐  settle/embed  ┌─────────────┐
//! │ EditorSession │ ───────────▶ │ ExportPipeline│ ────────────▶ │ PNG / JSON  │
//! └───────┬───────┘              └──────┬───────┘                └─────────────┘
//!         │ render                      │ create / update / tab map
//!         ▼                             ▼
//!   CanvasSynchronizer            HttpDesignApi
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod session;

pub use api::{
    parse_hash_tags, ApiResponse, CommunityDesign, CreatedDesign, DesignApi, DesignPayload,
    HttpDesignApi, TabMapPayload,
};
pub use config::{CliArgs, Command, DesignInputs, StudioConfig};
pub use error::{StudioError, StudioResult};
pub use fetch::HttpImageLoader;
pub use pipeline::{ExportPipeline, PublishOutcome, PublishRequest};
pub use session::EditorSession;

/// Studio version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
