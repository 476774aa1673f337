//! # VibesCard Core
//!
//! Editor state for the VibesCard Studio design canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Element Store    │  Template Engine        │
//! │  - Elements       │  - Two-phase apply      │
//! │  - Selection      │  - Color derivation     │
//! │  - Undo/redo      │  - dataField prefill    │
//! ├─────────────────────────────────────────────┤
//! │  Shortcuts        │  Documents              │
//! │  - Undo/redo keys │  - Scene document       │
//! │  - Focus rules    │  - JSON export          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate performs I/O. Rendering, image loading and the
//! persistence API live in `card-renderer` and `card-studio`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod element;
pub mod error;
pub mod event;
pub mod history;
pub mod notify;
pub mod schema;
pub mod shortcut;
pub mod store;
pub mod template;
pub mod zoom;

pub use color::{hex_colors, BackgroundFill, ColorScheme};
pub use element::{
    BackgroundStyle, BorderStyle, DesignElement, ElementId, ElementKind, ElementPatch,
    ElementType, ImageContent, ImageStyle, LogoContent, ShapeContent, ShapeKind, ShapeStyle,
    TextAlign, TextContent, TextStyle, Transform,
};
pub use error::{CardError, CardResult};
pub use event::{DataField, EventDetails};
pub use history::HistoryManager;
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier, Variant};
pub use schema::{DesignDocument, DesignExport, DesignMetadata};
pub use shortcut::{FocusTarget, KeyEvent, Platform, ShortcutAction, ShortcutDispatcher};
pub use store::{CanvasSize, ElementStore};
pub use template::{Template, TemplateApplication, TemplatePhase, TemplateStyle};
pub use zoom::{scale_factor, ZoomPolicy, INITIAL_ZOOM};

/// Card core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
