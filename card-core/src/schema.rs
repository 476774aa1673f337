//! Serialized design documents.
//!
//! [`DesignDocument`] is the scene document assembled from the store when
//! the renderer cannot serialize itself. [`DesignExport`] is the versioned
//! JSON file users can download.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::color::ColorScheme;
use crate::element::DesignElement;
use crate::error::CardResult;
use crate::event::EventDetails;
use crate::store::{CanvasSize, ElementStore};

/// Format version written into [`DesignExport`].
pub const EXPORT_VERSION: &str = "1.0";

/// Name used when the event has no title.
pub const UNTITLED_DESIGN: &str = "Untitled Design";

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Event details plus the originating template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignMetadata {
    /// Event details, inlined.
    #[serde(flatten)]
    pub details: EventDetails,
    /// Template id, if the design started from one.
    pub template: Option<String>,
}

/// Scene document assembled from editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDocument {
    /// `design_<unix millis>`.
    pub id: String,
    /// Event title or [`UNTITLED_DESIGN`].
    pub name: String,
    /// Element collection.
    pub elements: Vec<DesignElement>,
    /// Active colors.
    pub color_scheme: ColorScheme,
    /// Canvas dimensions.
    pub canvas_size: CanvasSize,
    /// Event details and template.
    pub metadata: DesignMetadata,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl DesignDocument {
    /// Assemble a document stamped with `at`.
    #[must_use]
    pub fn assemble_at(
        elements: Vec<DesignElement>,
        color_scheme: ColorScheme,
        canvas_size: CanvasSize,
        details: &EventDetails,
        template: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let name = if details.title.is_empty() {
            UNTITLED_DESIGN.to_string()
        } else {
            details.title.clone()
        };
        Self {
            id: format!("design_{}", at.timestamp_millis()),
            name,
            elements,
            color_scheme,
            canvas_size,
            metadata: DesignMetadata {
                details: details.clone(),
                template,
            },
            created_at: iso_timestamp(at),
        }
    }

    /// Assemble a document from the store's current state.
    #[must_use]
    pub fn from_store(store: &ElementStore, details: &EventDetails) -> Self {
        Self::assemble_at(
            store.elements().to_vec(),
            store.color_scheme().clone(),
            store.canvas_size(),
            details,
            store.applied_template().map(str::to_string),
            Utc::now(),
        )
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CardResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a document.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a design document.
    pub fn from_json(json: &str) -> CardResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Downloadable JSON export of a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignExport {
    /// Format version.
    pub version: String,
    /// Element collection.
    pub elements: Vec<DesignElement>,
    /// Active colors.
    pub color_scheme: ColorScheme,
    /// Canvas dimensions.
    pub canvas_size: CanvasSize,
    /// Event details.
    pub event_details: EventDetails,
    /// Template id.
    pub template: Option<String>,
    /// RFC 3339 export time.
    pub exported_at: String,
}

impl DesignExport {
    /// Build an export of the store's state stamped with `at`.
    #[must_use]
    pub fn from_store_at(store: &ElementStore, details: &EventDetails, at: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            elements: store.elements().to_vec(),
            color_scheme: store.color_scheme().clone(),
            canvas_size: store.canvas_size(),
            event_details: details.clone(),
            template: store.applied_template().map(str::to_string),
            exported_at: iso_timestamp(at),
        }
    }

    /// Build an export of the store's state.
    #[must_use]
    pub fn from_store(store: &ElementStore, details: &EventDetails) -> Self {
        Self::from_store_at(store, details, Utc::now())
    }

    /// Download file name for an export made at `at`.
    #[must_use]
    pub fn file_name(at: DateTime<Utc>) -> String {
        format!("vibescard-design-{}.json", at.timestamp_millis())
    }

    /// Serialize as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> CardResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
