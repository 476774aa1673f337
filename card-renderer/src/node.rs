//! Renderer-space draw nodes.
//!
//! A [`DrawNode`] is one retained renderer object. Its geometry is already
//! multiplied by the zoom scale; rotation and opacity are copied as-is.

use card_core::{BackgroundFill, ElementId, ShapeKind, TextAlign};
use serde::{Deserialize, Serialize};

/// Fill paint for rectangles and ellipses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Paint {
    /// No fill.
    None,
    /// Single color.
    Solid {
        /// CSS color.
        color: String,
    },
    /// Two-stop gradient from the node's top-left to its bottom-right corner.
    LinearGradient {
        /// Color at the top-left.
        start: String,
        /// Color at the bottom-right.
        end: String,
    },
}

impl From<BackgroundFill> for Paint {
    fn from(fill: BackgroundFill) -> Self {
        match fill {
            BackgroundFill::Solid { color } => Self::Solid { color },
            BackgroundFill::LinearGradient { start, end } => Self::LinearGradient { start, end },
        }
    }
}

/// Stroke outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// CSS color.
    pub color: String,
    /// Width in renderer pixels.
    pub width: f32,
    /// Dash pattern; empty for solid lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f32>,
}

/// Why an image node is showing a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    /// Load still in progress.
    Loading,
    /// Every candidate source failed.
    Error,
}

impl PlaceholderKind {
    /// Outline color.
    #[must_use]
    pub const fn stroke_color(self) -> &'static str {
        match self {
            Self::Loading => "#9ca3af",
            Self::Error => "#ef4444",
        }
    }

    /// Centered label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Loading => "Loading...",
            Self::Error => "Image failed to load",
        }
    }
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "className")]
pub enum DrawKind {
    /// Text box.
    Text {
        /// Text to draw.
        text: String,
        /// Scaled font size.
        font_size: f32,
        /// Font family.
        font_family: String,
        /// Bold weight.
        bold: bool,
        /// Italic style.
        italic: bool,
        /// Fill color.
        fill: String,
        /// Horizontal alignment.
        align: TextAlign,
    },
    /// Rectangle, optionally rounded.
    Rect {
        /// Interior paint.
        fill: Paint,
        /// Outline.
        stroke: Option<Stroke>,
        /// Scaled corner radius.
        corner_radius: f32,
    },
    /// Ellipse inscribed in the node box.
    Ellipse {
        /// Interior paint.
        fill: Paint,
    },
    /// Decoded bitmap, embedded as a data URI.
    Image {
        /// `data:` URI of the bitmap.
        href: String,
        /// Scaled corner radius.
        corner_radius: f32,
    },
    /// Dashed box standing in for an image.
    Placeholder {
        /// Loading or error.
        state: PlaceholderKind,
    },
}

impl DrawKind {
    /// Rectangle or ellipse for a shape element.
    #[must_use]
    pub fn shape(shape: ShapeKind, fill: Paint, corner_radius: f32) -> Self {
        match shape {
            ShapeKind::Rectangle => Self::Rect {
                fill,
                stroke: None,
                corner_radius,
            },
            ShapeKind::Circle => Self::Ellipse { fill },
        }
    }
}

/// One retained renderer object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawNode {
    /// Id of the element this node draws.
    pub id: ElementId,
    /// Scaled X position.
    pub x: f32,
    /// Scaled Y position.
    pub y: f32,
    /// Scaled width.
    pub width: f32,
    /// Scaled height.
    pub height: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Opacity.
    pub opacity: f32,
    /// Horizontal stretch applied by an in-progress transform.
    pub scale_x: f32,
    /// Vertical stretch applied by an in-progress transform.
    pub scale_y: f32,
    /// Whether the node can be dragged.
    pub draggable: bool,
    /// Whether the node receives pointer events.
    pub listening: bool,
    /// What to draw.
    pub kind: DrawKind,
}

impl DrawNode {
    /// Create a draggable, listening node at unit scale.
    #[must_use]
    pub fn new(id: ElementId, kind: DrawKind) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            opacity: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            draggable: true,
            listening: true,
            kind,
        }
    }

    /// Set the box.
    #[must_use]
    pub fn with_bounds(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    /// Disable dragging and pointer events.
    #[must_use]
    pub fn passive(mut self) -> Self {
        self.draggable = false;
        self.listening = false;
        self
    }
}

/// Geometry the renderer reports when a drag or transform ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    /// Renderer-space X.
    pub x: f32,
    /// Renderer-space Y.
    pub y: f32,
    /// Renderer-space width before stretch.
    pub width: f32,
    /// Renderer-space height before stretch.
    pub height: f32,
    /// Horizontal stretch.
    pub scale_x: f32,
    /// Vertical stretch.
    pub scale_y: f32,
    /// Rotation in degrees.
    pub rotation: f32,
}

impl From<&DrawNode> for NodeGeometry {
    fn from(node: &DrawNode) -> Self {
        Self {
            x: node.x,
            y: node.y,
            width: node.width,
            height: node.height,
            scale_x: node.scale_x,
            scale_y: node.scale_y,
            rotation: node.rotation,
        }
    }
}
