//! Design elements - the positioned, styled units of a card.
//!
//! An element is a [`Transform`] (geometry and paint order) plus an
//! [`ElementKind`], a tagged union keyed on `type` that carries only the
//! content and style fields valid for that type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{DataField, EventDetails};

/// Text shown for a text element with no stored content.
pub const DEFAULT_TEXT: &str = "Click to edit";

/// Text shown for a logo element with neither text nor emblem.
pub const DEFAULT_LOGO_TEXT: &str = "LOGO";

/// Stock photo used when an image element is added without a source.
pub const DEFAULT_IMAGE_SRC: &str =
    "https://images.unsplash.com/photo-1533174072545-7a4b6ad7a6c3?w=150&h=100&fit=crop&auto=format";

/// Unique identifier for an element.
///
/// Opaque and stable for the element's lifetime. Template elements carry
/// their own ids (`"tech-title"`); generated ids use an `element_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("element_{}", Uuid::new_v4().simple()))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of element type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Free text.
    Text,
    /// Raster image.
    Image,
    /// Filled shape.
    Shape,
    /// Full-bleed background fill.
    Background,
    /// Brand mark rendered as text.
    Logo,
    /// Stroked frame.
    Border,
}

impl ElementType {
    /// Lowercase tag name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Shape => "shape",
            Self::Background => "background",
            Self::Logo => "logo",
            Self::Border => "border",
        }
    }

    /// Human readable label, used in notifications.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Shape => "Shape",
            Self::Background => "Background",
            Self::Logo => "Logo",
            Self::Border => "Border",
        }
    }

    /// Default `(width, height)` for a newly added element of this type.
    #[must_use]
    pub const fn default_size(self) -> (f32, f32) {
        match self {
            Self::Text => (200.0, 50.0),
            _ => (150.0, 100.0),
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry and paint order in unscaled design-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// X position (pixels from left).
    pub x: f32,
    /// Y position (pixels from top).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f32,
    /// Opacity from 0.0 to 1.0.
    #[serde(default = "Transform::default_opacity")]
    pub opacity: f32,
    /// Paint order; ties are broken by collection order.
    #[serde(default)]
    pub z_index: i32,
}

impl Transform {
    const fn default_opacity() -> f32 {
        1.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 150.0,
            height: 100.0,
            rotation: 0.0,
            opacity: 1.0,
            z_index: 0,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
    /// Justified.
    Justify,
}

/// Typography shared by text and logo elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    /// Font size in design-space pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Font family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// CSS font weight (`"bold"`, `"600"`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    /// CSS font style (`"italic"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    /// Fill color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Alignment inside the element box.
    #[serde(default)]
    pub text_align: TextAlign,
}

impl TextStyle {
    /// Whether the weight renders as bold.
    #[must_use]
    pub fn is_bold(&self) -> bool {
        matches!(
            self.font_weight.as_deref(),
            Some("bold" | "bolder" | "600" | "700" | "800" | "900")
        )
    }
}

/// Content of a text element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// Stored text.
    #[serde(default)]
    pub text: String,
}

/// Content of an image element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Image source: URL, site-relative path, or data URI.
    pub src: String,
}

/// Style of an image element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStyle {
    /// Corner radius in design-space pixels.
    #[serde(default)]
    pub border_radius: f32,
}

/// Geometric primitive drawn by a shape element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    #[default]
    Rectangle,
    /// Circle inscribed in the element box.
    Circle,
}

/// Content of a shape element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeContent {
    /// Which primitive to draw.
    #[serde(default)]
    pub shape: ShapeKind,
}

/// Style of a shape element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Fill color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Corner radius in design-space pixels.
    #[serde(default)]
    pub border_radius: f32,
}

/// Style of a background element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundStyle {
    /// CSS color or gradient string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

/// Content of a logo element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogoContent {
    /// Logo text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Emblem glyph used when no text is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emblem: Option<String>,
}

/// Style of a border element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderStyle {
    /// Stroke color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    /// Stroke width in design-space pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
    /// Corner radius in design-space pixels.
    #[serde(default)]
    pub border_radius: f32,
}

/// Type-tagged content and style of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// Free text.
    Text {
        /// Stored text.
        #[serde(default)]
        content: TextContent,
        /// Typography.
        #[serde(default)]
        style: TextStyle,
    },
    /// Raster image.
    Image {
        /// Image source.
        content: ImageContent,
        /// Corner styling.
        #[serde(default)]
        style: ImageStyle,
    },
    /// Filled shape.
    Shape {
        /// Primitive.
        #[serde(default)]
        content: ShapeContent,
        /// Fill styling.
        #[serde(default)]
        style: ShapeStyle,
    },
    /// Background fill.
    Background {
        /// Fill styling.
        #[serde(default)]
        style: BackgroundStyle,
    },
    /// Brand mark.
    Logo {
        /// Text or emblem.
        #[serde(default)]
        content: LogoContent,
        /// Typography.
        #[serde(default)]
        style: TextStyle,
    },
    /// Stroked frame.
    Border {
        /// Stroke styling.
        #[serde(default)]
        style: BorderStyle,
    },
}

impl ElementKind {
    /// The type tag of this kind.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Text { .. } => ElementType::Text,
            Self::Image { .. } => ElementType::Image,
            Self::Shape { .. } => ElementType::Shape,
            Self::Background { .. } => ElementType::Background,
            Self::Logo { .. } => ElementType::Logo,
            Self::Border { .. } => ElementType::Border,
        }
    }

    /// Image source, if this is an image.
    #[must_use]
    pub fn image_src(&self) -> Option<&str> {
        match self {
            Self::Image { content, .. } => Some(content.src.as_str()),
            _ => None,
        }
    }
}

/// A design element with content and transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignElement {
    /// Unique identifier.
    pub id: ElementId,
    /// Position, size and paint order.
    #[serde(flatten)]
    pub transform: Transform,
    /// Live event-detail binding for the displayed text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_field: Option<DataField>,
    /// Type-tagged content and style.
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl DesignElement {
    /// Create a new element with a fresh id and default transform.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            transform: Transform::default(),
            data_field: None,
            kind,
        }
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Bind the displayed text to an event-detail field.
    #[must_use]
    pub fn with_data_field(mut self, field: DataField) -> Self {
        self.data_field = Some(field);
        self
    }

    /// The type tag of this element.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// Text to display, resolving any `dataField` binding against live event
    /// details. Returns `None` for element types that carry no text.
    ///
    /// A bound field only wins when its live value is non-empty; the stored
    /// content is never modified.
    #[must_use]
    pub fn effective_text<'a>(&'a self, details: &'a EventDetails) -> Option<&'a str> {
        let bound = self
            .data_field
            .map(|field| details.get(field))
            .filter(|value| !value.is_empty());

        match &self.kind {
            ElementKind::Text { content, .. } => Some(bound.unwrap_or_else(|| {
                if content.text.is_empty() {
                    DEFAULT_TEXT
                } else {
                    content.text.as_str()
                }
            })),
            ElementKind::Logo { content, .. } => Some(
                bound
                    .or(content.text.as_deref().filter(|t| !t.is_empty()))
                    .or(content.emblem.as_deref())
                    .unwrap_or(DEFAULT_LOGO_TEXT),
            ),
            _ => None,
        }
    }

    /// Overwrite the stored text of a text or logo element.
    ///
    /// Returns `false` for element types that carry no text.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        match &mut self.kind {
            ElementKind::Text { content, .. } => {
                content.text = text.into();
                true
            }
            ElementKind::Logo { content, .. } => {
                content.text = Some(text.into());
                true
            }
            _ => false,
        }
    }
}

/// A shallow, field-wise update applied by [`crate::ElementStore::update_element`].
///
/// Only fields that are `Some` are written. Replacing `kind` swaps content
/// and style wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    /// New X position.
    pub x: Option<f32>,
    /// New Y position.
    pub y: Option<f32>,
    /// New width.
    pub width: Option<f32>,
    /// New height.
    pub height: Option<f32>,
    /// New rotation in degrees.
    pub rotation: Option<f32>,
    /// New opacity.
    pub opacity: Option<f32>,
    /// New paint order.
    pub z_index: Option<i32>,
    /// New data binding; `Some(None)` removes it.
    pub data_field: Option<Option<DataField>>,
    /// New content and style.
    pub kind: Option<ElementKind>,
}

impl ElementPatch {
    /// Patch that moves an element.
    #[must_use]
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Set the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Replace content and style.
    #[must_use]
    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Merge into an element.
    pub fn apply_to(self, element: &mut DesignElement) {
        let t = &mut element.transform;
        if let Some(x) = self.x {
            t.x = x;
        }
        if let Some(y) = self.y {
            t.y = y;
        }
        if let Some(width) = self.width {
            t.width = width;
        }
        if let Some(height) = self.height {
            t.height = height;
        }
        if let Some(rotation) = self.rotation {
            t.rotation = rotation;
        }
        if let Some(opacity) = self.opacity {
            t.opacity = opacity;
        }
        if let Some(z_index) = self.z_index {
            t.z_index = z_index;
        }
        if let Some(data_field) = self.data_field {
            element.data_field = data_field;
        }
        if let Some(kind) = self.kind {
            element.kind = kind;
        }
    }
}
