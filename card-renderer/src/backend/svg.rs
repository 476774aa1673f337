//! Headless retained-mode stage.
//!
//! Keeps draw nodes per layer and rasterizes them through an SVG intermediate
//! with the resvg/tiny-skia pipeline. The stage serializes itself as a JSON
//! stage document that [`SvgStage::load_json`] reads back.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Arc, OnceLock};

use card_core::{ElementId, TextAlign};
use serde::{Deserialize, Serialize};

use super::{Layer, RenderBackend, SceneSerializer};
use crate::error::{RenderError, RenderResult};
use crate::node::{DrawKind, DrawNode, Paint, PlaceholderKind, Stroke};

/// Selection handle color.
const HANDLE_STROKE: &str = "#3b82f6";

/// Selection anchor edge length in renderer pixels.
const HANDLE_ANCHOR_SIZE: f32 = 8.0;

/// Family every generic `sans-serif` and unmatched text falls back to.
pub const FALLBACK_FONT_FAMILY: &str = "DejaVu Sans";

static FONTDB: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

/// Font database shared by every raster: the bundled fallback faces plus
/// whatever the host has installed.
fn font_database() -> Arc<fontdb::Database> {
    FONTDB
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_font_data(include_bytes!("../../assets/fonts/DejaVuSans.ttf").to_vec());
            db.load_font_data(include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf").to_vec());
            db.load_system_fonts();
            db.set_sans_serif_family(FALLBACK_FONT_FAMILY);
            db.set_serif_family(FALLBACK_FONT_FAMILY);
            tracing::debug!("Font database ready with {} faces", db.len());
            Arc::new(db)
        })
        .clone()
}

/// Serialized form of a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDocument {
    /// Stage width in renderer pixels.
    pub width: f32,
    /// Stage height in renderer pixels.
    pub height: f32,
    /// Background layer nodes.
    pub background: Vec<DrawNode>,
    /// Element layer nodes, in paint order.
    pub elements: Vec<DrawNode>,
}

/// In-memory stage rendered with resvg.
#[derive(Debug, Clone)]
pub struct SvgStage {
    document: StageDocument,
    handles: Vec<ElementId>,
    handles_visible: bool,
    draws: HashMap<Layer, u64>,
}

impl SvgStage {
    /// Create an empty stage of the given renderer size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            document: StageDocument {
                width,
                height,
                ..StageDocument::default()
            },
            handles: Vec::new(),
            handles_visible: true,
            draws: HashMap::new(),
        }
    }

    /// Nodes currently on `layer`.
    #[must_use]
    pub fn nodes(&self, layer: Layer) -> &[DrawNode] {
        match layer {
            Layer::Background => &self.document.background,
            Layer::Elements => &self.document.elements,
        }
    }

    /// Mutable access to an element-layer node, as a user drag would have.
    pub fn node_mut(&mut self, id: &ElementId) -> Option<&mut DrawNode> {
        self.document.elements.iter_mut().find(|n| &n.id == id)
    }

    /// How many redraws `layer` has been asked for.
    #[must_use]
    pub fn draw_count(&self, layer: Layer) -> u64 {
        self.draws.get(&layer).copied().unwrap_or(0)
    }

    /// Render the stage to an SVG string at `pixel_ratio`.
    #[must_use]
    pub fn render_to_svg(&self, pixel_ratio: f32) -> String {
        let StageDocument { width, height, .. } = self.document;
        let out_w = (width * pixel_ratio).ceil().max(1.0);
        let out_h = (height * pixel_ratio).ceil().max(1.0);

        let mut defs = String::new();
        let mut body = String::with_capacity(4096);
        let mut next_def = 0usize;

        for node in self.document.background.iter().chain(&self.document.elements) {
            render_node_svg(&mut body, &mut defs, &mut next_def, node);
        }

        if self.handles_visible {
            for id in &self.handles {
                if let Some(node) = self.node(id) {
                    render_handles_svg(&mut body, node);
                }
            }
        }

        let mut svg = String::with_capacity(body.len() + defs.len() + 256);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {width} {height}\">",
        );
        if !defs.is_empty() {
            let _ = write!(svg, "<defs>{defs}</defs>");
        }
        svg.push_str(&body);
        svg.push_str("</svg>");
        svg
    }

    /// Rasterize an SVG string to a tiny-skia pixmap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rasterize_svg(svg_string: &str) -> RenderResult<tiny_skia::Pixmap> {
        let opt = usvg::Options {
            fontdb: font_database(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg_string, &opt)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let px_w = tree.size().width().ceil() as u32;
        let px_h = tree.size().height().ceil() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

impl RenderBackend for SvgStage {
    fn set_stage_size(&mut self, width: f32, height: f32) {
        self.document.width = width;
        self.document.height = height;
    }

    fn stage_size(&self) -> (f32, f32) {
        (self.document.width, self.document.height)
    }

    fn mount(&mut self, layer: Layer, nodes: Vec<DrawNode>) {
        match layer {
            Layer::Background => self.document.background = nodes,
            Layer::Elements => self.document.elements = nodes,
        }
    }

    fn node(&self, id: &ElementId) -> Option<&DrawNode> {
        self.document.elements.iter().find(|n| &n.id == id)
    }

    fn attach_handles(&mut self, ids: Vec<ElementId>) {
        self.handles = ids;
    }

    fn handle_nodes(&self) -> &[ElementId] {
        &self.handles
    }

    fn set_handles_visible(&mut self, visible: bool) {
        self.handles_visible = visible;
    }

    fn handles_visible(&self) -> bool {
        self.handles_visible
    }

    fn reset_node_scale(&mut self, id: &ElementId) {
        if let Some(node) = self.node_mut(id) {
            node.scale_x = 1.0;
            node.scale_y = 1.0;
        }
    }

    fn batch_draw(&mut self, layer: Layer) {
        *self.draws.entry(layer).or_insert(0) += 1;
    }

    fn rasterize(&self, pixel_ratio: f32) -> RenderResult<Vec<u8>> {
        if !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
            return Err(RenderError::Export(format!(
                "Invalid pixel ratio {pixel_ratio}"
            )));
        }
        let svg = self.render_to_svg(pixel_ratio);
        let pixmap = Self::rasterize_svg(&svg)?;
        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    fn load_json(&mut self, json: &str) -> RenderResult<()> {
        let document: StageDocument = serde_json::from_str(json)?;
        tracing::debug!(
            "Loaded stage document with {} element nodes",
            document.elements.len()
        );
        self.document = document;
        self.handles.clear();
        Ok(())
    }

    fn serializer(&self) -> Option<&dyn SceneSerializer> {
        Some(self)
    }
}

impl SceneSerializer for SvgStage {
    fn to_json(&self) -> RenderResult<String> {
        Ok(serde_json::to_string(&self.document)?)
    }
}

fn paint_attr(defs: &mut String, next_def: &mut usize, paint: &Paint, w: f32, h: f32) -> String {
    match paint {
        Paint::None => "none".to_string(),
        Paint::Solid { color } => escape_xml(color),
        Paint::LinearGradient { start, end } => {
            let id = format!("grad-{next_def}");
            *next_def += 1;
            let _ = write!(
                defs,
                "<linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"0\" y1=\"0\" x2=\"{w}\" y2=\"{h}\"><stop offset=\"0\" stop-color=\"{}\"/><stop offset=\"1\" stop-color=\"{}\"/></linearGradient>",
                escape_xml(start),
                escape_xml(end),
            );
            format!("url(#{id})")
        }
    }
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    let Some(stroke) = stroke else {
        return String::new();
    };
    let mut attrs = format!(
        " stroke=\"{}\" stroke-width=\"{}\"",
        escape_xml(&stroke.color),
        stroke.width
    );
    if !stroke.dash.is_empty() {
        let dash: Vec<String> = stroke.dash.iter().map(ToString::to_string).collect();
        let _ = write!(attrs, " stroke-dasharray=\"{}\"", dash.join(" "));
    }
    attrs
}

/// Render a single node inside its own transformed group.
fn render_node_svg(svg: &mut String, defs: &mut String, next_def: &mut usize, node: &DrawNode) {
    let (w, h) = (node.width, node.height);
    let _ = write!(
        svg,
        "<g transform=\"translate({} {}) rotate({}) scale({} {})\" opacity=\"{}\">",
        node.x, node.y, node.rotation, node.scale_x, node.scale_y, node.opacity,
    );

    match &node.kind {
        DrawKind::Text {
            text,
            font_size,
            font_family,
            bold,
            italic,
            fill,
            align,
        } => {
            let (tx, anchor) = match align {
                TextAlign::Center => (w / 2.0, "middle"),
                TextAlign::Right => (w, "end"),
                TextAlign::Left | TextAlign::Justify => (0.0, "start"),
            };
            let weight = if *bold { "bold" } else { "normal" };
            let style = if *italic { "italic" } else { "normal" };
            let _ = write!(
                svg,
                "<text x=\"{tx}\" y=\"{}\" font-size=\"{font_size}\" font-family=\"{}, sans-serif\" font-weight=\"{weight}\" font-style=\"{style}\" fill=\"{}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\">{}</text>",
                h / 2.0,
                escape_xml(font_family),
                escape_xml(fill),
                escape_xml(text),
            );
        }

        DrawKind::Rect {
            fill,
            stroke,
            corner_radius,
        } => {
            let fill = paint_attr(defs, next_def, fill, w, h);
            let _ = write!(
                svg,
                "<rect width=\"{w}\" height=\"{h}\" rx=\"{corner_radius}\" fill=\"{fill}\"{}/>",
                stroke_attrs(stroke.as_ref()),
            );
        }

        DrawKind::Ellipse { fill } => {
            let fill = paint_attr(defs, next_def, fill, w, h);
            let _ = write!(
                svg,
                "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" fill=\"{fill}\"/>",
                w / 2.0,
                h / 2.0,
                w / 2.0,
                h / 2.0,
            );
        }

        DrawKind::Image {
            href,
            corner_radius,
        } => {
            let clip = if *corner_radius > 0.0 {
                let id = format!("clip-{next_def}");
                *next_def += 1;
                let _ = write!(
                    defs,
                    "<clipPath id=\"{id}\"><rect width=\"{w}\" height=\"{h}\" rx=\"{corner_radius}\"/></clipPath>",
                );
                format!(" clip-path=\"url(#{id})\"")
            } else {
                String::new()
            };
            let _ = write!(
                svg,
                "<image width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{}\"{clip}/>",
                escape_xml(href),
            );
        }

        DrawKind::Placeholder { state } => {
            let background = match state {
                PlaceholderKind::Loading => "#f3f4f6",
                PlaceholderKind::Error => "#fef2f2",
            };
            let _ = write!(
                svg,
                "<rect width=\"{w}\" height=\"{h}\" fill=\"{background}\" stroke=\"{}\" stroke-width=\"2\" stroke-dasharray=\"5 5\"/>",
                state.stroke_color(),
            );
            let _ = write!(
                svg,
                "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"sans-serif\">{}</text>",
                w / 2.0,
                h / 2.0,
                state.stroke_color(),
                state.label(),
            );
        }
    }

    svg.push_str("</g>");
}

/// Render the selection outline and its eight resize anchors.
fn render_handles_svg(svg: &mut String, node: &DrawNode) {
    let w = node.width * node.scale_x;
    let h = node.height * node.scale_y;
    let _ = write!(
        svg,
        "<g transform=\"translate({} {}) rotate({})\"><rect width=\"{w}\" height=\"{h}\" fill=\"none\" stroke=\"{HANDLE_STROKE}\" stroke-width=\"2\"/>",
        node.x, node.y, node.rotation,
    );
    let half = HANDLE_ANCHOR_SIZE / 2.0;
    for (ax, ay) in [
        (0.0, 0.0),
        (w / 2.0, 0.0),
        (w, 0.0),
        (w, h / 2.0),
        (0.0, h / 2.0),
        (0.0, h),
        (w / 2.0, h),
        (w, h),
    ] {
        let _ = write!(
            svg,
            "<rect x=\"{}\" y=\"{}\" width=\"{HANDLE_ANCHOR_SIZE}\" height=\"{HANDLE_ANCHOR_SIZE}\" rx=\"4\" fill=\"#ffffff\" stroke=\"{HANDLE_STROKE}\" stroke-width=\"1\"/>",
            ax - half,
            ay - half,
        );
    }
    svg.push_str("</g>");
}

/// Escape XML special characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
