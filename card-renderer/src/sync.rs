//! Canvas synchronization.
//!
//! [`CanvasSynchronizer`] turns the design-space element collection into
//! scaled draw nodes, keeps the selection handles on the selected node and
//! folds renderer-space drag/transform results back into design space.

use std::collections::HashMap;

use card_core::{
    scale_factor, BackgroundFill, ColorScheme, DesignElement, ElementId, ElementKind,
    ElementPatch, ElementStore, EventDetails, TextAlign, INITIAL_ZOOM,
};

use crate::backend::{Layer, RenderBackend};
use crate::error::RenderResult;
use crate::image::{ImageResolver, ImageState};
use crate::node::{DrawKind, DrawNode, NodeGeometry, Paint, PlaceholderKind, Stroke};
use crate::raster::{Raster, FALLBACK_PIXEL_RATIO};

/// Smallest width or height a transform may leave, in design units.
pub const MIN_ELEMENT_SIZE: f32 = 5.0;

/// Lowest zoom percentage the synchronizer accepts.
pub const MIN_ZOOM: u32 = 1;

/// Grid cell size in design units.
pub const GRID_SPACING: f32 = 20.0;

const GRID_COLOR: &str = "#e5e7eb";
const GRID_OPACITY: f32 = 0.5;
const CANVAS_NODE_ID: &str = "canvas-background";

const TEXT_FONT_SIZE: f32 = 18.0;
const TEXT_FONT_FAMILY: &str = "Inter";
const LOGO_FONT_SIZE: f32 = 20.0;
const LOGO_FONT_FAMILY: &str = "sans-serif";
const BORDER_STROKE_WIDTH: f32 = 4.0;

/// Where the element layer's nodes come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SceneSource {
    /// Rebuilt from the element store on every render.
    #[default]
    Store,
    /// Loaded from a serialized scene document and left as-is.
    External,
}

/// Drives a [`RenderBackend`] from the element store.
#[derive(Debug)]
pub struct CanvasSynchronizer<B: RenderBackend> {
    backend: B,
    zoom: u32,
    images: HashMap<String, ImageState>,
    source: SceneSource,
    grid_visible: bool,
}

impl<B: RenderBackend> CanvasSynchronizer<B> {
    /// Wrap `backend` at the initial zoom.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            zoom: INITIAL_ZOOM,
            images: HashMap::new(),
            source: SceneSource::Store,
            grid_visible: false,
        }
    }

    /// The wrapped backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the wrapped backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Current zoom percentage.
    #[must_use]
    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Set the zoom percentage, floored at [`MIN_ZOOM`]; takes effect on the
    /// next render.
    pub fn set_zoom(&mut self, zoom: u32) {
        let zoom = zoom.max(MIN_ZOOM);
        tracing::debug!("Zoom {} -> {}", self.zoom, zoom);
        self.zoom = zoom;
    }

    /// Design-to-renderer multiplier.
    #[must_use]
    pub fn scale(&self) -> f32 {
        scale_factor(self.zoom)
    }

    /// Whether the background grid is drawn.
    #[must_use]
    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    /// Show or hide the background grid.
    pub fn set_grid_visible(&mut self, visible: bool) {
        self.grid_visible = visible;
    }

    /// Where element nodes currently come from.
    #[must_use]
    pub fn source(&self) -> SceneSource {
        self.source
    }

    /// Load state of an image source, if a load has been started.
    #[must_use]
    pub fn image_state(&self, src: &str) -> Option<&ImageState> {
        self.images.get(src)
    }

    /// Record the load state of an image source.
    pub fn set_image_state(&mut self, src: impl Into<String>, state: ImageState) {
        self.images.insert(src.into(), state);
    }

    /// Image sources in `elements` that have not settled yet.
    #[must_use]
    pub fn unsettled_sources(&self, elements: &[DesignElement]) -> Vec<String> {
        let mut sources: Vec<String> = elements
            .iter()
            .filter_map(|el| el.kind.image_src())
            .filter(|src| !self.images.get(*src).is_some_and(ImageState::is_settled))
            .map(ToString::to_string)
            .collect();
        sources.sort();
        sources.dedup();
        sources
    }

    /// Resolve every unsettled image in `elements` and wait until each one
    /// has loaded or failed. Returns how many sources were resolved.
    pub async fn await_image_settle(
        &mut self,
        elements: &[DesignElement],
        resolver: &ImageResolver,
    ) -> usize {
        let sources = self.unsettled_sources(elements);
        if sources.is_empty() {
            return 0;
        }
        tracing::debug!("Waiting for {} images to settle", sources.len());
        for src in &sources {
            self.images.insert(src.clone(), ImageState::Pending);
        }

        let resolved = resolver.resolve_all(sources).await;
        let count = resolved.len();
        for (src, state) in resolved {
            if let ImageState::Failed(reason) = &state {
                tracing::warn!("Image {} failed: {}", src, reason);
            }
            self.images.insert(src, state);
        }
        count
    }

    /// Background layer: the canvas fill plus the optional grid.
    #[must_use]
    pub fn background_nodes(&self, store: &ElementStore) -> Vec<DrawNode> {
        let scale = self.scale();
        let canvas = store.canvas_size();
        let (width, height) = (canvas.width * scale, canvas.height * scale);

        let fill = Paint::from(BackgroundFill::parse(&store.color_scheme().background));
        let mut nodes = vec![DrawNode::new(
            ElementId::from(CANVAS_NODE_ID),
            DrawKind::Rect {
                fill,
                stroke: None,
                corner_radius: 0.0,
            },
        )
        .with_bounds(0.0, 0.0, width, height)
        .passive()];

        let step = GRID_SPACING * scale;
        if self.grid_visible && step > 0.0 {
            let line = |id: String, x: f32, y: f32, w: f32, h: f32| {
                let mut node = DrawNode::new(
                    ElementId::from(id),
                    DrawKind::Rect {
                        fill: Paint::Solid {
                            color: GRID_COLOR.to_string(),
                        },
                        stroke: None,
                        corner_radius: 0.0,
                    },
                )
                .with_bounds(x, y, w, h)
                .passive();
                node.opacity = GRID_OPACITY;
                node
            };

            let mut i = 0usize;
            let mut x = 0.0;
            while x < width {
                nodes.push(line(format!("grid-v-{i}"), x, 0.0, 1.0, height));
                x += step;
                i += 1;
            }
            let mut i = 0usize;
            let mut y = 0.0;
            while y < height {
                nodes.push(line(format!("grid-h-{i}"), 0.0, y, width, 1.0));
                y += step;
                i += 1;
            }
        }

        nodes
    }

    /// Element layer nodes in paint order (ascending `zIndex`, stable).
    #[must_use]
    pub fn element_nodes(&self, store: &ElementStore, details: &EventDetails) -> Vec<DrawNode> {
        let mut ordered: Vec<&DesignElement> = store.elements().iter().collect();
        ordered.sort_by_key(|el| el.transform.z_index);
        ordered
            .into_iter()
            .map(|el| self.element_node(el, store.color_scheme(), details))
            .collect()
    }

    /// Map one element to a scaled draw node.
    #[must_use]
    pub fn element_node(
        &self,
        element: &DesignElement,
        scheme: &ColorScheme,
        details: &EventDetails,
    ) -> DrawNode {
        let scale = self.scale();
        let t = &element.transform;

        let kind = match &element.kind {
            ElementKind::Text { style, .. } => DrawKind::Text {
                text: element.effective_text(details).unwrap_or_default().to_string(),
                font_size: style.font_size.unwrap_or(TEXT_FONT_SIZE) * scale,
                font_family: style
                    .font_family
                    .clone()
                    .unwrap_or_else(|| TEXT_FONT_FAMILY.to_string()),
                bold: style.is_bold(),
                italic: style.font_style.as_deref() == Some("italic"),
                fill: style.color.clone().unwrap_or_else(|| scheme.text.clone()),
                align: style.text_align,
            },
            ElementKind::Logo { style, .. } => DrawKind::Text {
                text: element.effective_text(details).unwrap_or_default().to_string(),
                font_size: style.font_size.unwrap_or(LOGO_FONT_SIZE) * scale,
                font_family: style
                    .font_family
                    .clone()
                    .unwrap_or_else(|| LOGO_FONT_FAMILY.to_string()),
                bold: style.is_bold(),
                italic: false,
                fill: style.color.clone().unwrap_or_else(|| scheme.primary.clone()),
                align: TextAlign::Center,
            },
            ElementKind::Image { content, style } => match self.images.get(&content.src) {
                Some(ImageState::Loaded(image)) => DrawKind::Image {
                    href: image.data_uri(),
                    corner_radius: style.border_radius * scale,
                },
                Some(ImageState::Failed(_)) => DrawKind::Placeholder {
                    state: PlaceholderKind::Error,
                },
                Some(ImageState::Pending) | None => DrawKind::Placeholder {
                    state: PlaceholderKind::Loading,
                },
            },
            ElementKind::Shape { content, style } => DrawKind::shape(
                content.shape,
                Paint::Solid {
                    color: style
                        .background_color
                        .clone()
                        .unwrap_or_else(|| scheme.primary.clone()),
                },
                style.border_radius * scale,
            ),
            ElementKind::Background { style } => DrawKind::Rect {
                fill: Paint::from(BackgroundFill::parse(
                    style.background.as_deref().unwrap_or(&scheme.background),
                )),
                stroke: None,
                corner_radius: 0.0,
            },
            ElementKind::Border { style } => DrawKind::Rect {
                fill: Paint::None,
                stroke: Some(Stroke {
                    color: style
                        .border_color
                        .clone()
                        .unwrap_or_else(|| scheme.accent.clone()),
                    width: style.border_width.unwrap_or(BORDER_STROKE_WIDTH) * scale,
                    dash: Vec::new(),
                }),
                corner_radius: style.border_radius * scale,
            },
        };

        let mut node = DrawNode::new(element.id.clone(), kind).with_bounds(
            t.x * scale,
            t.y * scale,
            t.width * scale,
            t.height * scale,
        );
        node.rotation = t.rotation;
        node.opacity = t.opacity;
        if matches!(element.kind, ElementKind::Background { .. }) {
            node = node.passive();
        }
        node
    }

    /// Bring the backend in line with the store and reattach the selection.
    ///
    /// While an external scene is loaded the stage is left untouched and
    /// only the selection handles follow the store.
    pub fn render(&mut self, store: &ElementStore, details: &EventDetails) {
        if self.source == SceneSource::Store {
            let scale = self.scale();
            let canvas = store.canvas_size();
            self.backend
                .set_stage_size(canvas.width * scale, canvas.height * scale);

            let background = self.background_nodes(store);
            self.backend.mount(Layer::Background, background);
            self.backend.batch_draw(Layer::Background);

            let nodes = self.element_nodes(store, details);
            tracing::debug!("Mounted {} element nodes at zoom {}", nodes.len(), self.zoom);
            self.backend.mount(Layer::Elements, nodes);
        }
        self.attach_selection(store);
    }

    /// Point the selection handles at the selected element's node.
    ///
    /// Detaches when nothing is selected or the node is not mounted. Returns
    /// whether the handles ended up attached.
    pub fn attach_selection(&mut self, store: &ElementStore) -> bool {
        let target = store
            .selected()
            .filter(|id| self.source == SceneSource::External || store.get(id).is_some())
            .filter(|id| self.backend.has_node(id))
            .cloned();

        let attached = target.is_some();
        self.backend.attach_handles(target.into_iter().collect());
        self.backend.batch_draw(Layer::Elements);
        attached
    }

    /// Design-space patch for a finished drag at renderer position `(x, y)`.
    #[must_use]
    pub fn commit_drag(&self, x: f32, y: f32) -> ElementPatch {
        let scale = self.scale();
        ElementPatch::position(x / scale, y / scale)
    }

    /// Design-space patch for a finished resize or rotate.
    ///
    /// The stretch is folded into explicit width and height, floored at
    /// [`MIN_ELEMENT_SIZE`], and the node's scale is reset to 1.
    pub fn commit_transform(&mut self, id: &ElementId, geometry: NodeGeometry) -> ElementPatch {
        let scale = self.scale();
        let width = (geometry.width * geometry.scale_x / scale).max(MIN_ELEMENT_SIZE);
        let height = (geometry.height * geometry.scale_y / scale).max(MIN_ELEMENT_SIZE);
        self.backend.reset_node_scale(id);

        ElementPatch::position(geometry.x / scale, geometry.y / scale)
            .with_size(width, height)
            .with_rotation(geometry.rotation)
    }

    /// Commit a drag to the store. Returns `false` if the element is absent.
    pub fn apply_drag(&self, store: &mut ElementStore, id: &ElementId, x: f32, y: f32) -> bool {
        store.update_element(id, self.commit_drag(x, y))
    }

    /// Commit a transform to the store. Returns `false` if the element is
    /// absent.
    pub fn apply_transform(
        &mut self,
        store: &mut ElementStore,
        id: &ElementId,
        geometry: NodeGeometry,
    ) -> bool {
        let patch = self.commit_transform(id, geometry);
        store.update_element(id, patch)
    }

    /// Load a serialized scene straight into the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot read `json`; the current scene
    /// source is kept in that case.
    pub fn load_external_scene(&mut self, json: &str) -> RenderResult<()> {
        self.backend.load_json(json)?;
        self.source = SceneSource::External;
        tracing::info!("Loaded external scene document");
        Ok(())
    }

    /// Go back to rebuilding the element layer from the store.
    pub fn use_store_scene(&mut self) {
        if self.source == SceneSource::External {
            tracing::debug!("Switching back to store-driven scene");
        }
        self.source = SceneSource::Store;
    }

    /// Rasterize the stage with the selection handles hidden.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the raster looks empty.
    pub fn rasterize(&mut self, pixel_ratio: f32) -> RenderResult<Raster> {
        let handles_were_visible = self.backend.handles_visible();
        self.backend.set_handles_visible(false);
        self.backend.batch_draw(Layer::Elements);

        let result = self
            .backend
            .rasterize(pixel_ratio)
            .and_then(Raster::from_png);

        self.backend.set_handles_visible(handles_were_visible);
        self.backend.batch_draw(Layer::Elements);
        result
    }

    /// Export raster at `pixel_ratio`, retried once at 1x.
    ///
    /// # Errors
    ///
    /// Returns the 1x error if both attempts fail.
    pub fn rasterize_for_export(&mut self, pixel_ratio: f32) -> RenderResult<Raster> {
        match self.rasterize(pixel_ratio) {
            Ok(raster) => Ok(raster),
            Err(e) => {
                tracing::warn!("Export raster at {}x failed: {}, retrying", pixel_ratio, e);
                self.rasterize(FALLBACK_PIXEL_RATIO)
            }
        }
    }

    /// The backend's own scene serialization, if it offers one.
    #[must_use]
    pub fn serialize_scene(&self) -> Option<RenderResult<String>> {
        self.backend.serializer().map(|s| s.to_json())
    }
}
