//! Rendering backend seam.
//!
//! The synchronizer only issues commands through [`RenderBackend`]; pixel
//! drawing, hit testing and the transform handles belong to the backend.

pub mod svg;

use card_core::ElementId;

use crate::node::DrawNode;
use crate::RenderResult;

/// Layers of the stage, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Canvas fill and grid.
    Background,
    /// Design elements and the selection handles.
    Elements,
}

/// A retained-mode renderer the editor drives.
pub trait RenderBackend {
    /// Resize the stage, in renderer pixels.
    fn set_stage_size(&mut self, width: f32, height: f32);

    /// Stage size in renderer pixels.
    fn stage_size(&self) -> (f32, f32);

    /// Replace every node on `layer`.
    fn mount(&mut self, layer: Layer, nodes: Vec<DrawNode>);

    /// Look up a node on the element layer.
    fn node(&self, id: &ElementId) -> Option<&DrawNode>;

    /// Whether a node with `id` is mounted on the element layer.
    fn has_node(&self, id: &ElementId) -> bool {
        self.node(id).is_some()
    }

    /// Point the selection handles at `ids`; an empty list detaches them.
    fn attach_handles(&mut self, ids: Vec<ElementId>);

    /// Ids the selection handles are attached to.
    fn handle_nodes(&self) -> &[ElementId];

    /// Show or hide the selection handles without detaching them.
    fn set_handles_visible(&mut self, visible: bool);

    /// Whether the selection handles are drawn.
    fn handles_visible(&self) -> bool;

    /// Reset a node's stretch factors to 1.
    fn reset_node_scale(&mut self, id: &ElementId);

    /// Request a redraw of `layer`.
    fn batch_draw(&mut self, layer: Layer);

    /// Rasterize the whole stage to PNG at `pixel_ratio` device pixels per
    /// renderer pixel.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    fn rasterize(&self, pixel_ratio: f32) -> RenderResult<Vec<u8>>;

    /// Replace the stage contents with a serialized scene document.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a scene document this backend reads.
    fn load_json(&mut self, json: &str) -> RenderResult<()>;

    /// The backend's own scene serialization, if it has one.
    fn serializer(&self) -> Option<&dyn SceneSerializer>;
}

/// Serialization of the full renderer scene.
pub trait SceneSerializer {
    /// Serialize the scene to a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene cannot be serialized.
    fn to_json(&self) -> RenderResult<String>;
}
