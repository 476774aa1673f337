//! Editor session.
//!
//! An [`EditorSession`] owns the element store, the canvas synchronizer and
//! the live event details, and re-renders after every mutation.

use std::sync::Arc;

use card_core::{
    DataField, ElementId, ElementPatch, ElementStore, ElementType, EventDetails, KeyEvent,
    Notification, Notifier, Platform, ShortcutAction, ShortcutDispatcher, Template, ZoomPolicy,
    INITIAL_ZOOM,
};
use card_renderer::{CanvasSynchronizer, NodeGeometry, RenderBackend};

use crate::api::CommunityDesign;
use crate::error::StudioResult;

/// One open design.
#[derive(Debug)]
pub struct EditorSession<B: RenderBackend> {
    store: ElementStore,
    sync: CanvasSynchronizer<B>,
    details: EventDetails,
    shortcuts: ShortcutDispatcher,
    initial_design: Option<CommunityDesign>,
}

impl<B: RenderBackend> EditorSession<B> {
    /// Start an empty session with the starter event details.
    #[must_use]
    pub fn new(backend: B, notifier: Arc<dyn Notifier>, history_capacity: usize) -> Self {
        let mut session = Self {
            store: ElementStore::with_history_capacity(notifier, history_capacity),
            sync: CanvasSynchronizer::new(backend),
            details: EventDetails::starter(),
            shortcuts: ShortcutDispatcher::new(Platform::current()),
            initial_design: None,
        };
        session.render();
        session
    }

    /// Open an existing community design.
    ///
    /// Its title and sub-title seed the event details, and its stored scene
    /// document, if any, is loaded straight into the renderer.
    #[must_use]
    pub fn open(
        backend: B,
        notifier: Arc<dyn Notifier>,
        history_capacity: usize,
        design: CommunityDesign,
    ) -> Self {
        let mut session = Self::new(backend, notifier, history_capacity);

        if !design.title.is_empty() {
            session.details.set(DataField::Title, design.title.clone());
        }
        if let Some(sub_title) = design.sub_title.as_deref().filter(|s| !s.is_empty()) {
            session.details.set(DataField::Message, sub_title);
        }

        if let Some(json) = design.design_json_data.as_deref().filter(|j| !j.is_empty()) {
            if let Err(e) = session.sync.load_external_scene(json) {
                tracing::warn!("Failed to load initial design into editor: {}", e);
                session.store.notifier().notify(Notification::info(
                    "Load Failed",
                    "Could not load design into editor",
                ));
            }
        }

        tracing::info!(
            "Opened community design {:?}",
            design.community_designs_id
        );
        session.initial_design = Some(design);
        session.render();
        session
    }

    /// Use a specific platform's modifier key for shortcuts.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.shortcuts = ShortcutDispatcher::new(platform);
        self
    }

    /// The element store.
    #[must_use]
    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// Mutable access to the element store. Call [`Self::render`] afterwards.
    pub fn store_mut(&mut self) -> &mut ElementStore {
        &mut self.store
    }

    /// The canvas synchronizer.
    #[must_use]
    pub fn sync(&self) -> &CanvasSynchronizer<B> {
        &self.sync
    }

    /// Mutable access to the canvas synchronizer.
    pub fn sync_mut(&mut self) -> &mut CanvasSynchronizer<B> {
        &mut self.sync
    }

    /// Live event details.
    #[must_use]
    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    /// The community design this session was opened from.
    #[must_use]
    pub fn initial_design(&self) -> Option<&CommunityDesign> {
        self.initial_design.as_ref()
    }

    /// Notification sink shared with the store.
    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.store.notifier()
    }

    /// Push the current state to the renderer.
    pub fn render(&mut self) {
        self.sync.render(&self.store, &self.details);
    }

    /// Change one event detail. Bound elements pick it up on the next render.
    pub fn set_detail(&mut self, field: DataField, value: impl Into<String>) {
        self.details.set(field, value);
        self.render();
    }

    /// Replace every event detail.
    pub fn set_details(&mut self, details: EventDetails) {
        self.details = details;
        self.render();
    }

    /// Add an element with type defaults.
    pub fn add_element(&mut self, element_type: ElementType) -> ElementId {
        let id = self.store.add_element(element_type);
        self.render();
        id
    }

    /// Patch an element.
    pub fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> bool {
        let updated = self.store.update_element(id, patch);
        self.render();
        updated
    }

    /// Delete an element.
    pub fn delete_element(&mut self, id: &ElementId) -> bool {
        let deleted = self.store.delete_element(id);
        self.render();
        deleted
    }

    /// Duplicate an element.
    pub fn duplicate_element(&mut self, id: &ElementId) -> Option<ElementId> {
        let duplicate = self.store.duplicate_element(id);
        self.render();
        duplicate
    }

    /// Change the selection.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.store.select(id);
        self.sync.attach_selection(&self.store);
    }

    /// Undo the last mutation.
    pub fn undo(&mut self) -> bool {
        let undone = self.store.undo();
        self.render();
        undone
    }

    /// Redo the last undone mutation.
    pub fn redo(&mut self) -> bool {
        let redone = self.store.redo();
        self.render();
        redone
    }

    /// Route a key press through the undo/redo shortcuts.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<ShortcutAction> {
        let action = self.shortcuts.dispatch(&mut self.store, event);
        if action.is_some() {
            self.render();
        }
        action
    }

    /// The renderer reported the end of a drag.
    pub fn drag_end(&mut self, id: &ElementId, x: f32, y: f32) -> bool {
        let moved = self.sync.apply_drag(&mut self.store, id, x, y);
        self.render();
        moved
    }

    /// The renderer reported the end of a resize or rotate.
    pub fn transform_end(&mut self, id: &ElementId, geometry: NodeGeometry) -> bool {
        let transformed = self.sync.apply_transform(&mut self.store, id, geometry);
        self.render();
        transformed
    }

    /// Current zoom percentage.
    #[must_use]
    pub fn zoom(&self) -> u32 {
        self.sync.zoom()
    }

    /// Set the zoom within `policy`'s bounds.
    pub fn set_zoom(&mut self, zoom: u32, policy: ZoomPolicy) {
        self.sync.set_zoom(policy.clamp(zoom));
        self.render();
    }

    /// One zoom step in.
    pub fn zoom_in(&mut self, policy: ZoomPolicy) {
        let zoom = policy.zoom_in(self.zoom());
        self.sync.set_zoom(zoom);
        self.render();
    }

    /// One zoom step out.
    pub fn zoom_out(&mut self, policy: ZoomPolicy) {
        let zoom = policy.zoom_out(self.zoom());
        self.sync.set_zoom(zoom);
        self.render();
    }

    /// Show or hide the background grid.
    pub fn set_grid_visible(&mut self, visible: bool) {
        self.sync.set_grid_visible(visible);
        self.render();
    }

    /// Apply a template in two phases separated by a scheduler tick.
    ///
    /// The canvas is cleared and shown empty first, then populated with the
    /// template's elements. The zoom returns to its initial value and the
    /// element layer goes back to following the store.
    ///
    /// # Errors
    ///
    /// Returns an error if another template application is still in flight.
    pub async fn apply_template(&mut self, template: Template) -> StudioResult<()> {
        self.store.notifier().notify(Notification::info(
            "Applying Template",
            "Loading template elements...",
        ));

        self.store.begin_template(template)?;
        self.sync.set_zoom(INITIAL_ZOOM);
        self.sync.use_store_scene();
        self.render();

        tokio::task::yield_now().await;

        self.store.complete_template(&self.details)?;
        self.render();
        Ok(())
    }
}
