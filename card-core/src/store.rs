//! The element store: single owner of a design session's mutable state.
//!
//! Every mutating operation snapshots the element collection into the
//! [`HistoryManager`] before it changes anything, so undo/redo ordering is
//! always the order the mutations were made in. Operations on an id that is
//! not in the collection do nothing at all.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::ColorScheme;
use crate::element::{
    BackgroundStyle, BorderStyle, DesignElement, ElementId, ElementKind, ElementPatch,
    ElementType, ImageContent, ImageStyle, LogoContent, ShapeContent, ShapeKind, ShapeStyle,
    TextAlign, TextContent, TextStyle, Transform, DEFAULT_IMAGE_SRC, DEFAULT_LOGO_TEXT,
    DEFAULT_TEXT,
};
use crate::error::CardResult;
use crate::event::EventDetails;
use crate::history::{HistoryManager, DEFAULT_HISTORY_CAPACITY};
use crate::notify::{Notification, Notifier};
use crate::template::{Template, TemplateApplication, TemplatePhase};

/// Default canvas width in design-space pixels.
pub const DEFAULT_CANVAS_WIDTH: f32 = 800.0;

/// Default canvas height in design-space pixels.
pub const DEFAULT_CANVAS_HEIGHT: f32 = 1027.0;

/// Offset applied to both axes when duplicating an element.
pub const DUPLICATE_OFFSET: f32 = 20.0;

/// Canvas dimensions in design-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

/// Editor state for one design session.
#[derive(Debug)]
pub struct ElementStore {
    elements: Vec<DesignElement>,
    selected: Option<ElementId>,
    color_scheme: ColorScheme,
    canvas_size: CanvasSize,
    history: HistoryManager<Vec<DesignElement>>,
    template: TemplateApplication,
    notifier: Arc<dyn Notifier>,
}

impl ElementStore {
    /// Create an empty store with the default color scheme and canvas.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_history_capacity(notifier, DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty store keeping `capacity` undo steps.
    #[must_use]
    pub fn with_history_capacity(notifier: Arc<dyn Notifier>, capacity: usize) -> Self {
        Self {
            elements: Vec::new(),
            selected: None,
            color_scheme: ColorScheme::default(),
            canvas_size: CanvasSize::default(),
            history: HistoryManager::new(capacity),
            template: TemplateApplication::default(),
            notifier,
        }
    }

    /// Current elements in collection order.
    #[must_use]
    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    /// Look up an element by id.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&DesignElement> {
        self.elements.iter().find(|el| &el.id == id)
    }

    /// Selected element id.
    #[must_use]
    pub fn selected(&self) -> Option<&ElementId> {
        self.selected.as_ref()
    }

    /// Selected element, if it is in the collection.
    #[must_use]
    pub fn selected_element(&self) -> Option<&DesignElement> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Active color scheme.
    #[must_use]
    pub fn color_scheme(&self) -> &ColorScheme {
        &self.color_scheme
    }

    /// Canvas dimensions.
    #[must_use]
    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas_size
    }

    /// Undo/redo history.
    #[must_use]
    pub fn history(&self) -> &HistoryManager<Vec<DesignElement>> {
        &self.history
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Id of the last fully applied template.
    #[must_use]
    pub fn applied_template(&self) -> Option<&str> {
        self.template.applied()
    }

    /// Phase of the template application protocol.
    #[must_use]
    pub fn template_phase(&self) -> &TemplatePhase {
        self.template.phase()
    }

    /// Notification sink shared with the rest of the session.
    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    fn record_history(&mut self) {
        self.history.push(self.elements.clone());
        tracing::debug!(
            "History snapshot recorded ({} undo steps)",
            self.history.undo_len()
        );
    }

    fn position_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|el| &el.id == id)
    }

    fn random_origin(&self) -> (f32, f32) {
        let mut rng = rand::thread_rng();
        let max_x = self.canvas_size.width - 200.0;
        let max_y = self.canvas_size.height - 100.0;
        let x = if max_x > 0.0 { rng.gen_range(0.0..max_x) } else { 0.0 };
        let y = if max_y > 0.0 { rng.gen_range(0.0..max_y) } else { 0.0 };
        (x, y)
    }

    /// Content and style a new element of `element_type` gets from the
    /// active color scheme.
    #[must_use]
    pub fn default_kind(&self, element_type: ElementType) -> ElementKind {
        let scheme = &self.color_scheme;
        match element_type {
            ElementType::Text => ElementKind::Text {
                content: TextContent {
                    text: DEFAULT_TEXT.to_string(),
                },
                style: TextStyle {
                    font_size: Some(18.0),
                    font_family: Some("Inter".to_string()),
                    font_weight: Some("normal".to_string()),
                    font_style: None,
                    color: Some(scheme.text.clone()),
                    text_align: TextAlign::Left,
                },
            },
            ElementType::Image => ElementKind::Image {
                content: ImageContent {
                    src: DEFAULT_IMAGE_SRC.to_string(),
                },
                style: ImageStyle::default(),
            },
            ElementType::Shape => ElementKind::Shape {
                content: ShapeContent {
                    shape: ShapeKind::Rectangle,
                },
                style: ShapeStyle {
                    background_color: Some(scheme.primary.clone()),
                    border_radius: 4.0,
                },
            },
            ElementType::Background => ElementKind::Background {
                style: BackgroundStyle {
                    background: Some(scheme.background.clone()),
                },
            },
            ElementType::Logo => ElementKind::Logo {
                content: LogoContent {
                    text: Some(DEFAULT_LOGO_TEXT.to_string()),
                    emblem: None,
                },
                style: TextStyle {
                    font_size: Some(20.0),
                    color: Some(scheme.primary.clone()),
                    ..TextStyle::default()
                },
            },
            ElementType::Border => ElementKind::Border {
                style: BorderStyle {
                    border_color: Some(scheme.accent.clone()),
                    border_width: Some(2.0),
                    border_radius: 0.0,
                },
            },
        }
    }

    /// Add an element of `element_type` with scheme-derived defaults.
    ///
    /// The element lands at a random position inside the canvas, is painted
    /// above everything counted so far, and becomes the selection.
    pub fn add_element(&mut self, element_type: ElementType) -> ElementId {
        let kind = self.default_kind(element_type);
        self.add_element_with(kind)
    }

    /// Add an element with caller-supplied content and style.
    pub fn add_element_with(&mut self, kind: ElementKind) -> ElementId {
        let element_type = kind.element_type();
        let (width, height) = element_type.default_size();
        let (x, y) = self.random_origin();
        let z_index = i32::try_from(self.elements.len() + 1).unwrap_or(i32::MAX);

        let element = DesignElement::new(kind).with_transform(Transform {
            x,
            y,
            width,
            height,
            rotation: 0.0,
            opacity: 1.0,
            z_index,
        });
        let id = element.id.clone();

        self.record_history();
        self.elements.push(element);
        self.selected = Some(id.clone());
        tracing::info!("Added {} element {}", element_type, id);

        self.notifier.notify(Notification::info(
            "Element Added",
            format!("{} element added to canvas", element_type.label()),
        ));
        id
    }

    /// Shallow-merge `patch` into the element with `id`.
    ///
    /// Returns `false`, recording nothing, if the id is absent.
    pub fn update_element(&mut self, id: &ElementId, patch: ElementPatch) -> bool {
        let Some(index) = self.position_of(id) else {
            tracing::debug!("Update ignored for unknown element {}", id);
            return false;
        };
        self.record_history();
        patch.apply_to(&mut self.elements[index]);
        true
    }

    /// Remove the element with `id`, clearing the selection if it was selected.
    pub fn delete_element(&mut self, id: &ElementId) -> bool {
        let Some(index) = self.position_of(id) else {
            tracing::debug!("Delete ignored for unknown element {}", id);
            return false;
        };
        self.record_history();
        self.elements.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        tracing::info!("Deleted element {}", id);

        self.notifier.notify(Notification::info(
            "Element Deleted",
            "Element removed from canvas",
        ));
        true
    }

    /// Clone the element with `id` under a fresh id, offset by
    /// [`DUPLICATE_OFFSET`] and painted above every existing element.
    ///
    /// The duplicate becomes the selection.
    pub fn duplicate_element(&mut self, id: &ElementId) -> Option<ElementId> {
        let source = self.get(id)?;
        let top = self
            .elements
            .iter()
            .map(|el| el.transform.z_index)
            .max()
            .unwrap_or(0);

        let mut duplicate = source.clone();
        duplicate.id = ElementId::new();
        duplicate.transform.x += DUPLICATE_OFFSET;
        duplicate.transform.y += DUPLICATE_OFFSET;
        duplicate.transform.z_index = top.saturating_add(1);
        let new_id = duplicate.id.clone();

        self.record_history();
        self.elements.push(duplicate);
        self.selected = Some(new_id.clone());
        tracing::info!("Duplicated element {} as {}", id, new_id);
        Some(new_id)
    }

    /// Replace the whole collection, recording the previous one.
    pub fn set_elements_with_history(&mut self, elements: Vec<DesignElement>) {
        self.record_history();
        self.elements = elements;
    }

    /// Replace the collection with `updater(current)`, recording the
    /// previous one.
    pub fn update_elements_with_history<F>(&mut self, updater: F)
    where
        F: FnOnce(Vec<DesignElement>) -> Vec<DesignElement>,
    {
        self.record_history();
        let current = std::mem::take(&mut self.elements);
        self.elements = updater(current);
    }

    /// Restore the most recent snapshot. Selection is left alone.
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.elements.clone();
        match self.history.undo(current) {
            Some(previous) => {
                self.elements = previous;
                tracing::debug!("Undo ({} steps left)", self.history.undo_len());
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone state.
    ///
    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let current = self.elements.clone();
        match self.history.redo(current) {
            Some(next) => {
                self.elements = next;
                tracing::debug!("Redo ({} steps left)", self.history.redo_len());
                true
            }
            None => false,
        }
    }

    /// Change the selection. Not recorded in history.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id;
    }

    /// Replace the color scheme. Not recorded in history.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.color_scheme = scheme;
    }

    /// First phase of template application: clear selection and elements.
    ///
    /// Records one history entry holding the collection before the clear.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CardError::TemplateInFlight`] if a previous template
    /// has not been completed.
    pub fn begin_template(&mut self, template: Template) -> CardResult<()> {
        let id = template.id.clone();
        self.template.begin(template)?;
        self.record_history();
        self.selected = None;
        self.elements.clear();
        tracing::info!("Applying template {}", id);
        Ok(())
    }

    /// Second phase of template application: install the pending template's
    /// elements, canvas size and derived colors.
    ///
    /// A malformed canvas size is logged and skipped; elements and colors
    /// still apply.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CardError::NoTemplatePending`] if
    /// [`Self::begin_template`] was not called first.
    pub fn complete_template(&mut self, details: &EventDetails) -> CardResult<()> {
        let template = self.template.populate()?;

        self.elements = template.instantiate(details);

        match template.canvas_size() {
            Ok(Some(size)) => self.canvas_size = size,
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring canvas size of template {}: {}", template.id, e),
        }

        self.color_scheme = template.derive_color_scheme();
        self.template.finish(&template.id);
        tracing::info!(
            "Template {} applied with {} elements",
            template.id,
            self.elements.len()
        );

        self.notifier.notify(Notification::info(
            "Template Applied",
            format!("{} template loaded successfully", template.name),
        ));
        Ok(())
    }

    /// Run both template phases back to back.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CardError::TemplateInFlight`] if a previous template
    /// has not been completed.
    pub fn apply_template(&mut self, template: Template, details: &EventDetails) -> CardResult<()> {
        self.begin_template(template)?;
        self.complete_template(details)
    }

    /// Record which template the current design came from, without applying it.
    pub fn set_applied_template(&mut self, template_id: Option<String>) {
        self.template.mark_applied(template_id);
    }
}
