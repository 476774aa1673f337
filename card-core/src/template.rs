//! Templates and the two-phase template application protocol.
//!
//! Applying a template first clears the canvas, then, after the host has had
//! a chance to redraw, populates it from the template. [`TemplateApplication`]
//! tracks which phase is active so a second application cannot interleave
//! with one still in flight.

use serde::{Deserialize, Serialize};

use crate::color::{hex_colors, ColorScheme, DEFAULT_TEXT_COLOR, FALLBACK_PRIMARY, FALLBACK_SECONDARY};
use crate::element::{DesignElement, ElementKind};
use crate::error::{CardError, CardResult};
use crate::event::EventDetails;
use crate::store::CanvasSize;

/// Template-level styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStyle {
    /// CSS background (color or gradient).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Explicit accent color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    /// Explicit text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Brand label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Canvas size, kept raw so a malformed value does not reject the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_size: Option<serde_json::Value>,
}

/// A reusable starting design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Gallery category.
    #[serde(default)]
    pub category: String,
    /// Preview image.
    #[serde(default)]
    pub thumbnail: String,
    /// Whether the template is a paid one.
    #[serde(default)]
    pub premium: bool,
    /// Elements placed on the canvas when applied.
    #[serde(default)]
    pub elements: Vec<DesignElement>,
    /// Styling and color derivation inputs.
    #[serde(default)]
    pub style: TemplateStyle,
}

impl Template {
    /// The empty template that just clears the canvas.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            id: "blank".to_string(),
            name: "Blank Canvas".to_string(),
            category: "Basic".to_string(),
            thumbnail: String::new(),
            premium: false,
            elements: Vec::new(),
            style: TemplateStyle {
                background: Some("#ffffff".to_string()),
                canvas_size: Some(serde_json::json!({ "width": 800, "height": 1027 })),
                ..TemplateStyle::default()
            },
        }
    }

    /// Background string driving color derivation.
    ///
    /// A background element's own background wins over the template style.
    #[must_use]
    pub fn background(&self) -> Option<&str> {
        self.elements
            .iter()
            .find_map(|el| match &el.kind {
                ElementKind::Background { style } => style.background.as_deref(),
                _ => None,
            })
            .or(self.style.background.as_deref())
    }

    /// Parse the template's canvas size, if it declares one.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidCanvasSize`] when the field is present but
    /// is not a pair of positive dimensions.
    pub fn canvas_size(&self) -> CardResult<Option<CanvasSize>> {
        let Some(raw) = &self.style.canvas_size else {
            return Ok(None);
        };
        let size: CanvasSize = serde_json::from_value(raw.clone())
            .map_err(|e| CardError::InvalidCanvasSize(e.to_string()))?;
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(CardError::InvalidCanvasSize(format!(
                "{}x{}",
                size.width, size.height
            )));
        }
        Ok(Some(size))
    }

    /// Derive a color scheme from the template background.
    ///
    /// Gradients with at least two embedded hex colors provide primary and
    /// secondary; everything else uses the fixed fallback pair.
    #[must_use]
    pub fn derive_color_scheme(&self) -> ColorScheme {
        let background = self.background();
        let mut primary = FALLBACK_PRIMARY;
        let mut secondary = FALLBACK_SECONDARY;

        if let Some(bg) = background.filter(|bg| bg.contains("gradient")) {
            let colors = hex_colors(bg);
            if colors.len() >= 2 {
                primary = colors[0];
                secondary = colors[colors.len() - 1];
            }
        }

        ColorScheme {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            accent: self
                .style
                .accent
                .clone()
                .unwrap_or_else(|| primary.to_string()),
            background: background.unwrap_or("#ffffff").to_string(),
            text: self
                .style
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
        }
    }

    /// Copy the template's elements, pre-filling bound text from `details`.
    ///
    /// Only non-empty detail values replace the template's stored text.
    #[must_use]
    pub fn instantiate(&self, details: &EventDetails) -> Vec<DesignElement> {
        self.elements
            .iter()
            .cloned()
            .map(|mut element| {
                if let Some(field) = element.data_field {
                    let value = details.get(field);
                    if !value.is_empty() {
                        element.set_text(value);
                    }
                }
                element
            })
            .collect()
    }
}

/// Phase of a template application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplatePhase {
    /// No template has been applied.
    #[default]
    Idle,
    /// Canvas cleared; waiting for the deferred populate step.
    Clearing,
    /// Elements, canvas size and colors are being installed.
    Populating,
    /// The named template is fully applied.
    Done,
}

/// State machine guarding template application.
#[derive(Debug, Clone, Default)]
pub struct TemplateApplication {
    phase: TemplatePhase,
    pending: Option<Template>,
    applied: Option<String>,
}

impl TemplateApplication {
    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> &TemplatePhase {
        &self.phase
    }

    /// Whether an application is between clearing and completion.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        matches!(self.phase, TemplatePhase::Clearing | TemplatePhase::Populating)
    }

    /// Id of the most recently completed template.
    #[must_use]
    pub fn applied(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    /// Record a template id as applied without running the protocol.
    pub fn mark_applied(&mut self, template_id: Option<String>) {
        self.applied = template_id;
    }

    /// Enter the clearing phase.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::TemplateInFlight`] if another application has not
    /// completed.
    pub fn begin(&mut self, template: Template) -> CardResult<()> {
        if self.in_flight() {
            let id = self
                .pending
                .as_ref()
                .map_or_else(String::new, |t| t.id.clone());
            return Err(CardError::TemplateInFlight(id));
        }
        tracing::debug!("Template {} entering clearing phase", template.id);
        self.pending = Some(template);
        self.phase = TemplatePhase::Clearing;
        Ok(())
    }

    /// Move to the populating phase and hand back the pending template.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::NoTemplatePending`] unless the machine is clearing.
    pub fn populate(&mut self) -> CardResult<Template> {
        if self.phase != TemplatePhase::Clearing {
            return Err(CardError::NoTemplatePending);
        }
        let template = self.pending.take().ok_or(CardError::NoTemplatePending)?;
        tracing::debug!("Template {} populating", template.id);
        self.phase = TemplatePhase::Populating;
        Ok(template)
    }

    /// Mark the populating template as done.
    pub fn finish(&mut self, template_id: &str) {
        self.phase = TemplatePhase::Done;
        self.applied = Some(template_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{BackgroundStyle, TextContent, TextStyle};
    use crate::event::DataField;

    fn gradient_template() -> Template {
        serde_json::from_str(
            r##"{
                "id": "tech-launch",
                "name": "Tech Launch",
                "category": "Business",
                "thumbnail": "/thumbs/tech.png",
                "premium": true,
                "elements": [
                    {"id":"bg","type":"background","x":0,"y":0,"width":800,"height":1027,"zIndex":0,
                     "style":{"background":"linear-gradient(135deg, #0f172a 0%, #1e293b 50%, #334155 100%)"}},
                    {"id":"title","type":"text","x":100,"y":200,"width":600,"height":80,"zIndex":1,
                     "dataField":"title","content":{"text":"LAUNCH"},"style":{"fontSize":48}}
                ],
                "style": {"background":"#ffffff","accent":"#22d3ee","brand":"Tech"}
            }"##,
        )
        .expect("template json")
    }

    #[test]
    fn test_background_element_wins_over_style() {
        let template = gradient_template();
        let scheme = template.derive_color_scheme();
        assert_eq!(scheme.primary, "#0f172a");
        assert_eq!(scheme.secondary, "#334155");
        assert_eq!(scheme.accent, "#22d3ee");
        assert!(scheme.background.starts_with("linear-gradient"));
        assert_eq!(scheme.text, DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn test_solid_background_uses_fallback_pair() {
        let mut template = Template::blank();
        template.style.background = Some("#fafafa".to_string());
        let scheme = template.derive_color_scheme();
        assert_eq!(scheme.primary, FALLBACK_PRIMARY);
        assert_eq!(scheme.secondary, FALLBACK_SECONDARY);
        assert_eq!(scheme.accent, FALLBACK_PRIMARY);
        assert_eq!(scheme.background, "#fafafa");
    }

    #[test]
    fn test_instantiate_prefills_only_non_empty_details() {
        let template = gradient_template();
        let mut details = EventDetails::default();
        let elements = template.instantiate(&details);
        assert_eq!(elements[1].effective_text(&details), Some("LAUNCH"));

        details.set(DataField::Title, "Sarah's Party");
        let elements = template.instantiate(&details);
        match &elements[1].kind {
            ElementKind::Text { content, .. } => assert_eq!(content.text, "Sarah's Party"),
            other => panic!("expected text, got {other:?}"),
        }
        // the template itself is untouched
        match &template.elements[1].kind {
            ElementKind::Text { content, .. } => assert_eq!(content.text, "LAUNCH"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_canvas_size_parsing() {
        let mut template = Template::blank();
        let size = template.canvas_size().expect("valid").expect("present");
        assert!((size.width - 800.0).abs() < f32::EPSILON);
        assert!((size.height - 1027.0).abs() < f32::EPSILON);

        template.style.canvas_size = Some(serde_json::json!("big"));
        assert!(matches!(
            template.canvas_size(),
            Err(CardError::InvalidCanvasSize(_))
        ));

        template.style.canvas_size = Some(serde_json::json!({"width": 0, "height": 10}));
        assert!(template.canvas_size().is_err());

        template.style.canvas_size = None;
        assert!(template.canvas_size().expect("absent").is_none());
    }

    #[test]
    fn test_state_machine_rejects_overlap() {
        let mut machine = TemplateApplication::default();
        assert_eq!(machine.phase(), &TemplatePhase::Idle);
        machine.begin(Template::blank()).expect("begin");
        assert!(machine.in_flight());

        let err = machine.begin(gradient_template()).expect_err("overlap");
        assert!(matches!(err, CardError::TemplateInFlight(id) if id == "blank"));

        let template = machine.populate().expect("populate");
        assert_eq!(machine.phase(), &TemplatePhase::Populating);
        machine.finish(&template.id);
        assert_eq!(machine.phase(), &TemplatePhase::Done);
        assert_eq!(machine.applied(), Some("blank"));
        assert!(matches!(machine.populate(), Err(CardError::NoTemplatePending)));
    }

    #[test]
    fn test_text_element_helpers_used_by_templates() {
        let element = DesignElement::new(ElementKind::Text {
            content: TextContent::default(),
            style: TextStyle::default(),
        });
        let template = Template {
            elements: vec![
                element,
                DesignElement::new(ElementKind::Background {
                    style: BackgroundStyle::default(),
                }),
            ],
            ..Template::blank()
        };
        // background element without a background falls through to the style
        assert_eq!(template.background(), Some("#ffffff"));
    }
}
