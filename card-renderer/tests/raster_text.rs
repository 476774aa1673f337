//! Integration tests for text in export rasters (card-renderer).
//!
//! Text, logos and placeholder labels must survive the SVG to PNG step on a
//! host without any particular fonts installed.

use std::sync::Arc;

use card_core::{ElementId, ElementStore, ElementType, EventDetails, RecordingNotifier, TextAlign};
use card_renderer::{CanvasSynchronizer, DrawKind, DrawNode, Layer, Paint, RenderBackend, SvgStage};

// ============================================================================
// Helpers
// ============================================================================

fn white_background(width: f32, height: f32) -> DrawNode {
    DrawNode::new(
        ElementId::from("bg"),
        DrawKind::Rect {
            fill: Paint::Solid {
                color: "#ffffff".to_string(),
            },
            stroke: None,
            corner_radius: 0.0,
        },
    )
    .with_bounds(0.0, 0.0, width, height)
}

fn headline(font_family: &str) -> DrawNode {
    DrawNode::new(
        ElementId::from("headline"),
        DrawKind::Text {
            text: "SARAH'S PARTY".to_string(),
            font_size: 40.0,
            font_family: font_family.to_string(),
            bold: true,
            italic: false,
            fill: "#000000".to_string(),
            align: TextAlign::Center,
        },
    )
    .with_bounds(0.0, 0.0, 200.0, 100.0)
}

fn dark_pixels(png: &[u8]) -> usize {
    image::load_from_memory(png)
        .expect("decode png")
        .to_luma8()
        .pixels()
        .filter(|p| p.0[0] < 128)
        .count()
}

// ============================================================================
// Stage rasterization
// ============================================================================

#[test]
fn test_text_node_reaches_raster() {
    let mut stage = SvgStage::new(200.0, 100.0);
    stage.mount(Layer::Background, vec![white_background(200.0, 100.0)]);
    let empty = stage.rasterize(1.0).expect("rasterize empty");
    assert_eq!(dark_pixels(&empty), 0);

    stage.mount(Layer::Elements, vec![headline("sans-serif")]);
    let with_text = stage.rasterize(1.0).expect("rasterize text");

    assert_ne!(empty, with_text);
    assert!(dark_pixels(&with_text) > 50);
}

#[test]
fn test_unknown_font_family_falls_back() {
    let mut stage = SvgStage::new(200.0, 100.0);
    stage.mount(Layer::Background, vec![white_background(200.0, 100.0)]);
    stage.mount(Layer::Elements, vec![headline("No Such Typeface")]);

    let png = stage.rasterize(1.0).expect("rasterize");

    assert!(dark_pixels(&png) > 50);
}

// ============================================================================
// Synchronized export
// ============================================================================

#[test]
fn test_store_text_element_appears_in_export() {
    let mut store = ElementStore::new(Arc::new(RecordingNotifier::new()));
    let details = EventDetails::starter();
    let mut sync = CanvasSynchronizer::new(SvgStage::new(1.0, 1.0));

    sync.render(&store, &details);
    let blank = sync.rasterize_for_export(2.0).expect("blank raster");

    store.add_element(ElementType::Text);
    sync.render(&store, &details);
    let with_text = sync.rasterize_for_export(2.0).expect("text raster");

    assert!(dark_pixels(with_text.png()) > dark_pixels(blank.png()));
}
