//! Color schemes and background fill parsing.
//!
//! Backgrounds are CSS strings. A string mentioning `gradient` that embeds at
//! least two `#rrggbb` colors is treated as a two-stop linear gradient
//! between its first and last color; anything else is a solid fill.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fallback primary color when a template background yields no gradient.
pub const FALLBACK_PRIMARY: &str = "#667eea";

/// Fallback secondary color when a template background yields no gradient.
pub const FALLBACK_SECONDARY: &str = "#764ba2";

/// Default text color.
pub const DEFAULT_TEXT_COLOR: &str = "#1f2937";

/// Default solid background.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[0-9a-fA-F]{6}").expect("hex color regex"));

/// Palette driving element defaults and the canvas background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    /// Primary brand color.
    pub primary: String,
    /// Secondary brand color.
    pub secondary: String,
    /// Accent color (borders).
    pub accent: String,
    /// Canvas background; may be a gradient string.
    pub background: String,
    /// Text color.
    pub text: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            primary: "#6366f1".to_string(),
            secondary: "#8b5cf6".to_string(),
            accent: "#06b6d4".to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            text: DEFAULT_TEXT_COLOR.to_string(),
        }
    }
}

/// Extract every embedded `#rrggbb` color, in order.
#[must_use]
pub fn hex_colors(input: &str) -> Vec<&str> {
    HEX_COLOR.find_iter(input).map(|m| m.as_str()).collect()
}

/// Resolved fill for a background string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BackgroundFill {
    /// Single color.
    Solid {
        /// CSS color.
        color: String,
    },
    /// Two-stop linear gradient spanning the bounding box diagonal.
    LinearGradient {
        /// Color at offset 0.
        start: String,
        /// Color at offset 1.
        end: String,
    },
}

impl BackgroundFill {
    /// Interpret a CSS background string.
    ///
    /// Solid fills use the first embedded hex color, else the literal string,
    /// else white.
    #[must_use]
    pub fn parse(background: &str) -> Self {
        let colors = hex_colors(background);
        if background.contains("gradient") && colors.len() >= 2 {
            return Self::LinearGradient {
                start: colors[0].to_string(),
                end: colors[colors.len() - 1].to_string(),
            };
        }

        let color = colors
            .first()
            .map(|c| (*c).to_string())
            .or_else(|| {
                let trimmed = background.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string());
        Self::Solid { color }
    }
}
