//! Zoom stepping.
//!
//! Zoom is a percentage; design-space geometry is multiplied by
//! `zoom / 100` before it reaches the renderer. Two stepping policies are in
//! use: the toolbar buttons and the settings slider.

/// Zoom a session opens at, and returns to after applying a template.
pub const INITIAL_ZOOM: u32 = 50;

/// Step size and bounds for a zoom control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomPolicy {
    /// Change per step, in percent.
    pub step: u32,
    /// Lowest allowed zoom.
    pub min: u32,
    /// Highest allowed zoom.
    pub max: u32,
}

impl ZoomPolicy {
    /// Toolbar in/out buttons.
    pub const TOOLBAR: Self = Self {
        step: 25,
        min: 25,
        max: 200,
    };

    /// Settings panel slider.
    pub const SLIDER: Self = Self {
        step: 10,
        min: 50,
        max: 200,
    };

    /// One step in.
    #[must_use]
    pub fn zoom_in(&self, current: u32) -> u32 {
        current.saturating_add(self.step).min(self.max)
    }

    /// One step out.
    #[must_use]
    pub fn zoom_out(&self, current: u32) -> u32 {
        current.saturating_sub(self.step).max(self.min)
    }

    /// Clamp an arbitrary zoom into range.
    #[must_use]
    pub fn clamp(&self, zoom: u32) -> u32 {
        zoom.clamp(self.min, self.max)
    }
}

/// Multiplier applied to design-space geometry at `zoom` percent.
#[must_use]
pub fn scale_factor(zoom: u32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let zoom = zoom as f32;
    zoom / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolbar_stepping() {
        let policy = ZoomPolicy::TOOLBAR;
        assert_eq!(policy.zoom_in(INITIAL_ZOOM), 75);
        assert_eq!(policy.zoom_in(190), 200);
        assert_eq!(policy.zoom_out(40), 25);
        assert_eq!(policy.zoom_out(25), 25);
    }

    #[test]
    fn test_slider_bounds() {
        let policy = ZoomPolicy::SLIDER;
        assert_eq!(policy.zoom_out(INITIAL_ZOOM), 50);
        assert_eq!(policy.zoom_in(INITIAL_ZOOM), 60);
        assert_eq!(policy.clamp(25), 50);
        assert_eq!(policy.clamp(400), 200);
    }

    #[test]
    fn test_scale_factor() {
        assert!((scale_factor(50) - 0.5).abs() < f32::EPSILON);
        assert!((scale_factor(200) - 2.0).abs() < f32::EPSILON);
    }
}
