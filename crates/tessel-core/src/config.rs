//! Configuration for a Tessel UI host.

use crate::geometry::Size;
use crate::math::Vec4;

/// Configuration consumed when constructing a UI host.
#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Initial stage size in logical pixels.
    pub stage_size: Size<f32>,
    /// Push a scoped focus manager for every modal container pop-up.
    pub focus_management: bool,
    /// Color of the scrim placed under modal pop-ups (linear RGBA).
    pub overlay_color: Vec4,
    /// Filter directive handed to [`crate::logging::init_with_filter`].
    pub log_filter: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            stage_size: Size::new(800.0, 600.0),
            focus_management: true,
            overlay_color: Vec4::new(0.0, 0.0, 0.0, 0.5),
            log_filter: crate::logging::DEFAULT_FILTER.to_string(),
        }
    }
}

impl UiConfig {
    pub fn with_stage_size(mut self, width: f32, height: f32) -> Self {
        self.stage_size = Size::new(width, height);
        self
    }

    pub fn with_focus_management(mut self, enabled: bool) -> Self {
        self.focus_management = enabled;
        self
    }

    pub fn with_overlay_color(mut self, color: Vec4) -> Self {
        self.overlay_color = color;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}
