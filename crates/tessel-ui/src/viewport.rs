//! Scrollable viewport bounds negotiation.
//!
//! A viewport is the clipped, visible window onto a larger content area. Each
//! validation pass builds a [`ViewPortBounds`] from the viewport's current
//! properties and resolves it into a [`LayoutBoundsResult`], either through a
//! pluggable [`Layout`] or by scanning the children's frames (manual layout).
//!
//! ```
//! use tessel_core::geometry::{Rect, Size};
//! use tessel_core::math::Vec4;
//! use tessel_ui::scene::{Quad, SceneGraph};
//! use tessel_ui::viewport::{resolve_bounds, ViewPortBounds};
//!
//! let mut scene = SceneGraph::new(Size::new(800.0, 600.0));
//! let item = scene.create(Quad::new(Vec4::ONE));
//! scene.set_frame(item, Rect::new(-10.0, 0.0, 50.0, 20.0)).unwrap();
//!
//! let bounds = ViewPortBounds { max_width: 30.0, ..Default::default() };
//! let result = resolve_bounds(&mut scene, &bounds, &[item], None).unwrap();
//! assert_eq!(result.content_x, -10.0);
//! assert_eq!(result.view_port_width, 30.0);
//! ```

use bitflags::bitflags;
use tessel_core::geometry::Rect;
use tessel_core::math::Vec2;
use tessel_core::profiling::profile_function;

use crate::layout::Layout;
use crate::scene::{NodeId, SceneGraph, SceneResult};

/// Constraints handed to a layout for one validation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPortBounds {
    pub x: f32,
    pub y: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
    /// `None` means the width is measured.
    pub explicit_width: Option<f32>,
    /// `None` means the height is measured.
    pub explicit_height: Option<f32>,
    pub min_width: f32,
    pub min_height: f32,
    pub max_width: f32,
    pub max_height: f32,
}

impl Default for ViewPortBounds {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
            explicit_width: None,
            explicit_height: None,
            min_width: 0.0,
            min_height: 0.0,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        }
    }
}

impl ViewPortBounds {
    /// Clamp a measured width into `[min_width, max_width]`.
    pub fn clamp_width(&self, width: f32) -> f32 {
        width.max(self.min_width).min(self.max_width)
    }

    /// Clamp a measured height into `[min_height, max_height]`.
    pub fn clamp_height(&self, height: f32) -> f32 {
        height.max(self.min_height).min(self.max_height)
    }

    /// Visible width: the explicit width if set, otherwise the clamped measure.
    pub fn resolve_width(&self, measured: f32) -> f32 {
        self.explicit_width
            .unwrap_or_else(|| self.clamp_width(measured))
    }

    /// Visible height: the explicit height if set, otherwise the clamped measure.
    pub fn resolve_height(&self, measured: f32) -> f32 {
        self.explicit_height
            .unwrap_or_else(|| self.clamp_height(measured))
    }
}

/// Where content sits and how much of it is visible.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutBoundsResult {
    /// Left edge of the content. Negative when children extend left of the origin.
    pub content_x: f32,
    /// Top edge of the content. Negative when children extend above the origin.
    pub content_y: f32,
    pub content_width: f32,
    pub content_height: f32,
    pub view_port_width: f32,
    pub view_port_height: f32,
}

/// Errors raised when configuring a viewport.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewPortError {
    #[error("{property} must be a non-negative number, got {value}")]
    InvalidDimension { property: &'static str, value: f32 },
    #[error("{property} of {min} exceeds the maximum of {max}")]
    MinExceedsMax {
        property: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{property} must be a number, got {value}")]
    InvalidScrollPosition { property: &'static str, value: f32 },
}

/// Result type for viewport configuration.
pub type ViewPortResult<T> = Result<T, ViewPortError>;

/// Resolve content and viewport bounds for `items`.
///
/// With a layout, its result is adopted verbatim. Without one, the items'
/// frames are scanned (see [`manual_layout`]).
pub fn resolve_bounds(
    scene: &mut SceneGraph,
    bounds: &ViewPortBounds,
    items: &[NodeId],
    layout: Option<&mut dyn Layout>,
) -> SceneResult<LayoutBoundsResult> {
    profile_function!();
    match layout {
        Some(layout) => layout.layout(scene, items, bounds),
        None => manual_layout(scene, bounds, items),
    }
}

/// Measure manually positioned children.
///
/// Every item is validated first. The scan starts from `(0, 0)`, so content
/// only reports a negative origin when some item extends above or left of
/// it. An item whose x (or y) is NaN is skipped for that axis's accumulation
/// but still validated.
pub fn manual_layout(
    scene: &mut SceneGraph,
    bounds: &ViewPortBounds,
    items: &[NodeId],
) -> SceneResult<LayoutBoundsResult> {
    let mut min_x = 0.0_f32;
    let mut min_y = 0.0_f32;
    let mut max_x = 0.0_f32;
    let mut max_y = 0.0_f32;

    for &item in items {
        scene.validate(item)?;
        let frame = scene.frame(item)?;
        if !frame.x.is_nan() {
            min_x = min_x.min(frame.x);
            let right = frame.right();
            if !right.is_nan() {
                max_x = max_x.max(right);
            }
        }
        if !frame.y.is_nan() {
            min_y = min_y.min(frame.y);
            let bottom = frame.bottom();
            if !bottom.is_nan() {
                max_y = max_y.max(bottom);
            }
        }
    }

    let content_width = bounds.clamp_width(max_x - min_x);
    let content_height = bounds.clamp_height(max_y - min_y);

    Ok(LayoutBoundsResult {
        content_x: min_x,
        content_y: min_y,
        content_width,
        content_height,
        view_port_width: bounds.explicit_width.unwrap_or(content_width),
        view_port_height: bounds.explicit_height.unwrap_or(content_height),
    })
}

bitflags! {
    /// Which aspects of a viewport need revalidation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Invalidation: u8 {
        /// Explicit, minimum or maximum size changed.
        const SIZE   = 1 << 0;
        /// Scroll position changed.
        const SCROLL = 1 << 1;
        /// Layout algorithm or children changed.
        const LAYOUT = 1 << 2;

        const ALL = Self::SIZE.bits() | Self::SCROLL.bits() | Self::LAYOUT.bits();
    }
}

/// A scrollable viewport whose content is arranged by an optional layout.
///
/// Setters reject invalid numbers immediately, so a broken constraint never
/// reaches the resolver.
pub struct LayoutViewPort {
    explicit_width: Option<f32>,
    explicit_height: Option<f32>,
    min_visible_width: f32,
    min_visible_height: f32,
    max_visible_width: f32,
    max_visible_height: f32,
    scroll_position: Vec2,
    layout: Option<Box<dyn Layout>>,
    invalid: Invalidation,
    result: LayoutBoundsResult,
}

impl Default for LayoutViewPort {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutViewPort {
    pub fn new() -> Self {
        Self {
            explicit_width: None,
            explicit_height: None,
            min_visible_width: 0.0,
            min_visible_height: 0.0,
            max_visible_width: f32::INFINITY,
            max_visible_height: f32::INFINITY,
            scroll_position: Vec2::ZERO,
            layout: None,
            invalid: Invalidation::ALL,
            result: LayoutBoundsResult::default(),
        }
    }

    pub fn with_layout(mut self, layout: impl Layout + 'static) -> Self {
        self.set_layout(Some(Box::new(layout)));
        self
    }

    // Invalidation

    pub fn invalidate(&mut self, flags: Invalidation) {
        self.invalid |= flags;
    }

    pub fn is_invalid(&self, flags: Invalidation) -> bool {
        self.invalid.intersects(flags)
    }

    // Size constraints

    pub fn explicit_visible_width(&self) -> Option<f32> {
        self.explicit_width
    }

    pub fn set_explicit_visible_width(&mut self, width: Option<f32>) -> ViewPortResult<()> {
        if let Some(value) = width {
            check_dimension("explicit_visible_width", value)?;
        }
        if self.explicit_width != width {
            self.explicit_width = width;
            self.invalidate(Invalidation::SIZE);
        }
        Ok(())
    }

    pub fn explicit_visible_height(&self) -> Option<f32> {
        self.explicit_height
    }

    pub fn set_explicit_visible_height(&mut self, height: Option<f32>) -> ViewPortResult<()> {
        if let Some(value) = height {
            check_dimension("explicit_visible_height", value)?;
        }
        if self.explicit_height != height {
            self.explicit_height = height;
            self.invalidate(Invalidation::SIZE);
        }
        Ok(())
    }

    pub fn min_visible_width(&self) -> f32 {
        self.min_visible_width
    }

    pub fn set_min_visible_width(&mut self, value: f32) -> ViewPortResult<()> {
        check_dimension("min_visible_width", value)?;
        check_order("min_visible_width", value, self.max_visible_width)?;
        if self.min_visible_width != value {
            self.min_visible_width = value;
            self.invalidate(Invalidation::SIZE);
        }
        Ok(())
    }

    pub fn max_visible_width(&self) -> f32 {
        self.max_visible_width
    }

    pub fn set_max_visible_width(&mut self, value: f32) -> ViewPortResult<()> {
        check_dimension("max_visible_width", value)?;
        check_order("min_visible_width", self.min_visible_width, value)?;
        if self.max_visible_width != value {
            self.max_visible_width = value;
            self.invalidate(Invalidation::SIZE);
        }
        Ok(())
    }

    pub fn min_visible_height(&self) -> f32 {
        self.min_visible_height
    }

    pub fn set_min_visible_height(&mut self, value: f32) -> ViewPortResult<()> {
        check_dimension("min_visible_height", value)?;
        check_order("min_visible_height", value, self.max_visible_height)?;
        if self.min_visible_height != value {
            self.min_visible_height = value;
            self.invalidate(Invalidation::SIZE);
        }
        Ok(())
    }

    pub fn max_visible_height(&self) -> f32 {
        self.max_visible_height
    }

    pub fn set_max_visible_height(&mut self, value: f32) -> ViewPortResult<()> {
        check_dimension("max_visible_height", value)?;
        check_order("min_visible_height", self.min_visible_height, value)?;
        if self.max_visible_height != value {
            self.max_visible_height = value;
            self.invalidate(Invalidation::SIZE);
        }
        Ok(())
    }

    // Scrolling

    pub fn scroll_position(&self) -> Vec2 {
        self.scroll_position
    }

    pub fn set_scroll_position(&mut self, x: f32, y: f32) -> ViewPortResult<()> {
        if x.is_nan() {
            return Err(ViewPortError::InvalidScrollPosition {
                property: "horizontal_scroll_position",
                value: x,
            });
        }
        if y.is_nan() {
            return Err(ViewPortError::InvalidScrollPosition {
                property: "vertical_scroll_position",
                value: y,
            });
        }
        let position = Vec2::new(x, y);
        if self.scroll_position != position {
            self.scroll_position = position;
            self.invalidate(Invalidation::SCROLL);
        }
        Ok(())
    }

    // Layout

    pub fn layout(&self) -> Option<&dyn Layout> {
        self.layout.as_deref()
    }

    pub fn set_layout(&mut self, layout: Option<Box<dyn Layout>>) {
        self.layout = layout;
        self.invalidate(Invalidation::LAYOUT);
    }

    /// Constraints for the next validation pass, built from current properties.
    pub fn bounds(&self) -> ViewPortBounds {
        ViewPortBounds {
            x: 0.0,
            y: 0.0,
            scroll_x: self.scroll_position.x,
            scroll_y: self.scroll_position.y,
            explicit_width: self.explicit_width,
            explicit_height: self.explicit_height,
            min_width: self.min_visible_width,
            min_height: self.min_visible_height,
            max_width: self.max_visible_width,
            max_height: self.max_visible_height,
        }
    }

    /// Resolve bounds for `items` if anything is invalid.
    ///
    /// Returns whether a pass ran. A scroll-only change still reruns the
    /// layout because virtualized layouts depend on the scroll offset.
    pub fn validate(&mut self, scene: &mut SceneGraph, items: &[NodeId]) -> SceneResult<bool> {
        if self.invalid.is_empty() {
            return Ok(false);
        }
        profile_function!();

        let bounds = self.bounds();
        let result = match self.layout.as_mut() {
            Some(layout) => layout.layout(scene, items, &bounds)?,
            None => manual_layout(scene, &bounds, items)?,
        };
        tracing::trace!(
            "viewport resolved: content {}x{} at ({}, {}), visible {}x{}",
            result.content_width,
            result.content_height,
            result.content_x,
            result.content_y,
            result.view_port_width,
            result.view_port_height
        );
        self.result = result;
        self.invalid = Invalidation::empty();
        Ok(true)
    }

    /// Validate whenever children changed; forces a layout pass.
    pub fn validate_children_changed(
        &mut self,
        scene: &mut SceneGraph,
        items: &[NodeId],
    ) -> SceneResult<bool> {
        self.invalidate(Invalidation::LAYOUT);
        self.validate(scene, items)
    }

    // Resolved state

    pub fn layout_result(&self) -> LayoutBoundsResult {
        self.result
    }

    pub fn content_x(&self) -> f32 {
        self.result.content_x
    }

    pub fn content_y(&self) -> f32 {
        self.result.content_y
    }

    pub fn content_width(&self) -> f32 {
        self.result.content_width
    }

    pub fn content_height(&self) -> f32 {
        self.result.content_height
    }

    pub fn visible_width(&self) -> f32 {
        self.result.view_port_width
    }

    pub fn visible_height(&self) -> f32 {
        self.result.view_port_height
    }

    /// Region of the content currently shown, in content coordinates.
    pub fn clip_rect(&self) -> Rect<f32> {
        Rect::new(
            self.scroll_position.x,
            self.scroll_position.y,
            self.result.view_port_width,
            self.result.view_port_height,
        )
    }

    /// Smallest scroll position that keeps content in view.
    pub fn min_scroll_position(&self) -> Vec2 {
        Vec2::new(self.result.content_x, self.result.content_y)
    }

    /// Largest scroll position; never below [`Self::min_scroll_position`].
    pub fn max_scroll_position(&self) -> Vec2 {
        let min = self.min_scroll_position();
        let max_x =
            self.result.content_x + self.result.content_width - self.result.view_port_width;
        let max_y =
            self.result.content_y + self.result.content_height - self.result.view_port_height;
        Vec2::new(max_x.max(min.x), max_y.max(min.y))
    }
}

fn check_dimension(property: &'static str, value: f32) -> ViewPortResult<()> {
    if value.is_nan() || value < 0.0 {
        tracing::warn!("rejected {} = {}", property, value);
        return Err(ViewPortError::InvalidDimension { property, value });
    }
    Ok(())
}

fn check_order(property: &'static str, min: f32, max: f32) -> ViewPortResult<()> {
    if min > max {
        tracing::warn!("rejected {}: {} > {}", property, min, max);
        return Err(ViewPortError::MinExceedsMax { property, min, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Quad;
    use tessel_core::geometry::Size;
    use tessel_core::math::Vec4;

    fn scene_with(frames: &[Rect<f32>]) -> (SceneGraph, Vec<NodeId>) {
        let mut scene = SceneGraph::new(Size::new(800.0, 600.0));
        let items = frames
            .iter()
            .map(|frame| {
                let id = scene.create(Quad::new(Vec4::ONE));
                scene.set_frame(id, *frame).unwrap();
                id
            })
            .collect();
        (scene, items)
    }

    #[test]
    fn test_manual_layout_negative_origin() {
        let (mut scene, items) = scene_with(&[
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(-5.0, -5.0, 10.0, 10.0),
        ]);
        let result = manual_layout(&mut scene, &ViewPortBounds::default(), &items).unwrap();

        assert_eq!(result.content_x, -5.0);
        assert_eq!(result.content_y, -5.0);
        assert_eq!(result.content_width, 15.0);
        assert_eq!(result.content_height, 15.0);
    }

    #[test]
    fn test_manual_layout_positive_children_keep_zero_origin() {
        let (mut scene, items) = scene_with(&[Rect::new(20.0, 30.0, 10.0, 10.0)]);
        let result = manual_layout(&mut scene, &ViewPortBounds::default(), &items).unwrap();

        assert_eq!(result.content_x, 0.0);
        assert_eq!(result.content_y, 0.0);
        assert_eq!(result.content_width, 30.0);
        assert_eq!(result.content_height, 40.0);
    }

    #[test]
    fn test_manual_layout_empty_is_min_sized() {
        let (mut scene, _) = scene_with(&[]);
        let bounds = ViewPortBounds {
            min_width: 40.0,
            min_height: 25.0,
            ..Default::default()
        };
        let result = manual_layout(&mut scene, &bounds, &[]).unwrap();

        assert_eq!(
            result,
            LayoutBoundsResult {
                content_x: 0.0,
                content_y: 0.0,
                content_width: 40.0,
                content_height: 25.0,
                view_port_width: 40.0,
                view_port_height: 25.0,
            }
        );
    }

    #[test]
    fn test_manual_layout_skips_nan_axis() {
        let (mut scene, items) = scene_with(&[
            Rect::new(f32::NAN, -20.0, 500.0, 10.0),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        ]);
        let result = manual_layout(&mut scene, &ViewPortBounds::default(), &items).unwrap();

        // x ignored for the NaN item, y still counted
        assert_eq!(result.content_x, 0.0);
        assert_eq!(result.content_width, 10.0);
        assert_eq!(result.content_y, -20.0);
        assert_eq!(result.content_height, 30.0);
    }

    #[test]
    fn test_explicit_size_overrides_view_port_only() {
        let (mut scene, items) = scene_with(&[Rect::new(0.0, 0.0, 300.0, 200.0)]);
        let bounds = ViewPortBounds {
            explicit_width: Some(100.0),
            max_height: 150.0,
            ..Default::default()
        };
        let result = manual_layout(&mut scene, &bounds, &items).unwrap();

        assert_eq!(result.view_port_width, 100.0);
        assert_eq!(result.content_width, 300.0);
        assert_eq!(result.view_port_height, 150.0);
    }

    #[test]
    fn test_view_port_width_within_min_max() {
        for width in [0.0, 5.0, 50.0, 75.0, 500.0] {
            let (mut scene, items) = scene_with(&[Rect::new(0.0, 0.0, width, 10.0)]);
            let bounds = ViewPortBounds {
                min_width: 20.0,
                max_width: 80.0,
                ..Default::default()
            };
            let result = manual_layout(&mut scene, &bounds, &items).unwrap();
            assert!(
                (20.0..=80.0).contains(&result.view_port_width),
                "{} escaped the bounds for width {}",
                result.view_port_width,
                width
            );
        }
    }

    #[test]
    fn test_nan_min_rejected_at_setter() {
        let mut view_port = LayoutViewPort::new();
        let err = view_port.set_min_visible_width(f32::NAN).unwrap_err();
        assert!(matches!(
            err,
            ViewPortError::InvalidDimension {
                property: "min_visible_width",
                ..
            }
        ));
        assert_eq!(view_port.min_visible_width(), 0.0);
    }

    #[test]
    fn test_min_above_max_rejected() {
        let mut view_port = LayoutViewPort::new();
        view_port.set_max_visible_height(100.0).unwrap();
        assert!(view_port.set_min_visible_height(200.0).is_err());
        assert_eq!(view_port.min_visible_height(), 0.0);
    }

    #[test]
    fn test_validate_only_when_invalid() {
        let (mut scene, items) = scene_with(&[Rect::new(0.0, 0.0, 400.0, 300.0)]);
        let mut view_port = LayoutViewPort::new();
        view_port.set_explicit_visible_width(Some(200.0)).unwrap();
        view_port.set_explicit_visible_height(Some(100.0)).unwrap();

        assert!(view_port.validate(&mut scene, &items).unwrap());
        assert!(!view_port.validate(&mut scene, &items).unwrap());

        view_port.set_scroll_position(50.0, 25.0).unwrap();
        assert!(view_port.is_invalid(Invalidation::SCROLL));
        assert!(view_port.validate(&mut scene, &items).unwrap());

        assert_eq!(view_port.clip_rect(), Rect::new(50.0, 25.0, 200.0, 100.0));
        assert_eq!(view_port.max_scroll_position(), Vec2::new(200.0, 200.0));
    }

    #[test]
    fn test_max_scroll_never_below_min() {
        let (mut scene, items) = scene_with(&[Rect::new(-10.0, 0.0, 20.0, 20.0)]);
        let mut view_port = LayoutViewPort::new();
        view_port.set_explicit_visible_width(Some(100.0)).unwrap();
        view_port.validate(&mut scene, &items).unwrap();

        assert_eq!(view_port.min_scroll_position().x, -10.0);
        assert_eq!(view_port.max_scroll_position().x, -10.0);
    }
}
