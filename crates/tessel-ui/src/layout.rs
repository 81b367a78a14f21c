//! Pluggable layouts for viewports.

use std::ops::Range;

use tessel_core::profiling::profile_function;

use crate::scene::{NodeId, SceneGraph, SceneResult};
use crate::viewport::{LayoutBoundsResult, ViewPortBounds};

/// A layout algorithm: positions `items` and reports the resulting bounds.
pub trait Layout {
    fn layout(
        &mut self,
        scene: &mut SceneGraph,
        items: &[NodeId],
        bounds: &ViewPortBounds,
    ) -> SceneResult<LayoutBoundsResult>;
}

/// Stacks items top to bottom.
///
/// With a virtual item height every item is assumed to be that tall and only
/// the items intersecting the visible area (plus `overscan` on each side) are
/// validated, positioned and shown; the rest are hidden.
#[derive(Debug, Clone, Default)]
pub struct VerticalLayout {
    pub gap: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,
    pub virtual_item_height: Option<f32>,
    pub overscan: usize,
    visible: Range<usize>,
}

impl VerticalLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding_top = padding;
        self.padding_right = padding;
        self.padding_bottom = padding;
        self.padding_left = padding;
        self
    }

    /// Enable virtualization with a fixed item height.
    pub fn with_virtual_item_height(mut self, height: f32, overscan: usize) -> Self {
        self.virtual_item_height = Some(height);
        self.overscan = overscan;
        self
    }

    /// Items laid out by the last pass.
    pub fn visible_range(&self) -> Range<usize> {
        self.visible.clone()
    }

    /// Item indices intersecting a window of `view_port_height` at `scroll_y`.
    pub fn compute_visible_range(
        &self,
        count: usize,
        item_height: f32,
        scroll_y: f32,
        view_port_height: f32,
    ) -> Range<usize> {
        let step = item_height + self.gap;
        if count == 0 || step <= 0.0 {
            return 0..count;
        }
        let top = (scroll_y - self.padding_top).max(0.0);
        let bottom = (scroll_y - self.padding_top + view_port_height).max(0.0);
        let first = (top / step).floor() as usize;
        let last = (bottom / step).ceil() as usize;

        let start = first.saturating_sub(self.overscan).min(count);
        let end = last.saturating_add(self.overscan).min(count);
        start..end.max(start)
    }

    fn stacked_height(&self, heights_sum: f32, count: usize) -> f32 {
        let gaps = self.gap * count.saturating_sub(1) as f32;
        self.padding_top + heights_sum + gaps + self.padding_bottom
    }
}

impl Layout for VerticalLayout {
    fn layout(
        &mut self,
        scene: &mut SceneGraph,
        items: &[NodeId],
        bounds: &ViewPortBounds,
    ) -> SceneResult<LayoutBoundsResult> {
        profile_function!();
        let count = items.len();
        let origin_x = bounds.x + self.padding_left;
        let origin_y = bounds.y + self.padding_top;
        let mut max_item_width = 0.0_f32;

        let measured_height = match self.virtual_item_height {
            Some(item_height) => {
                let measured = self.stacked_height(item_height * count as f32, count);
                let view_port_height = bounds.resolve_height(measured);
                let range = self.compute_visible_range(
                    count,
                    item_height,
                    bounds.scroll_y,
                    view_port_height,
                );

                for (index, &item) in items.iter().enumerate() {
                    let in_range = range.contains(&index);
                    scene.set_visible(item, in_range)?;
                    if !in_range {
                        continue;
                    }
                    scene.validate(item)?;
                    let width = scene.size(item)?.width;
                    let y = origin_y + index as f32 * (item_height + self.gap);
                    scene.set_position(item, origin_x, y)?;
                    scene.set_size(item, width, item_height)?;
                    max_item_width = max_item_width.max(width);
                }
                tracing::trace!("virtual layout showing {:?} of {}", range, count);
                self.visible = range;
                measured
            }
            None => {
                let mut y = origin_y;
                let mut heights = 0.0;
                for &item in items {
                    scene.validate(item)?;
                    let size = scene.size(item)?;
                    scene.set_visible(item, true)?;
                    scene.set_position(item, origin_x, y)?;
                    y += size.height + self.gap;
                    heights += size.height;
                    max_item_width = max_item_width.max(size.width);
                }
                self.visible = 0..count;
                self.stacked_height(heights, count)
            }
        };

        let measured_width = self.padding_left + max_item_width + self.padding_right;
        let content_width = bounds.clamp_width(measured_width);
        let content_height = bounds.clamp_height(measured_height);

        Ok(LayoutBoundsResult {
            content_x: bounds.x,
            content_y: bounds.y,
            content_width,
            content_height,
            view_port_width: bounds.resolve_width(measured_width),
            view_port_height: bounds.resolve_height(measured_height),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Quad;
    use tessel_core::geometry::Size;
    use tessel_core::math::{Vec2, Vec4};

    fn items(scene: &mut SceneGraph, count: usize, width: f32, height: f32) -> Vec<NodeId> {
        (0..count)
            .map(|_| {
                let id = scene.create(Quad::new(Vec4::ONE));
                scene.set_size(id, width, height).unwrap();
                id
            })
            .collect()
    }

    #[test]
    fn test_vertical_layout_stacks_with_gap_and_padding() {
        let mut scene = SceneGraph::new(Size::new(800.0, 600.0));
        let nodes = items(&mut scene, 3, 50.0, 20.0);
        let mut layout = VerticalLayout::new().with_gap(5.0).with_padding(10.0);

        let result = layout
            .layout(&mut scene, &nodes, &ViewPortBounds::default())
            .unwrap();

        assert_eq!(scene.position(nodes[0]).unwrap(), Vec2::new(10.0, 10.0));
        assert_eq!(scene.position(nodes[2]).unwrap(), Vec2::new(10.0, 60.0));
        assert_eq!(result.content_width, 70.0);
        assert_eq!(result.content_height, 90.0);
        assert_eq!(layout.visible_range(), 0..3);
    }

    #[test]
    fn test_visible_range() {
        let layout = VerticalLayout::new();
        assert_eq!(layout.compute_visible_range(100, 20.0, 200.0, 100.0), 10..15);

        let layout = VerticalLayout::new().with_virtual_item_height(20.0, 2);
        assert_eq!(layout.compute_visible_range(100, 20.0, 200.0, 100.0), 8..17);
        assert_eq!(layout.compute_visible_range(100, 20.0, 1990.0, 100.0), 97..100);
        assert_eq!(layout.compute_visible_range(0, 20.0, 0.0, 100.0), 0..0);
    }

    #[test]
    fn test_virtual_layout_hides_offscreen_items() {
        let mut scene = SceneGraph::new(Size::new(800.0, 600.0));
        let nodes = items(&mut scene, 50, 40.0, 0.0);
        let mut layout = VerticalLayout::new().with_virtual_item_height(10.0, 0);
        let bounds = ViewPortBounds {
            explicit_height: Some(30.0),
            scroll_y: 100.0,
            ..Default::default()
        };

        let result = layout.layout(&mut scene, &nodes, &bounds).unwrap();

        assert_eq!(layout.visible_range(), 10..13);
        assert_eq!(result.content_height, 500.0);
        assert_eq!(result.view_port_height, 30.0);
        assert!(scene.is_visible(nodes[10]));
        assert!(!scene.is_visible(nodes[9]));
        assert_eq!(scene.position(nodes[12]).unwrap(), Vec2::new(0.0, 120.0));
    }
}
