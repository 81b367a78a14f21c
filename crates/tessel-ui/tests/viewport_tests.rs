//! Viewport bounds resolution tests.
//!
//! These exercise the resolver through manual layout, pluggable layouts and
//! the `LayoutViewPort` property surface.

use tessel_core::geometry::{Rect, Size};
use tessel_test_utils::SizedWidget;
use tessel_ui::layout::VerticalLayout;
use tessel_ui::scene::{NodeId, SceneGraph};
use tessel_ui::viewport::{
    Invalidation, LayoutViewPort, ViewPortBounds, ViewPortError, resolve_bounds,
};

fn scene() -> SceneGraph {
    SceneGraph::new(Size::new(800.0, 600.0))
}

fn placed(scene: &mut SceneGraph, x: f32, y: f32, width: f32, height: f32) -> NodeId {
    let node = scene.create(SizedWidget::new(width, height));
    scene.set_position(node, x, y).unwrap();
    node
}

#[test]
fn test_view_port_width_within_min_max() {
    let mut scene = scene();
    let items: Vec<NodeId> = [5.0, 50.0, 500.0]
        .into_iter()
        .map(|width| placed(&mut scene, 0.0, 0.0, width, 10.0))
        .collect();

    for (min, max) in [(0.0, 10.0), (20.0, 100.0), (100.0, 100.0), (600.0, 1000.0)] {
        for item in &items {
            let bounds = ViewPortBounds {
                min_width: min,
                max_width: max,
                ..Default::default()
            };
            let result = resolve_bounds(&mut scene, &bounds, &[*item], None).unwrap();
            assert!(
                result.view_port_width >= min && result.view_port_width <= max,
                "{} not in [{}, {}]",
                result.view_port_width,
                min,
                max
            );
        }
    }
}

#[test]
fn test_manual_scan_with_negative_origin() {
    let mut scene = scene();
    let items = [
        placed(&mut scene, 0.0, 0.0, 10.0, 10.0),
        placed(&mut scene, -5.0, -5.0, 10.0, 10.0),
    ];

    let result = resolve_bounds(&mut scene, &ViewPortBounds::default(), &items, None).unwrap();

    assert_eq!(result.content_x, -5.0);
    assert_eq!(result.content_y, -5.0);
    // Extent from -5 to 10 on each axis.
    assert_eq!(result.content_width, 15.0);
    assert_eq!(result.content_height, 15.0);
}

#[test]
fn test_items_validated_before_measuring() {
    let mut scene = scene();
    let widget = SizedWidget::new(40.0, 25.0);
    let validations = widget.validations();
    let node = scene.create(widget);

    let result = resolve_bounds(&mut scene, &ViewPortBounds::default(), &[node], None).unwrap();

    assert_eq!(*validations.lock(), 1);
    assert_eq!(result.content_width, 40.0);
    assert_eq!(result.content_height, 25.0);
}

#[test]
fn test_layout_result_adopted() {
    let mut scene = scene();
    let items: Vec<NodeId> = (0..4).map(|_| placed(&mut scene, 0.0, 0.0, 30.0, 10.0)).collect();
    let mut layout = VerticalLayout::new().with_gap(2.0);
    let bounds = ViewPortBounds {
        explicit_height: Some(20.0),
        ..Default::default()
    };

    let result = resolve_bounds(&mut scene, &bounds, &items, Some(&mut layout)).unwrap();

    assert_eq!(result.content_height, 46.0);
    assert_eq!(result.view_port_height, 20.0);
    assert_eq!(result.view_port_width, 30.0);
    assert_eq!(scene.frame(items[3]).unwrap(), Rect::new(0.0, 36.0, 30.0, 10.0));
}

#[test]
fn test_view_port_setters_reject_bad_numbers() {
    let mut view_port = LayoutViewPort::new();

    assert!(matches!(
        view_port.set_min_visible_width(f32::NAN),
        Err(ViewPortError::InvalidDimension { .. })
    ));
    assert!(matches!(
        view_port.set_max_visible_height(-1.0),
        Err(ViewPortError::InvalidDimension { .. })
    ));

    view_port.set_max_visible_width(50.0).unwrap();
    assert!(matches!(
        view_port.set_min_visible_width(60.0),
        Err(ViewPortError::MinExceedsMax { .. })
    ));
    // Rejected values leave the previous state untouched.
    assert_eq!(view_port.min_visible_width(), 0.0);
    assert_eq!(view_port.max_visible_width(), 50.0);
}

#[test]
fn test_view_port_scroll_limits() {
    let mut scene = scene();
    let items: Vec<NodeId> = (0..10).map(|_| placed(&mut scene, 0.0, 0.0, 100.0, 20.0)).collect();
    let mut view_port = LayoutViewPort::new().with_layout(VerticalLayout::new());
    view_port.set_explicit_visible_height(Some(50.0)).unwrap();

    assert!(view_port.validate(&mut scene, &items).unwrap());
    assert_eq!(view_port.content_height(), 200.0);
    assert_eq!(view_port.max_scroll_position().y, 150.0);

    view_port.set_scroll_position(0.0, 30.0).unwrap();
    assert!(view_port.is_invalid(Invalidation::SCROLL));
    assert!(view_port.validate(&mut scene, &items).unwrap());
    assert_eq!(view_port.clip_rect(), Rect::new(0.0, 30.0, 100.0, 50.0));

    // Nothing changed since the last pass.
    assert!(!view_port.validate(&mut scene, &items).unwrap());
}

#[test]
fn test_virtualized_view_port_follows_scroll() {
    let mut scene = scene();
    let items: Vec<NodeId> = (0..100).map(|_| placed(&mut scene, 0.0, 0.0, 100.0, 0.0)).collect();
    let mut view_port = LayoutViewPort::new()
        .with_layout(VerticalLayout::new().with_virtual_item_height(10.0, 0));
    view_port.set_explicit_visible_height(Some(40.0)).unwrap();
    view_port.validate(&mut scene, &items).unwrap();

    assert!(scene.is_visible(items[3]));
    assert!(!scene.is_visible(items[4]));

    view_port.set_scroll_position(0.0, 500.0).unwrap();
    view_port.validate(&mut scene, &items).unwrap();

    assert!(!scene.is_visible(items[3]));
    assert!(scene.is_visible(items[50]));
    assert_eq!(view_port.content_height(), 1000.0);
}
