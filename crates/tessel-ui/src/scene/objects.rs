//! Built-in display objects.

use tessel_core::math::Vec4;

use super::capability::DisplayObject;

/// A plain container that groups children.
#[derive(Debug, Clone, Default)]
pub struct Container {
    name: Option<String>,
}

impl Container {
    pub fn new() -> Self {
        Self { name: None }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl DisplayObject for Container {
    fn debug_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Container")
    }

    fn is_container(&self) -> bool {
        true
    }
}

/// A solid colored rectangle.
///
/// Also used as the default modal overlay.
#[derive(Debug, Clone)]
pub struct Quad {
    pub color: Vec4,
    name: Option<String>,
}

impl Quad {
    pub fn new(color: Vec4) -> Self {
        Self { color, name: None }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl DisplayObject for Quad {
    fn debug_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Quad")
    }
}
