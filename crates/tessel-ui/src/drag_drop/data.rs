//! Payload carried by a drag.

use std::any::Any;
use std::fmt;

use tessel_core::alloc::HashMap;

/// Format-keyed data carried by a drag.
///
/// Each format maps to one value of any type. Targets usually check
/// [`has_data_for_format`](Self::has_data_for_format) during `enter` and
/// accept only formats they understand.
#[derive(Default)]
pub struct DragData {
    formats: HashMap<String, Box<dyn Any>>,
}

impl DragData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_data_for_format`](Self::set_data_for_format).
    pub fn with<T: Any>(mut self, format: impl Into<String>, value: T) -> Self {
        self.set_data_for_format(format, value);
        self
    }

    pub fn has_data_for_format(&self, format: &str) -> bool {
        self.formats.contains_key(format)
    }

    /// The value stored for `format`, if present and of type `T`.
    pub fn get_data_for_format<T: Any>(&self, format: &str) -> Option<&T> {
        self.formats.get(format)?.downcast_ref()
    }

    /// Store `value` for `format`, replacing any previous value.
    pub fn set_data_for_format<T: Any>(&mut self, format: impl Into<String>, value: T) {
        self.formats.insert(format.into(), Box::new(value));
    }

    /// Remove and return the value stored for `format`.
    pub fn clear_data_for_format(&mut self, format: &str) -> Option<Box<dyn Any>> {
        self.formats.remove(format)
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl fmt::Debug for DragData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<&str> = self.formats().collect();
        formats.sort_unstable();
        f.debug_struct("DragData").field("formats", &formats).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_lookup() {
        let data = DragData::new().with("text", String::from("hello")).with("count", 3_u32);

        assert!(data.has_data_for_format("text"));
        assert_eq!(
            data.get_data_for_format::<String>("text").map(String::as_str),
            Some("hello")
        );
        assert_eq!(data.get_data_for_format::<u32>("count"), Some(&3));
        // Wrong type
        assert_eq!(data.get_data_for_format::<i64>("count"), None);
    }

    #[test]
    fn test_clear_format() {
        let mut data = DragData::new().with("item", 7_i32);
        assert!(data.clear_data_for_format("item").is_some());
        assert!(!data.has_data_for_format("item"));
        assert!(data.is_empty());
        assert!(data.clear_data_for_format("item").is_none());
    }

    #[test]
    fn test_debug_lists_formats() {
        let data = DragData::new().with("b", 1).with("a", 2);
        assert_eq!(format!("{:?}", data), r#"DragData { formats: ["a", "b"] }"#);
    }
}
