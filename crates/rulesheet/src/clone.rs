//! Style normalizer.
//!
//! The engine never works on caller-owned descriptions: every entry point
//! clones the incoming value first, so later processing (plugins rewriting a
//! style, dynamic values being split out) cannot leak back to the caller.
//!
//! Cycles cannot be expressed in [`StyleValue`], so no cycle detection is
//! needed here.

use crate::value::{Style, StyleValue};

/// Deep-clone a style value.
///
/// Objects and arrays are copied recursively. Functions and streams are
/// opaque and shared by reference, so change detection by reference keeps
/// working across clones.
#[must_use]
pub fn clone_style(value: &StyleValue) -> StyleValue {
    match value {
        StyleValue::Object(style) => StyleValue::Object(clone_mapping(style)),
        StyleValue::Array(items) => StyleValue::Array(items.iter().map(clone_style).collect()),
        StyleValue::Function(f) => StyleValue::Function(f.clone()),
        StyleValue::Stream(s) => StyleValue::Stream(s.clone()),
        StyleValue::String(s) => StyleValue::String(s.clone()),
        StyleValue::Number(n) => StyleValue::Number(*n),
        StyleValue::Bool(b) => StyleValue::Bool(*b),
        StyleValue::Null => StyleValue::Null,
    }
}

/// Deep-clone a mapping, see [`clone_style`].
#[must_use]
pub fn clone_mapping(style: &Style) -> Style {
    style
        .iter()
        .map(|(key, value)| (key.to_string(), clone_style(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DynamicValue;

    #[test]
    fn test_clone_is_idempotent() {
        let f = DynamicValue::new(|_| StyleValue::from(1));
        let original = StyleValue::Object(
            Style::new()
                .with("a", Style::new().with("color", "red").with("width", f))
                .with("b", vec![StyleValue::from("1px"), StyleValue::from("solid")]),
        );
        let once = clone_style(&original);
        let twice = clone_style(&once);
        assert_eq!(once, original);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_clone_does_not_alias() {
        let original = Style::new().with("a", Style::new().with("color", "red"));
        let mut copy = clone_mapping(&original);
        if let Some(StyleValue::Object(inner)) = copy.get_mut("a") {
            let _ = inner.insert("color", "blue");
        }
        let inner = original.get("a").and_then(StyleValue::as_object).unwrap();
        assert_eq!(inner.get("color"), Some(&StyleValue::from("red")));
    }
}
