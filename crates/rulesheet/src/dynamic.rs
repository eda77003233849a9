//! Dynamic style extraction.
//!
//! Splits the function-valued part out of a styles object so callers can
//! skip update bookkeeping entirely for fully static sheets.

use crate::value::{Style, StyleValue};

/// Extract every function- or stream-valued entry, keeping the shape of
/// `styles`.
///
/// Nested objects are kept only if they contain at least one dynamic leaf.
/// Arrays are leaves and never searched. Returns `None` if nothing dynamic
/// exists anywhere.
#[must_use]
pub fn extract_dynamic(styles: &Style) -> Option<Style> {
    let mut to: Option<Style> = None;

    for (key, value) in styles.iter() {
        let extracted = match value {
            StyleValue::Function(_) | StyleValue::Stream(_) => Some(value.clone()),
            StyleValue::Object(nested) => extract_dynamic(nested).map(StyleValue::Object),
            _ => None,
        };
        if let Some(extracted) = extracted {
            let _ = to.get_or_insert_with(Style::new).insert(key, extracted);
        }
    }

    to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DynamicValue;

    #[test]
    fn test_extracts_function_leaves() {
        let f = DynamicValue::new(|_| StyleValue::from("red"));
        let styles = Style::new()
            .with("a", Style::new().with("color", f.clone()).with("margin", 0))
            .with("b", "red");
        let extracted = extract_dynamic(&styles).unwrap();
        assert_eq!(extracted, Style::new().with("a", Style::new().with("color", f)));
    }

    #[test]
    fn test_static_styles_yield_none() {
        let styles = Style::new().with("a", "red").with("b", Style::new().with("c", 1));
        assert!(extract_dynamic(&styles).is_none());
    }

    #[test]
    fn test_function_rule_is_extracted() {
        let f = DynamicValue::new(|_| StyleValue::Object(Style::new()));
        let styles = Style::new().with("a", f.clone());
        assert_eq!(extract_dynamic(&styles), Some(Style::new().with("a", f)));
    }
}
