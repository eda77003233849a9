//! CSS serializer.
//!
//! Renders a selector plus a declaration mapping to CSS text. Output is
//! deterministic: declarations appear in mapping order, two spaces per
//! indentation level, one declaration per line.

use crate::value::{IMPORTANT, Style, StyleValue};

/// Property holding declarations that must be emitted before the regular
/// ones (older syntax a browser may not understand the newer value for).
pub const FALLBACKS: &str = "fallbacks";

/// Options accepted by every `to_css` entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToCssOptions {
    /// Base indentation level. Containers default their children to one
    /// level deeper than themselves.
    pub indent: Option<usize>,
    /// Render `selector {}` instead of nothing for an empty block.
    pub allow_empty: bool,
    /// Render the children of container rules.
    pub children: bool,
    /// `false` strips line breaks, spaces and indentation.
    pub format: bool,
}

impl Default for ToCssOptions {
    fn default() -> Self {
        Self {
            indent: None,
            allow_empty: false,
            children: true,
            format: true,
        }
    }
}

impl ToCssOptions {
    /// Same options with `allow_empty` set.
    #[must_use]
    pub const fn allowing_empty(self) -> Self {
        Self {
            allow_empty: true,
            ..self
        }
    }

    /// Same options with an explicit indentation level.
    #[must_use]
    pub const fn indented(self, indent: usize) -> Self {
        Self {
            indent: Some(indent),
            ..self
        }
    }

    /// Same options without container children.
    #[must_use]
    pub const fn without_children(self) -> Self {
        Self {
            children: false,
            ..self
        }
    }

    /// Line separator for the current format.
    #[must_use]
    pub const fn linebreak(&self) -> &'static str {
        if self.format { "\n" } else { "" }
    }

    /// Separator after `:` and before `{`.
    #[must_use]
    pub const fn space(&self) -> &'static str {
        if self.format { " " } else { "" }
    }

    pub(crate) fn pad(&self, level: usize) -> String {
        if self.format {
            "  ".repeat(level)
        } else {
            String::new()
        }
    }
}

/// Render one declaration value.
///
/// Returns `None` for values that must not be rendered: `null`, `false`,
/// nested objects, and unresolved functions or streams.
///
/// Arrays join with `, `. An array whose first element is an array is a
/// list of space separated groups: `[["1px", "solid"], ["2px", "dashed"]]`
/// renders `1px solid, 2px dashed`. A trailing [`IMPORTANT`] element is
/// moved to the end as ` !important`.
#[must_use]
pub fn to_css_value(value: &StyleValue) -> Option<String> {
    match value {
        StyleValue::Array(items) => {
            let important = matches!(items.last(), Some(StyleValue::String(s)) if s == IMPORTANT);
            let mut css = if matches!(items.first(), Some(StyleValue::Array(_))) {
                let groups: Vec<String> = items
                    .iter()
                    .take_while(|item| !is_important(item))
                    .filter_map(|item| match item {
                        StyleValue::Array(inner) => join(inner, " "),
                        other => scalar(other),
                    })
                    .collect();
                groups.join(", ")
            } else {
                join(items, ", ").unwrap_or_default()
            };
            if css.is_empty() {
                return None;
            }
            if important {
                css.push(' ');
                css.push_str(IMPORTANT);
            }
            Some(css)
        }
        other => scalar(other),
    }
}

fn is_important(value: &StyleValue) -> bool {
    value.as_str() == Some(IMPORTANT)
}

fn scalar(value: &StyleValue) -> Option<String> {
    match value {
        StyleValue::String(s) => Some(s.clone()),
        StyleValue::Number(n) => Some(n.to_string()),
        StyleValue::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn join(items: &[StyleValue], by: &str) -> Option<String> {
    let parts: Vec<String> = items
        .iter()
        .take_while(|item| !is_important(item))
        .filter_map(scalar)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(by))
    }
}

fn push_declarations(out: &mut String, style: &Style, indent: usize, options: &ToCssOptions) {
    let space = options.space();
    for (prop, value) in style.iter() {
        if prop == FALLBACKS {
            continue;
        }
        let Some(css) = to_css_value(value) else {
            continue;
        };
        if !out.is_empty() {
            out.push_str(options.linebreak());
        }
        out.push_str(&options.pad(indent));
        out.push_str(prop);
        out.push(':');
        out.push_str(space);
        out.push_str(&css);
        out.push(';');
    }
}

/// Render `selector { declarations }`.
///
/// With no selector only the declaration lines are returned (inline style
/// use). An empty result is `""` unless `allow_empty` is set, in which case
/// `selector {}` is returned. Object values render as nested blocks after
/// the declarations, one indentation level deeper.
#[must_use]
pub fn to_css(selector: Option<&str>, style: &Style, options: &ToCssOptions) -> String {
    let linebreak = options.linebreak();
    let mut indent = options.indent.unwrap_or(0);
    if selector.is_some() {
        indent += 1;
    }

    let mut result = String::new();

    // Fallbacks first
    match style.get(FALLBACKS) {
        Some(StyleValue::Array(items)) => {
            for item in items {
                if let StyleValue::Object(fallback) = item {
                    push_declarations(&mut result, fallback, indent, options);
                }
            }
        }
        Some(StyleValue::Object(fallback)) => push_declarations(&mut result, fallback, indent, options),
        _ => {}
    }

    push_declarations(&mut result, style, indent, options);

    for (prop, value) in style.iter() {
        let StyleValue::Object(nested) = value else {
            continue;
        };
        if prop == FALLBACKS {
            continue;
        }
        let nested_options = ToCssOptions {
            indent: Some(indent),
            allow_empty: false,
            ..*options
        };
        let block = to_css(Some(prop), nested, &nested_options);
        if block.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push_str(linebreak);
        }
        result.push_str(&block);
    }

    if result.is_empty() && !options.allow_empty {
        return result;
    }

    let Some(selector) = selector else {
        return result;
    };

    indent -= 1;
    if !result.is_empty() {
        result = format!("{linebreak}{result}{linebreak}");
    }
    let pad = options.pad(indent);
    format!("{pad}{selector}{space}{{{result}{pad}}}", space = options.space())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ToCssOptions {
        ToCssOptions::default()
    }

    #[test]
    fn test_simple_block() {
        let style = Style::new().with("color", "red");
        assert_eq!(to_css(Some("a"), &style, &opts()), "a {\n  color: red;\n}");
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(to_css(Some("a"), &Style::new(), &opts()), "");
        assert_eq!(to_css(Some("a"), &Style::new(), &opts().allowing_empty()), "a {}");
    }

    #[test]
    fn test_no_selector_returns_declarations() {
        let style = Style::new().with("color", "red").with("margin", 0);
        assert_eq!(to_css(None, &style, &opts()), "color: red;\nmargin: 0;");
    }

    #[test]
    fn test_unformatted() {
        let style = Style::new().with("color", "red").with("margin", 0);
        let options = ToCssOptions {
            format: false,
            ..opts()
        };
        assert_eq!(to_css(Some("a"), &style, &options), "a{color:red;margin:0;}");
    }

    #[test]
    fn test_value_lists() {
        let flat = StyleValue::Array(vec!["Arial".into(), "sans-serif".into()]);
        assert_eq!(to_css_value(&flat).as_deref(), Some("Arial, sans-serif"));

        let groups = StyleValue::Array(vec![
            StyleValue::Array(vec!["1px".into(), "solid".into()]),
            StyleValue::Array(vec!["2px".into(), "dashed".into()]),
            IMPORTANT.into(),
        ]);
        assert_eq!(
            to_css_value(&groups).as_deref(),
            Some("1px solid, 2px dashed !important")
        );
    }

    #[test]
    fn test_dynamic_values_not_rendered() {
        let f = crate::value::DynamicValue::new(|_| StyleValue::from("red"));
        assert_eq!(to_css_value(&StyleValue::Function(f)), None);
    }
}
