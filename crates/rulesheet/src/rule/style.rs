use rulesheet_common::escape::escape;
use serde_json::{Map, Value};

use super::RuleOptions;
use crate::to_css::{ToCssOptions, to_css, to_css_value};
use crate::value::{DynamicValue, Style, StyleValue};

/// A selector plus declarations.
#[derive(Debug)]
pub struct StyleRule {
    selector_text: String,
    id: Option<String>,
    pub(crate) style: Style,
    pub(crate) dynamic: Style,
    pub(crate) fn_style: Option<DynamicValue>,
}

impl StyleRule {
    /// Build a style rule for `key`.
    ///
    /// An explicit selector wins. Otherwise a scoped rule gets a generated
    /// class name and an unscoped one uses the key as its selector.
    #[must_use]
    pub fn new(key: &str, mut style: Style, options: &RuleOptions) -> Self {
        let (selector_text, id) = if let Some(selector) = &options.selector {
            (selector.clone(), None)
        } else if options.scoped {
            let id = options.generate_id.generate(key, options.sheet.as_ref());
            (format!(".{}", escape(&id)), Some(id))
        } else {
            (key.to_string(), None)
        };
        let dynamic = style.take_dynamic();
        Self {
            selector_text,
            id,
            style,
            dynamic,
            fn_style: None,
        }
    }

    /// Build a rule whose whole style is computed from update data.
    #[must_use]
    pub fn from_function(key: &str, f: DynamicValue, options: &RuleOptions) -> Self {
        let mut rule = Self::new(key, Style::new(), options);
        rule.fn_style = Some(f);
        rule
    }

    /// Current selector text.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector_text
    }

    pub(crate) fn set_selector(&mut self, selector: impl Into<String>) {
        self.selector_text = selector.into();
    }

    /// Generated class name, when the selector was generated.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Static declarations.
    #[must_use]
    pub const fn style(&self) -> &Style {
        &self.style
    }

    /// Static declarations as JSON. Lists are flattened to their CSS text;
    /// nested objects and empty values are left out.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut json = Map::new();
        for (prop, value) in self.style.iter() {
            let entry = match value {
                StyleValue::String(s) => Value::String(s.clone()),
                StyleValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
                StyleValue::Bool(true) => Value::Bool(true),
                StyleValue::Array(_) => match to_css_value(value) {
                    Some(css) => Value::String(css),
                    None => continue,
                },
                _ => continue,
            };
            let _ = json.insert(prop.to_string(), entry);
        }
        Value::Object(json)
    }

    pub(crate) fn to_css(&self, options: &ToCssOptions, link: bool) -> String {
        let options = if link { options.allowing_empty() } else { *options };
        to_css(Some(&self.selector_text), &self.style, &options)
    }
}
