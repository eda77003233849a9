use crate::to_css::ToCssOptions;
use crate::value::StyleValue;

/// Keys handled as one-line statements.
pub const SIMPLE_AT_RULES: [&str; 3] = ["@charset", "@import", "@namespace"];

/// A statement at-rule: `@import url(a.css);`.
#[derive(Debug)]
pub struct SimpleRule {
    values: Vec<String>,
}

impl SimpleRule {
    /// Accept a string, or an array of strings for several statements.
    #[must_use]
    pub fn from_value(value: &StyleValue) -> Option<Self> {
        let values = match value {
            StyleValue::String(s) => vec![s.clone()],
            StyleValue::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => return None,
        };
        Some(Self { values })
    }

    /// Raw statement values.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub(crate) fn to_css(&self, key: &str, options: &ToCssOptions) -> String {
        self.values
            .iter()
            .map(|value| format!("{key} {value};"))
            .collect::<Vec<_>>()
            .join(options.linebreak())
    }
}
