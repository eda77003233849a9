use crate::to_css::{ToCssOptions, to_css};
use crate::value::Style;

/// Keys handled as viewport rules.
pub const VIEWPORT_AT_RULES: [&str; 2] = ["@viewport", "@-ms-viewport"];

/// `@viewport` and `@-ms-viewport`.
#[derive(Debug)]
pub struct ViewportRule {
    pub(crate) style: Style,
}

impl ViewportRule {
    /// Wrap the declarations.
    #[must_use]
    pub const fn new(style: Style) -> Self {
        Self { style }
    }

    pub(crate) fn to_css(&self, key: &str, options: &ToCssOptions) -> String {
        to_css(Some(key), &self.style, options)
    }
}
