use crate::to_css::{ToCssOptions, to_css};
use crate::value::{Style, StyleValue};

const AT: &str = "@font-face";

/// `@font-face`: one declaration block, or one per face.
#[derive(Debug)]
pub enum FontFaceRule {
    /// `{"@font-face": {...}}`
    Single(Style),
    /// `{"@font-face": [{...}, {...}]}`
    Many(Vec<Style>),
}

impl FontFaceRule {
    /// Accept an object or an array of objects.
    #[must_use]
    pub fn from_value(value: &StyleValue) -> Option<Self> {
        match value {
            StyleValue::Object(style) => Some(Self::Single(style.clone())),
            StyleValue::Array(items) => Some(Self::Many(
                items.iter().filter_map(StyleValue::as_object).cloned().collect(),
            )),
            _ => None,
        }
    }

    pub(crate) const fn single(&self) -> Option<&Style> {
        match self {
            Self::Single(style) => Some(style),
            Self::Many(_) => None,
        }
    }

    pub(crate) const fn single_mut(&mut self) -> Option<&mut Style> {
        match self {
            Self::Single(style) => Some(style),
            Self::Many(_) => None,
        }
    }

    pub(crate) fn to_css(&self, options: &ToCssOptions) -> String {
        match self {
            Self::Single(style) => to_css(Some(AT), style, options),
            Self::Many(faces) => faces
                .iter()
                .map(|face| to_css(Some(AT), face, options))
                .filter(|css| !css.is_empty())
                .collect::<Vec<_>>()
                .join(options.linebreak()),
        }
    }
}
