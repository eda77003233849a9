//! Style description values.
//!
//! A style description is an ordered mapping from keys to values. At the top
//! level of a sheet the keys are rule names, inside a rule they are CSS
//! properties. Order is significant everywhere: it decides rule order and
//! declaration order in the generated CSS, so [`Style`] keeps insertion order.

use std::fmt;
use std::rc::Rc;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::Value;

use crate::error::StyleParseError;

/// Marker that, as the last element of an array value, makes the declaration
/// `!important`.
pub const IMPORTANT: &str = "!important";

/// A declaration value computed from runtime data.
///
/// Functions are opaque: cloning shares the callable, and equality is by
/// reference.
#[derive(Clone)]
pub struct DynamicValue(Rc<dyn Fn(&Value) -> StyleValue>);

impl DynamicValue {
    /// Wrap a callable that maps update data to a value.
    #[must_use]
    pub fn new(f: impl Fn(&Value) -> StyleValue + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Evaluate against `data`.
    #[must_use]
    pub fn call(&self, data: &Value) -> StyleValue {
        (self.0)(data)
    }

    /// Reference equality.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DynamicValue(<fn>)")
    }
}

/// A source of values that change over time.
///
/// Streams are pulled at update time; the engine never subscribes.
pub trait StyleStream {
    /// The most recent value, or `None` if nothing was emitted yet.
    fn latest(&self) -> Option<StyleValue>;
}

/// Shared handle to a [`StyleStream`].
#[derive(Clone)]
pub struct StreamValue(Rc<dyn StyleStream>);

impl StreamValue {
    /// Wrap a stream.
    #[must_use]
    pub fn new(stream: impl StyleStream + 'static) -> Self {
        Self(Rc::new(stream))
    }

    /// Most recent value of the stream.
    #[must_use]
    pub fn latest(&self) -> Option<StyleValue> {
        self.0.latest()
    }

    /// Reference equality.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for StreamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamValue(<stream>)")
    }
}

/// One value inside a style description.
#[derive(Debug, Clone)]
pub enum StyleValue {
    /// Absent value. Declarations with this value are not rendered.
    Null,
    /// `false` removes a declaration; `true` renders as `true`.
    Bool(bool),
    /// Rendered the way JavaScript prints numbers (`0`, `1.5`).
    Number(f64),
    /// Raw CSS text.
    String(String),
    /// Space/comma separated lists, optionally ending in [`IMPORTANT`].
    Array(Vec<StyleValue>),
    /// Nested mapping: rule body, nested block or fallbacks table.
    Object(Style),
    /// Evaluated on update.
    Function(DynamicValue),
    /// Pulled on update.
    Stream(StreamValue),
}

impl PartialEq for StyleValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Stream(a), Self::Stream(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl StyleValue {
    /// `null` and `false`: values that remove a declaration.
    #[must_use]
    pub const fn is_empty_value(&self) -> bool {
        matches!(self, Self::Null | Self::Bool(false))
    }

    /// Function and stream values.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Stream(_))
    }

    /// The string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The mapping payload, if this is an object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Style> {
        match self {
            Self::Object(style) => Some(style),
            _ => None,
        }
    }

    /// Resolve a dynamic value against update data.
    ///
    /// Static values resolve to themselves. A stream that has not emitted
    /// yet resolves to `None`.
    #[must_use]
    pub fn resolve(&self, data: &Value) -> Option<Self> {
        match self {
            Self::Function(f) => Some(f.call(data)),
            Self::Stream(stream) => stream.latest(),
            other => Some(other.clone()),
        }
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for StyleValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for StyleValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for StyleValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Style> for StyleValue {
    fn from(value: Style) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<StyleValue>> for StyleValue {
    fn from(value: Vec<StyleValue>) -> Self {
        Self::Array(value)
    }
}

impl From<DynamicValue> for StyleValue {
    fn from(value: DynamicValue) -> Self {
        Self::Function(value)
    }
}

impl From<StreamValue> for StyleValue {
    fn from(value: StreamValue) -> Self {
        Self::Stream(value)
    }
}

/// An insertion-ordered mapping from keys to [`StyleValue`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    entries: Vec<(String, StyleValue)>,
}

impl Style {
    /// Create an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builder form of [`Style::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        let _ = self.insert(key, value);
        self
    }

    /// Insert or replace. Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<StyleValue>) -> Option<StyleValue> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a key mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut StyleValue> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Whether the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move every top-level function or stream value out of this mapping.
    pub(crate) fn take_dynamic(&mut self) -> Self {
        let (dynamic, fixed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|(_, v)| v.is_dynamic());
        self.entries = fixed;
        Self { entries: dynamic }
    }
}

impl<K: Into<String>, V: Into<StyleValue>> FromIterator<(K, V)> for Style {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut style = Self::new();
        for (k, v) in iter {
            let _ = style.insert(k, v);
        }
        style
    }
}

impl IntoIterator for Style {
    type Item = (String, StyleValue);
    type IntoIter = std::vec::IntoIter<(String, StyleValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Style {
    /// Parse a JSON object, keeping key order.
    ///
    /// # Errors
    ///
    /// Returns [`StyleParseError`] if the text is not a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, StyleParseError> {
        match serde_json::from_str::<StyleValue>(text)? {
            StyleValue::Object(style) => Ok(style),
            StyleValue::Null => Err(StyleParseError::NotAnObject { found: "null" }),
            StyleValue::Bool(_) => Err(StyleParseError::NotAnObject { found: "boolean" }),
            StyleValue::Number(_) => Err(StyleParseError::NotAnObject { found: "number" }),
            StyleValue::String(_) => Err(StyleParseError::NotAnObject { found: "string" }),
            StyleValue::Array(_) => Err(StyleParseError::NotAnObject { found: "array" }),
            StyleValue::Function(_) | StyleValue::Stream(_) => {
                Err(StyleParseError::NotAnObject { found: "callable" })
            }
        }
    }
}

struct StyleValueVisitor;

impl<'de> Visitor<'de> for StyleValueVisitor {
    type Value = StyleValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON style value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<StyleValue, E> {
        Ok(StyleValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<StyleValue, E> {
        Ok(StyleValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<StyleValue, E> {
        Ok(StyleValue::Bool(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<StyleValue, E> {
        Ok(StyleValue::Number(v as f64))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<StyleValue, E> {
        Ok(StyleValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<StyleValue, E> {
        Ok(StyleValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<StyleValue, E> {
        Ok(StyleValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<StyleValue, E> {
        Ok(StyleValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<StyleValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<StyleValue>()? {
            items.push(item);
        }
        Ok(StyleValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<StyleValue, A::Error> {
        let mut style = Style::new();
        while let Some((key, value)) = map.next_entry::<String, StyleValue>()? {
            let _ = style.insert(key, value);
        }
        Ok(StyleValue::Object(style))
    }
}

impl<'de> Deserialize<'de> for StyleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StyleValueVisitor)
    }
}

impl<'de> Deserialize<'de> for Style {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match deserializer.deserialize_any(StyleValueVisitor)? {
            StyleValue::Object(style) => Ok(style),
            _ => Err(de::Error::custom("expected a style object")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut style = Style::new().with("color", "red").with("margin", 0);
        let _ = style.insert("color", "blue");
        let keys: Vec<_> = style.keys().collect();
        assert_eq!(keys, ["color", "margin"]);
        assert_eq!(style.get("color"), Some(&StyleValue::from("blue")));
    }

    #[test]
    fn test_json_keeps_key_order() {
        let style = Style::from_json_str(r#"{"z": 1, "a": {"y": "1", "b": null}}"#).unwrap();
        let keys: Vec<_> = style.keys().collect();
        assert_eq!(keys, ["z", "a"]);
        let nested = style.get("a").and_then(StyleValue::as_object).unwrap();
        assert_eq!(nested.keys().collect::<Vec<_>>(), ["y", "b"]);
        assert_eq!(nested.get("b"), Some(&StyleValue::Null));
    }

    #[test]
    fn test_json_rejects_non_object() {
        assert!(matches!(
            Style::from_json_str("[1, 2]"),
            Err(StyleParseError::NotAnObject { found: "array" })
        ));
    }

    #[test]
    fn test_functions_compare_by_reference() {
        let f = DynamicValue::new(|_| StyleValue::from("red"));
        let g = DynamicValue::new(|_| StyleValue::from("red"));
        assert_eq!(StyleValue::Function(f.clone()), StyleValue::Function(f.clone()));
        assert_ne!(StyleValue::Function(f), StyleValue::Function(g));
    }

    #[test]
    fn test_take_dynamic_splits_values() {
        let mut style = Style::new()
            .with("color", DynamicValue::new(|_| StyleValue::from("red")))
            .with("margin", 0);
        let dynamic = style.take_dynamic();
        assert_eq!(style.keys().collect::<Vec<_>>(), ["margin"]);
        assert_eq!(dynamic.keys().collect::<Vec<_>>(), ["color"]);
    }
}
