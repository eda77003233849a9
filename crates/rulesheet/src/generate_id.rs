//! Class name and keyframes name generation.
//!
//! The engine only needs a function `(key, sheet) -> name`. The default
//! implementation below counts rules per generator; embedders can supply
//! their own through [`crate::JssOptions::create_generate_id`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::rule::SheetRef;

/// A shared id generator.
///
/// Must be deterministic for a given `(key, sheet)` sequence within one
/// process run. Different sheets may produce different names for the same
/// key.
#[derive(Clone)]
pub struct GenerateId(Rc<dyn Fn(&str, Option<&SheetRef>) -> String>);

impl GenerateId {
    /// Wrap a generator function.
    #[must_use]
    pub fn new(f: impl Fn(&str, Option<&SheetRef>) -> String + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Generate a name for a rule key.
    #[must_use]
    pub fn generate(&self, key: &str, sheet: Option<&SheetRef>) -> String {
        (self.0)(key, sheet)
    }
}

impl fmt::Debug for GenerateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GenerateId(<fn>)")
    }
}

/// Options for the default generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdOptions {
    /// Emit short names (`c01`) instead of readable ones (`button-0-1`).
    pub minify: bool,
}

/// Factory producing a fresh generator, one per engine setup.
pub type CreateGenerateId = Rc<dyn Fn(IdOptions) -> GenerateId>;

/// Build the default generator.
///
/// Readable: `<prefix><key>-<engine id>-<counter>`.
/// Minified: `<prefix or "c"><engine id><counter>`.
#[must_use]
pub fn create_generate_id(options: IdOptions) -> GenerateId {
    let counter = Cell::new(0_u64);
    GenerateId::new(move |key, sheet| {
        counter.set(counter.get() + 1);
        let rule_counter = counter.get();
        let prefix = sheet
            .and_then(|s| s.class_name_prefix.as_deref())
            .unwrap_or_default();
        let engine_id = sheet.map_or(0, |s| s.jss_id);

        if options.minify {
            let prefix = if prefix.is_empty() { "c" } else { prefix };
            return format!("{prefix}{engine_id}{rule_counter}");
        }
        format!("{prefix}{key}-{engine_id}-{rule_counter}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_ref(prefix: Option<&str>) -> SheetRef {
        SheetRef {
            id: 3,
            jss_id: 2,
            link: false,
            class_name_prefix: prefix.map(str::to_string),
        }
    }

    #[test]
    fn test_readable_ids_count_up() {
        let generate = create_generate_id(IdOptions::default());
        let sheet = sheet_ref(None);
        assert_eq!(generate.generate("button", Some(&sheet)), "button-2-1");
        assert_eq!(generate.generate("title", Some(&sheet)), "title-2-2");
    }

    #[test]
    fn test_minified_ids_use_prefix() {
        let generate = create_generate_id(IdOptions { minify: true });
        assert_eq!(generate.generate("button", Some(&sheet_ref(Some("app-")))), "app-21");
        assert_eq!(generate.generate("button", None), "c02");
    }
}
