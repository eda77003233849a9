//! Rule factory.
//!
//! Asks the plugin chain to build a rule and falls back to a plain style
//! rule for object declarations under a non-`@` key.

use rulesheet_common::warning::{TARGET, warn_once};

use crate::clone::clone_style;
use crate::plugins::PluginsRegistry;
use crate::rule::{KeyframeRule, Rule, RuleKind, RuleOptions, RuleParent, StyleRule};
use crate::value::StyleValue;

/// Key used when a rule is created without a name.
pub const ANONYMOUS_KEY: &str = "unnamed";

/// Build a rule from a declaration.
///
/// The declaration is deep-copied first, so the caller's value is never
/// shared with the rule. Returns `None` (with a warning for unknown
/// at-rules) when nothing can build a rule.
#[must_use]
pub fn create_rule(
    plugins: &PluginsRegistry,
    name: Option<&str>,
    decl: &StyleValue,
    options: &RuleOptions,
) -> Option<Rule> {
    let name = name.unwrap_or(ANONYMOUS_KEY);
    let decl = clone_style(decl);

    if let Some(rule) = plugins.on_create_rule(name, &decl, options) {
        return Some(rule);
    }

    if name.starts_with('@') {
        warn_once("Rule", &format!("unknown rule {name}"));
        return None;
    }

    match decl {
        StyleValue::Object(style) if options.parent == RuleParent::Keyframes => Some(Rule::new(
            name,
            RuleKind::Keyframe(KeyframeRule::new(style)),
            options.clone(),
        )),
        StyleValue::Object(style) => Some(Rule::new(
            name,
            RuleKind::Style(StyleRule::new(name, style, options)),
            options.clone(),
        )),
        StyleValue::Function(f) => Some(Rule::new(
            name,
            RuleKind::Style(StyleRule::from_function(name, f, options)),
            options.clone(),
        )),
        _ => {
            log::debug!(target: TARGET, "no rule created for {name}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_id::{IdOptions, create_generate_id};
    use crate::rule::RuleType;
    use crate::value::Style;

    fn options() -> RuleOptions {
        RuleOptions::new(create_generate_id(IdOptions::default()))
    }

    #[test]
    fn test_fallback_style_rule() {
        let plugins = PluginsRegistry::new();
        let decl = StyleValue::Object(Style::new().with("color", "red"));
        let rule = create_rule(&plugins, Some("button"), &decl, &options()).unwrap();
        assert_eq!(rule.rule_type(), RuleType::Style);
        assert_eq!(rule.key(), "button");
        assert_eq!(rule.selector(), Some(".button-0-1"));
    }

    #[test]
    fn test_unknown_at_rule_is_skipped() {
        let plugins = PluginsRegistry::new();
        let decl = StyleValue::Object(Style::new());
        assert!(create_rule(&plugins, Some("@unknown-thing"), &decl, &options()).is_none());
        assert!(rulesheet_common::warning::was_warned("Rule", "unknown rule @unknown-thing"));
    }

    #[test]
    fn test_anonymous_key() {
        let plugins = PluginsRegistry::new();
        let decl = StyleValue::Object(Style::new().with("color", "red"));
        let rule = create_rule(&plugins, None, &decl, &options()).unwrap();
        assert_eq!(rule.key(), ANONYMOUS_KEY);
    }

    #[test]
    fn test_declaration_is_copied() {
        let plugins = PluginsRegistry::new();
        let decl = StyleValue::Object(Style::new().with("color", "red"));
        let mut rule = create_rule(&plugins, Some("a"), &decl, &options()).unwrap();
        let _ = rule.style_mut().unwrap().insert("color", "blue");
        assert_eq!(decl.as_object().unwrap().get("color"), Some(&StyleValue::from("red")));
    }
}
