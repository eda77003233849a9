//! Core rule types, registered in the internal queue of every engine.

use rulesheet_common::warning::warn_once;

use super::Plugin;
use crate::rule::{
    CONDITIONAL_AT_RULES, ConditionalRule, FontFaceRule, KeyframeRule, KeyframesRule, NameMap,
    Rule, RuleKind, RuleParent, RuleType, SIMPLE_AT_RULES, SimpleRule, StyleRule,
    VIEWPORT_AT_RULES, ViewportRule,
};
use crate::value::StyleValue;

const ANIMATION_PROPS: [&str; 2] = ["animation-name", "animation"];

/// Internal plugins in the order they are consulted.
#[must_use]
pub fn internal_plugins() -> Vec<Plugin> {
    vec![
        style_rule_plugin(),
        conditional_rule_plugin(),
        keyframes_rule_plugin(),
        keyframe_rule_plugin(),
        font_face_rule_plugin(),
        viewport_rule_plugin(),
        simple_rule_plugin(),
    ]
}

/// Object or function declarations under a plain key.
#[must_use]
pub fn style_rule_plugin() -> Plugin {
    Plugin::new("style-rule").on_create_rule(|key, decl, options, _| {
        if key.starts_with('@') || options.parent == RuleParent::Keyframes {
            return None;
        }
        let kind = match decl {
            StyleValue::Object(style) => StyleRule::new(key, style.clone(), options),
            StyleValue::Function(f) => StyleRule::from_function(key, f.clone(), options),
            _ => return None,
        };
        Some(Rule::new(key, RuleKind::Style(kind), options.clone()))
    })
}

/// `@media`, `@supports`, `@container`.
#[must_use]
pub fn conditional_rule_plugin() -> Plugin {
    Plugin::new("conditional-rule").on_create_rule(|key, decl, options, plugins| {
        if !CONDITIONAL_AT_RULES.iter().any(|at| key.starts_with(at)) {
            return None;
        }
        let styles = decl.as_object()?;
        Some(ConditionalRule::create(key, styles, options, plugins))
    })
}

/// `@keyframes <name>`, plus `$name` references in animation properties.
#[must_use]
pub fn keyframes_rule_plugin() -> Plugin {
    Plugin::new("keyframes-rule")
        .on_create_rule(|key, decl, options, plugins| {
            let rest = key.strip_prefix("@keyframes")?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let frames = decl.as_object()?;
            Some(KeyframesRule::create(key, frames, options, plugins))
        })
        .on_process_style(|mut style, rule, sheet| {
            if rule.rule_type() != RuleType::Style || sheet.is_none() {
                return style;
            }
            let keyframes = &rule.options().keyframes;
            for prop in ANIMATION_PROPS {
                if let Some(value) = style.get_mut(prop) {
                    *value = replace_keyframes_refs(std::mem::replace(value, StyleValue::Null), keyframes);
                }
            }
            style
        })
        .on_change_value(|value, prop, rule| {
            if rule.options().sheet.is_none() || !ANIMATION_PROPS.contains(&prop) {
                return value;
            }
            replace_keyframes_refs(value, &rule.options().keyframes)
        })
}

/// Substitute every `$name` in a string value with the registered animation
/// name. Unknown references are left as written.
fn replace_keyframes_refs(value: StyleValue, keyframes: &NameMap) -> StyleValue {
    let StyleValue::String(text) = value else {
        return value;
    };
    if !text.contains('$') {
        return StyleValue::String(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after.len());
        let name = &after[..end];
        match keyframes.get(name) {
            Some(id) if !name.is_empty() => out.push_str(&id),
            _ => {
                if !name.is_empty() {
                    warn_once("KeyframesRule", &format!("referenced keyframes rule \"{name}\" is not defined"));
                }
                out.push('$');
                out.push_str(name);
            }
        }
        rest = &after[end..];
    }
    out.push_str(rest);
    StyleValue::String(out)
}

/// Steps inside `@keyframes`.
#[must_use]
pub fn keyframe_rule_plugin() -> Plugin {
    Plugin::new("keyframe-rule").on_create_rule(|key, decl, options, _| {
        if options.parent != RuleParent::Keyframes {
            return None;
        }
        let style = decl.as_object()?.clone();
        Some(Rule::new(key, RuleKind::Keyframe(KeyframeRule::new(style)), options.clone()))
    })
}

/// `@font-face`, one block or an array of blocks.
#[must_use]
pub fn font_face_rule_plugin() -> Plugin {
    Plugin::new("font-face-rule").on_create_rule(|key, decl, options, _| {
        if !key.starts_with("@font-face") {
            return None;
        }
        let rule = FontFaceRule::from_value(decl)?;
        Some(Rule::new(key, RuleKind::FontFace(rule), options.clone()))
    })
}

/// `@viewport` and `@-ms-viewport`.
#[must_use]
pub fn viewport_rule_plugin() -> Plugin {
    Plugin::new("viewport-rule").on_create_rule(|key, decl, options, _| {
        if !VIEWPORT_AT_RULES.contains(&key) {
            return None;
        }
        let style = decl.as_object()?.clone();
        Some(Rule::new(key, RuleKind::Viewport(ViewportRule::new(style)), options.clone()))
    })
}

/// `@charset`, `@import`, `@namespace`.
#[must_use]
pub fn simple_rule_plugin() -> Plugin {
    Plugin::new("simple-rule").on_create_rule(|key, decl, options, _| {
        if !SIMPLE_AT_RULES.contains(&key) {
            return None;
        }
        let rule = SimpleRule::from_value(decl)?;
        Some(Rule::new(key, RuleKind::Simple(rule), options.clone()))
    })
}
