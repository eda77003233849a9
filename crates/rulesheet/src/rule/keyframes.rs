use rulesheet_common::escape::escape;
use rulesheet_common::warning::warn_once;

use super::{Rule, RuleKind, RuleOptions, RuleParent};
use crate::plugins::PluginsRegistry;
use crate::rule_list::{AddRuleOptions, RuleList, RuleListOptions};
use crate::to_css::{ToCssOptions, to_css};
use crate::value::Style;

const AT: &str = "@keyframes";
const NONAME: &str = "noname";

/// Extract the animation name from a `@keyframes <name>` key.
///
/// Returns `None` unless the at-keyword is followed by whitespace and at
/// least one word or `-` character.
#[must_use]
pub fn parse_keyframes_name(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(AT)?;
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    let end = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(trimmed.len());
    (end > 0).then(|| &trimmed[..end])
}

/// `@keyframes` container.
#[derive(Debug)]
pub struct KeyframesRule {
    name: String,
    id: String,
    pub(crate) rules: RuleList,
}

impl KeyframesRule {
    /// Build the container and its steps.
    ///
    /// The rule key becomes `keyframes-<name>`.
    #[must_use]
    pub fn create(key: &str, frames: &Style, options: &RuleOptions, plugins: &PluginsRegistry) -> Rule {
        let name = parse_keyframes_name(key).unwrap_or_else(|| {
            warn_once("KeyframesRule", &format!("bad keyframes name {key}"));
            NONAME
        });
        let rule_key = format!("keyframes-{name}");
        let id = if options.scoped {
            escape(&options.generate_id.generate(name, options.sheet.as_ref()))
        } else {
            name.to_string()
        };

        let mut rules = RuleList::new(RuleListOptions {
            parent: RuleParent::Keyframes,
            ..RuleListOptions::from_rule(options)
        });
        for (step, value) in frames.iter() {
            if let Err(err) = rules.add(plugins, step, value, AddRuleOptions::default()) {
                warn_once("KeyframesRule", &err.to_string());
            }
        }
        rules.process(plugins);

        let kind = RuleKind::Keyframes(Self {
            name: name.to_string(),
            id,
            rules,
        });
        Rule::new(rule_key, kind, options.clone())
    }

    /// Name as written in the key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Animation name used in the output.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Steps.
    #[must_use]
    pub const fn rules(&self) -> &RuleList {
        &self.rules
    }

    pub(crate) fn to_css(&self, options: &ToCssOptions) -> String {
        let indent = options.indent.unwrap_or(0);
        let pad = options.pad(indent);
        if !options.children {
            return format!("{pad}{AT} {} {{}}", self.id);
        }
        let linebreak = options.linebreak();
        let mut children = self.rules.to_css(&options.indented(indent + 1));
        if !children.is_empty() {
            children = format!("{linebreak}{children}{linebreak}{pad}");
        }
        format!("{pad}{AT} {} {{{children}}}", self.id)
    }
}

/// One step (`from`, `to`, `50%`) of a keyframes rule.
#[derive(Debug)]
pub struct KeyframeRule {
    pub(crate) style: Style,
    pub(crate) dynamic: Style,
}

impl KeyframeRule {
    /// Build a step.
    #[must_use]
    pub fn new(mut style: Style) -> Self {
        let dynamic = style.take_dynamic();
        Self { style, dynamic }
    }

    pub(crate) fn to_css(&self, key: &str, options: &ToCssOptions, link: bool) -> String {
        let options = if link { options.allowing_empty() } else { *options };
        to_css(Some(key), &self.style, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keyframes_name() {
        assert_eq!(parse_keyframes_name("@keyframes fade"), Some("fade"));
        assert_eq!(parse_keyframes_name("@keyframes   slide-in extra"), Some("slide-in"));
        assert_eq!(parse_keyframes_name("@keyframes"), None);
        assert_eq!(parse_keyframes_name("@keyframesfade"), None);
        assert_eq!(parse_keyframes_name("@keyframes %%"), None);
    }
}
