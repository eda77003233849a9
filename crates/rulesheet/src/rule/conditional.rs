use rulesheet_common::warning::warn_once;

use super::{Rule, RuleKind, RuleOptions, RuleParent};
use crate::error::RuleError;
use crate::plugins::PluginsRegistry;
use crate::rule_list::{AddRuleOptions, RuleList, RuleListOptions};
use crate::to_css::ToCssOptions;
use crate::value::{Style, StyleValue};

/// Keys handled as conditional group rules.
pub const CONDITIONAL_AT_RULES: [&str; 3] = ["@media", "@supports", "@container"];

/// `@media`, `@supports` and `@container` blocks.
#[derive(Debug)]
pub struct ConditionalRule {
    at: String,
    query: String,
    pub(crate) rules: RuleList,
}

impl ConditionalRule {
    /// Build the container and its nested rules.
    ///
    /// Nested style rules share the sheet's class table, so a nested `button`
    /// reuses the class of the top-level `button`.
    #[must_use]
    pub fn create(key: &str, styles: &Style, options: &RuleOptions, plugins: &PluginsRegistry) -> Rule {
        let at = key
            .strip_prefix('@')
            .and_then(|rest| {
                let end = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
                    .unwrap_or(rest.len());
                (end > 0).then(|| rest[..end].to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let mut rules = RuleList::new(RuleListOptions {
            parent: RuleParent::Conditional,
            ..RuleListOptions::from_rule(options)
        });
        for (name, value) in styles.iter() {
            if let Err(err) = rules.add(plugins, name, value, AddRuleOptions::default()) {
                warn_once("ConditionalRule", &err.to_string());
            }
        }
        rules.process(plugins);

        let kind = RuleKind::Conditional(Self {
            at,
            query: options.name.clone().unwrap_or_else(|| key.to_string()),
            rules,
        });
        Rule::new(key, kind, options.clone())
    }

    /// At-keyword without `@` (`media`).
    #[must_use]
    pub fn at(&self) -> &str {
        &self.at
    }

    /// Full prelude (`@media print`).
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Nested rules.
    #[must_use]
    pub const fn rules(&self) -> &RuleList {
        &self.rules
    }

    /// Look up a nested rule.
    #[must_use]
    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Position of a nested rule.
    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.rules.index_of(key)
    }

    /// Create, register and process a nested rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateKey`] when the key is taken.
    pub fn add_rule(
        &mut self,
        plugins: &PluginsRegistry,
        name: &str,
        style: &StyleValue,
        options: AddRuleOptions,
    ) -> Result<Option<&mut Rule>, RuleError> {
        let Some(key) = self.rules.add(plugins, name, style, options)?.map(|rule| rule.key().to_string()) else {
            return Ok(None);
        };
        if let Some(rule) = self.rules.get_mut(&key) {
            plugins.on_process_rule(rule);
        }
        Ok(self.rules.get_mut(&key))
    }

    /// Swap a nested rule for a new one at the same position.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateKey`] when the replacement key collides
    /// with another nested rule.
    pub fn replace_rule(
        &mut self,
        plugins: &PluginsRegistry,
        name: &str,
        style: &StyleValue,
        options: AddRuleOptions,
    ) -> Result<Option<&mut Rule>, RuleError> {
        let Some(key) = self.rules.replace(plugins, name, style, options)?.map(|rule| rule.key().to_string()) else {
            return Ok(None);
        };
        if let Some(rule) = self.rules.get_mut(&key) {
            plugins.on_process_rule(rule);
        }
        Ok(self.rules.get_mut(&key))
    }

    pub(crate) fn to_css(&self, options: &ToCssOptions) -> String {
        let indent = options.indent.unwrap_or(0);
        let pad = options.pad(indent);
        if !options.children {
            return format!("{pad}{} {{}}", self.query);
        }
        let children = self.rules.to_css(&options.indented(indent + 1));
        if children.is_empty() {
            return String::new();
        }
        let linebreak = options.linebreak();
        format!("{pad}{} {{{linebreak}{children}{linebreak}{pad}}}", self.query)
    }
}
