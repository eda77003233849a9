//! Ordered, keyed rule collection.
//!
//! Used for a sheet's top-level rules and for the children of container
//! rules. Keeps three views in sync: key → rule, ordered keys, and an alias
//! table from selectors (and raw names that were rewritten into a different
//! key) to keys. Registration and unregistration also maintain the sheet's
//! shared class and keyframes tables.

use std::collections::HashMap;

use rulesheet_common::escape::escape;
use rulesheet_common::warning::{TARGET, warn_once};
use serde::Deserialize;
use serde_json::Value;

use crate::error::RuleError;
use crate::factory::create_rule;
use crate::generate_id::GenerateId;
use crate::plugins::PluginsRegistry;
use crate::renderer::{RenderHandle, Renderer};
use crate::rule::{NameMap, PropChange, Rule, RuleKind, RuleOptions, RuleParent, SheetRef};
use crate::to_css::ToCssOptions;
use crate::value::{Style, StyleValue};

/// Settings shared by every rule created in one list.
#[derive(Debug, Clone)]
pub struct RuleListOptions {
    /// What the list belongs to.
    pub parent: RuleParent,
    /// Owning sheet.
    pub sheet: Option<SheetRef>,
    /// Generate class names.
    pub scoped: bool,
    /// Shared key → class name table.
    pub classes: NameMap,
    /// Shared keyframes name → animation name table.
    pub keyframes: NameMap,
    /// Name generator.
    pub generate_id: GenerateId,
}

impl RuleListOptions {
    /// Inherit everything from the options of a container rule.
    #[must_use]
    pub fn from_rule(options: &RuleOptions) -> Self {
        Self {
            parent: options.parent,
            sheet: options.sheet.clone(),
            scoped: options.scoped,
            classes: options.classes.clone(),
            keyframes: options.keyframes.clone(),
            generate_id: options.generate_id.clone(),
        }
    }
}

/// Per-call options for adding a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddRuleOptions {
    /// Position to insert at. Appends when absent or out of range.
    pub index: Option<usize>,
    /// Explicit selector.
    pub selector: Option<String>,
}

/// Options for dynamic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateOptions {
    /// Run value-change and style-processing hooks on new values.
    pub process: bool,
    /// Write values even when they are equal to the current ones.
    pub force: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            process: true,
            force: false,
        }
    }
}

/// What an update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Properties pushed to native rules.
    pub rendered: usize,
    /// Properties changed on rules without a native handle.
    pub local: usize,
}

impl UpdateSummary {
    /// Total number of changed properties.
    #[must_use]
    pub const fn changed(&self) -> usize {
        self.rendered + self.local
    }

    const fn record(&mut self, change: PropChange) {
        match change {
            PropChange::Unchanged => {}
            PropChange::Rendered => self.rendered += 1,
            PropChange::Local => self.local += 1,
        }
    }

    const fn merge(&mut self, other: Self) {
        self.rendered += other.rendered;
        self.local += other.local;
    }
}

/// Ordered rule collection.
#[derive(Debug)]
pub struct RuleList {
    options: RuleListOptions,
    map: HashMap<String, Rule>,
    aliases: HashMap<String, String>,
    index: Vec<String>,
}

impl RuleList {
    /// Create an empty list.
    #[must_use]
    pub fn new(options: RuleListOptions) -> Self {
        Self {
            options,
            map: HashMap::new(),
            aliases: HashMap::new(),
            index: Vec::new(),
        }
    }

    /// List settings.
    #[must_use]
    pub const fn options(&self) -> &RuleListOptions {
        &self.options
    }

    /// Create a rule and register it.
    ///
    /// Does not run processing hooks. Returns `Ok(None)` when no plugin and
    /// no fallback could build a rule from the declaration. A failed add
    /// leaves the list untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateKey`] when the key is already taken.
    pub fn add(
        &mut self,
        plugins: &PluginsRegistry,
        name: &str,
        decl: &StyleValue,
        options: AddRuleOptions,
    ) -> Result<Option<&mut Rule>, RuleError> {
        if self.map.contains_key(name) || self.aliases.contains_key(name) {
            return Err(duplicate(name));
        }

        let rule_options = self.rule_options(name, &options);
        let Some(rule) = create_rule(plugins, Some(name), decl, &rule_options) else {
            return Ok(None);
        };
        let key = rule.key().to_string();
        if key != name && self.map.contains_key(&key) {
            return Err(duplicate(&key));
        }

        let position = options.index.map_or(self.index.len(), |i| i.min(self.index.len()));
        self.insert_at(position, name, rule);
        Ok(self.map.get_mut(&key))
    }

    /// Replace the rule at `name`, keeping its position. Adds a new rule
    /// when nothing is registered under `name`.
    ///
    /// The old rule is gone afterwards even if no new rule could be
    /// created. On a key collision the old rule is restored.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateKey`] when the new key collides with
    /// another rule.
    pub fn replace(
        &mut self,
        plugins: &PluginsRegistry,
        name: &str,
        decl: &StyleValue,
        options: AddRuleOptions,
    ) -> Result<Option<&mut Rule>, RuleError> {
        let Some(old_key) = self.resolve_key(name).map(str::to_string) else {
            return self.add(plugins, name, decl, options);
        };
        let position = self.index_of(&old_key);
        let old_name = self
            .aliases
            .iter()
            .find(|(alias, key)| **key == old_key && alias.starts_with('@'))
            .map_or_else(|| old_key.clone(), |(alias, _)| alias.clone());
        let old = self.remove(&old_key);

        let options = AddRuleOptions {
            index: options.index.or(position),
            ..options
        };
        let added = self
            .add(plugins, name, decl, options)
            .map(|rule| rule.map(|rule| rule.key().to_string()));
        match added {
            Ok(Some(key)) => Ok(self.map.get_mut(&key)),
            Ok(None) => Ok(None),
            Err(err) => {
                if let Some(old) = old {
                    self.insert_at(position.unwrap_or(self.index.len()), &old_name, old);
                }
                Err(err)
            }
        }
    }

    /// Look up a rule by key, selector or original name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.resolve_key(name).and_then(|key| self.map.get(key))
    }

    /// Look up a rule mutably by key, selector or original name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Rule> {
        let key = self.resolve_key(name)?.to_string();
        self.map.get_mut(&key)
    }

    /// Map a key, selector or original name to the registered key.
    #[must_use]
    pub fn resolve_key(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.map.get_key_value(name) {
            return Some(key);
        }
        self.aliases.get(name).map(String::as_str)
    }

    /// Remove a rule by key, selector or original name.
    pub fn remove(&mut self, name: &str) -> Option<Rule> {
        let key = self.resolve_key(name)?.to_string();
        let rule = self.map.remove(&key)?;
        self.index.retain(|k| *k != key);
        self.unregister(&rule);
        Some(rule)
    }

    /// Position of a rule.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let key = self.resolve_key(name)?;
        self.index.iter().position(|k| k == key)
    }

    /// Number of rules before `name` that already have a native handle:
    /// the position the native side expects for it.
    #[must_use]
    pub fn native_index(&self, name: &str) -> usize {
        let Some(position) = self.index_of(name) else {
            return 0;
        };
        self.index[..position]
            .iter()
            .filter(|key| self.map.get(*key).and_then(Rule::renderable).is_some())
            .count()
    }

    /// Rules in order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.index.iter().filter_map(|key| self.map.get(key))
    }

    /// Keys in order.
    #[must_use]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.iter().map(String::as_str)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether any rule, nested ones included, holds function or stream
    /// values or computes its style from update data.
    #[must_use]
    pub fn has_dynamic(&self) -> bool {
        self.iter().any(|rule| {
            rule.function_style().is_some()
                || rule.dynamic().is_some_and(|dynamic| !dynamic.is_empty())
                || rule.rules().is_some_and(Self::has_dynamic)
        })
    }

    /// Run processing hooks over every rule in order.
    pub fn process(&mut self, plugins: &PluginsRegistry) {
        for key in &self.index {
            if let Some(rule) = self.map.get_mut(key) {
                plugins.on_process_rule(rule);
            }
        }
    }

    /// Serialize all rules, joined by line breaks.
    ///
    /// Empty rules are skipped. In link mode empty leaf rules are kept as
    /// placeholders; empty containers are still skipped.
    #[must_use]
    pub fn to_css(&self, options: &ToCssOptions) -> String {
        let link = self.options.sheet.as_ref().is_some_and(|sheet| sheet.link);
        let mut css = String::new();
        for rule in self.iter() {
            let rule_css = rule.to_css(options);
            if rule_css.is_empty() && (!link || rule.rules().is_some()) {
                continue;
            }
            if !css.is_empty() {
                css.push_str(options.linebreak());
            }
            css.push_str(&rule_css);
        }
        css
    }

    /// Re-evaluate every rule against update data.
    pub fn update(
        &mut self,
        plugins: &PluginsRegistry,
        data: &Value,
        mut renderer: Option<&mut (dyn Renderer + '_)>,
        options: UpdateOptions,
    ) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        for key in &self.index {
            if let Some(rule) = self.map.get_mut(key) {
                summary.merge(update_rule(rule, plugins, data, renderer.as_deref_mut(), options));
            }
        }
        summary
    }

    /// Re-evaluate one rule. Containers update all their children.
    pub fn update_one(
        &mut self,
        name: &str,
        plugins: &PluginsRegistry,
        data: &Value,
        renderer: Option<&mut (dyn Renderer + '_)>,
        options: UpdateOptions,
    ) -> UpdateSummary {
        self.get_mut(name)
            .map(|rule| update_rule(rule, plugins, data, renderer, options))
            .unwrap_or_default()
    }

    /// Change the selector of a style rule, keeping the alias table and the
    /// native rule in sync.
    pub fn set_selector(
        &mut self,
        name: &str,
        selector: &str,
        renderer: Option<&mut (dyn Renderer + '_)>,
    ) -> bool {
        let Some(key) = self.resolve_key(name).map(str::to_string) else {
            return false;
        };
        let Some(rule) = self.map.get_mut(&key) else {
            return false;
        };
        let RuleKind::Style(style) = rule.kind_mut() else {
            return false;
        };
        let previous = style.selector().to_string();
        style.set_selector(selector);
        let _ = self.aliases.remove(&previous);
        let _ = self.aliases.insert(selector.to_string(), key);

        if let (Some(handle), Some(renderer)) = (rule.renderable(), renderer) {
            if !renderer.set_selector(handle, selector) {
                let css = rule.to_css(&ToCssOptions::default());
                rule.set_renderable(renderer.replace_rule(handle, &css));
            }
        }
        true
    }

    /// Insert every rule that has no native handle yet. Returns how many
    /// rules were inserted.
    pub(crate) fn render(&mut self, renderer: &mut dyn Renderer, parent: Option<RenderHandle>) -> usize {
        let mut position = 0;
        let mut inserted = 0;
        for key in &self.index {
            let Some(rule) = self.map.get_mut(key) else {
                continue;
            };
            if rule.renderable().is_none() {
                if !render_rule(rule, renderer, Some(position), parent) {
                    continue;
                }
                inserted += 1;
            }
            position += 1;
        }
        inserted
    }

    /// Forget every native handle, recursively. The native side was
    /// rewritten wholesale.
    pub(crate) fn clear_renderables(&mut self) {
        for rule in self.map.values_mut() {
            rule.set_renderable(None);
            if let Some(rules) = rule.rules_mut() {
                rules.clear_renderables();
            }
        }
    }

    fn rule_options(&self, name: &str, options: &AddRuleOptions) -> RuleOptions {
        let selector = options.selector.clone().or_else(|| {
            self.options
                .classes
                .get(name)
                .map(|class| format!(".{}", escape(&class)))
        });
        RuleOptions {
            selector,
            scoped: self.options.scoped,
            sheet: self.options.sheet.clone(),
            index: options.index,
            parent: self.options.parent,
            classes: self.options.classes.clone(),
            keyframes: self.options.keyframes.clone(),
            generate_id: self.options.generate_id.clone(),
            name: Some(name.to_string()),
        }
    }

    fn insert_at(&mut self, position: usize, name: &str, rule: Rule) {
        let key = rule.key().to_string();
        self.register(&rule, name);
        self.index.insert(position.min(self.index.len()), key.clone());
        let _ = self.map.insert(key, rule);
    }

    fn register(&mut self, rule: &Rule, name: &str) {
        let key = rule.key();
        if name != key {
            let _ = self.aliases.insert(name.to_string(), key.to_string());
        }
        match rule.kind() {
            RuleKind::Style(style) => {
                let _ = self.aliases.insert(style.selector().to_string(), key.to_string());
                if let Some(id) = style.id() {
                    if !self.options.classes.contains(key) {
                        self.options.classes.insert(key, id);
                    }
                }
            }
            RuleKind::Keyframes(keyframes) => {
                self.options.keyframes.insert(keyframes.name(), keyframes.id());
            }
            _ => {}
        }
    }

    fn unregister(&mut self, rule: &Rule) {
        let key = rule.key();
        self.aliases.retain(|_, k| k != key);
        match rule.kind() {
            RuleKind::Style(style) => {
                if style.id().is_some() && self.options.classes.get(key).as_deref() == style.id() {
                    self.options.classes.remove(key);
                }
            }
            RuleKind::Keyframes(keyframes) => self.options.keyframes.remove(keyframes.name()),
            _ => {}
        }
    }
}

fn duplicate(key: &str) -> RuleError {
    warn_once("RuleList", &format!("rule {key} already exists"));
    RuleError::DuplicateKey { key: key.to_string() }
}

/// Insert one rule natively, then its children into it.
pub(crate) fn render_rule(
    rule: &mut Rule,
    renderer: &mut dyn Renderer,
    index: Option<usize>,
    parent: Option<RenderHandle>,
) -> bool {
    let options = if rule.rules().is_some() {
        ToCssOptions::default().without_children()
    } else {
        ToCssOptions::default()
    };
    let css = rule.to_css(&options);
    let Some(handle) = renderer.insert_rule(&css, index, parent) else {
        log::debug!(target: TARGET, "renderer rejected rule {}", rule.key());
        return false;
    };
    rule.set_renderable(Some(handle));
    if let Some(rules) = rule.rules_mut() {
        let _ = rules.render(renderer, Some(handle));
    }
    true
}

fn update_rule(
    rule: &mut Rule,
    plugins: &PluginsRegistry,
    data: &Value,
    mut renderer: Option<&mut (dyn Renderer + '_)>,
    options: UpdateOptions,
) -> UpdateSummary {
    if let Some(rules) = rule.rules_mut() {
        return rules.update(plugins, data, renderer, options);
    }

    let mut summary = UpdateSummary::default();
    let sheet = rule.options().sheet.clone();
    plugins.on_update(data, rule, sheet.as_ref(), options);

    if let Some(compute) = rule.function_style().cloned() {
        let next = match compute.call(data) {
            StyleValue::Object(style) => style,
            _ => Style::new(),
        };
        let next = if options.process {
            plugins.process_style(next, rule)
        } else {
            next
        };
        let stale: Vec<String> = rule
            .style()
            .map(|style| {
                style
                    .keys()
                    .filter(|prop| !next.contains_key(prop))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        for prop in stale {
            summary.record(rule.set_prop(plugins, renderer.as_deref_mut(), &prop, StyleValue::Null, options));
        }
        for (prop, value) in next {
            summary.record(rule.set_prop(plugins, renderer.as_deref_mut(), &prop, value, options));
        }
    }

    if let Some(dynamic) = rule.dynamic().cloned() {
        for (prop, source) in dynamic.iter() {
            if let Some(value) = source.resolve(data) {
                summary.record(rule.set_prop(plugins, renderer.as_deref_mut(), prop, value, options));
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_id::{IdOptions, create_generate_id};
    use crate::plugins::{Queue, internal_plugins};

    fn plugins() -> PluginsRegistry {
        let mut plugins = PluginsRegistry::new();
        for plugin in internal_plugins() {
            plugins.use_plugin(plugin, Queue::Internal);
        }
        plugins
    }

    fn list() -> RuleList {
        RuleList::new(RuleListOptions {
            parent: RuleParent::Sheet,
            sheet: None,
            scoped: true,
            classes: NameMap::new(),
            keyframes: NameMap::new(),
            generate_id: create_generate_id(IdOptions::default()),
        })
    }

    fn red() -> StyleValue {
        StyleValue::Object(Style::new().with("color", "red"))
    }

    #[test]
    fn test_add_registers_class_and_selector() {
        let plugins = plugins();
        let mut rules = list();
        let _ = rules.add(&plugins, "a", &red(), AddRuleOptions::default()).unwrap();
        assert_eq!(rules.options().classes.get("a").as_deref(), Some("a-0-1"));
        assert_eq!(rules.get(".a-0-1").map(Rule::key), Some("a"));
    }

    #[test]
    fn test_failed_add_leaves_list_untouched() {
        let plugins = plugins();
        let mut rules = list();
        let _ = rules.add(&plugins, "a", &red(), AddRuleOptions::default()).unwrap();
        let err = rules.add(&plugins, "a", &red(), AddRuleOptions::default()).unwrap_err();
        assert_eq!(err, RuleError::DuplicateKey { key: "a".to_string() });
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get("a").and_then(Rule::selector), Some(".a-0-1"));
    }

    #[test]
    fn test_index_clamps_to_end() {
        let plugins = plugins();
        let mut rules = list();
        let _ = rules.add(&plugins, "a", &red(), AddRuleOptions::default()).unwrap();
        let options = AddRuleOptions {
            index: Some(10),
            ..AddRuleOptions::default()
        };
        let _ = rules.add(&plugins, "b", &red(), options).unwrap();
        let options = AddRuleOptions {
            index: Some(0),
            ..AddRuleOptions::default()
        };
        let _ = rules.add(&plugins, "c", &red(), options).unwrap();
        assert_eq!(rules.keys().collect::<Vec<_>>(), ["c", "a", "b"]);
    }

    #[test]
    fn test_keyframes_alias_and_table() {
        let plugins = plugins();
        let mut rules = list();
        let frames = StyleValue::Object(Style::new().with("to", Style::new().with("opacity", 1)));
        let _ = rules.add(&plugins, "@keyframes spin", &frames, AddRuleOptions::default()).unwrap();
        assert_eq!(rules.resolve_key("@keyframes spin"), Some("keyframes-spin"));
        assert!(rules.options().keyframes.contains("spin"));

        assert!(rules.remove("@keyframes spin").is_some());
        assert!(!rules.options().keyframes.contains("spin"));
        assert!(rules.resolve_key("@keyframes spin").is_none());
    }

    #[test]
    fn test_rewritten_key_collision() {
        let plugins = plugins();
        let mut rules = list();
        let _ = rules.add(&plugins, "keyframes-y", &red(), AddRuleOptions::default()).unwrap();
        let frames = StyleValue::Object(Style::new());
        let err = rules.add(&plugins, "@keyframes y", &frames, AddRuleOptions::default()).unwrap_err();
        assert_eq!(err, RuleError::DuplicateKey { key: "keyframes-y".to_string() });
        assert_eq!(rules.len(), 1);
        assert!(!rules.options().keyframes.contains("y"));
    }

    #[test]
    fn test_replace_keeps_position() {
        let plugins = plugins();
        let mut rules = list();
        let _ = rules.add(&plugins, "a", &red(), AddRuleOptions::default()).unwrap();
        let _ = rules.add(&plugins, "b", &red(), AddRuleOptions::default()).unwrap();
        let blue = StyleValue::Object(Style::new().with("color", "blue"));
        let _ = rules.replace(&plugins, "a", &blue, AddRuleOptions::default()).unwrap();
        assert_eq!(rules.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(rules.get("a").and_then(Rule::selector), Some(".a-0-3"));
    }
}
