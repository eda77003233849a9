//! Plugin pipeline.
//!
//! A plugin is a bundle of optional hooks. The registry keeps two queues
//! (internal, external) and a flattened per-hook list that is rebuilt on
//! every registration. Internal plugins run first, each queue in
//! registration order. The first `on_create_rule` hook returning a rule
//! wins; the other hooks all run in order.

mod builtin;

use std::fmt;
use std::rc::Rc;

pub use builtin::{
    conditional_rule_plugin, font_face_rule_plugin, internal_plugins, keyframe_rule_plugin,
    keyframes_rule_plugin, simple_rule_plugin, style_rule_plugin, viewport_rule_plugin,
};
use serde_json::Value;

use crate::rule::{Rule, RuleOptions, SheetRef};
use crate::rule_list::UpdateOptions;
use crate::sheet::StyleSheet;
use crate::value::{Style, StyleValue};

/// Build a rule for `(name, decl, options)` or decline with `None`.
pub type OnCreateRule = Rc<dyn Fn(&str, &StyleValue, &RuleOptions, &PluginsRegistry) -> Option<Rule>>;
/// Inspect or mutate a freshly created rule.
pub type OnProcessRule = Rc<dyn Fn(&mut Rule, Option<&SheetRef>)>;
/// Transform a rule's style. Each hook receives the previous hook's output.
pub type OnProcessStyle = Rc<dyn Fn(Style, &Rule, Option<&SheetRef>) -> Style>;
/// Inspect or mutate a sheet after its initial rules are added.
pub type OnProcessSheet = Rc<dyn Fn(&mut StyleSheet)>;
/// Transform a property value before it is stored. Chained like
/// [`OnProcessStyle`].
pub type OnChangeValue = Rc<dyn Fn(StyleValue, &str, &Rule) -> StyleValue>;
/// React to dynamic update data.
pub type OnUpdate = Rc<dyn Fn(&Value, &mut Rule, Option<&SheetRef>, &UpdateOptions)>;

/// Which queue a plugin is registered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Queue {
    /// Core rule types. Runs before every external plugin.
    Internal,
    /// User plugins.
    #[default]
    External,
}

/// A bundle of optional hooks.
#[derive(Clone, Default)]
pub struct Plugin {
    name: Option<String>,
    on_create_rule: Option<OnCreateRule>,
    on_process_rule: Option<OnProcessRule>,
    on_process_style: Option<OnProcessStyle>,
    on_process_sheet: Option<OnProcessSheet>,
    on_change_value: Option<OnChangeValue>,
    on_update: Option<OnUpdate>,
}

impl Plugin {
    /// Create a plugin with no hooks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Name given at construction, for diagnostics.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the rule-creation hook.
    #[must_use]
    pub fn on_create_rule(
        mut self,
        hook: impl Fn(&str, &StyleValue, &RuleOptions, &PluginsRegistry) -> Option<Rule> + 'static,
    ) -> Self {
        self.on_create_rule = Some(Rc::new(hook));
        self
    }

    /// Set the rule-processing hook.
    #[must_use]
    pub fn on_process_rule(mut self, hook: impl Fn(&mut Rule, Option<&SheetRef>) + 'static) -> Self {
        self.on_process_rule = Some(Rc::new(hook));
        self
    }

    /// Set the style-processing hook.
    #[must_use]
    pub fn on_process_style(mut self, hook: impl Fn(Style, &Rule, Option<&SheetRef>) -> Style + 'static) -> Self {
        self.on_process_style = Some(Rc::new(hook));
        self
    }

    /// Set the sheet-processing hook.
    #[must_use]
    pub fn on_process_sheet(mut self, hook: impl Fn(&mut StyleSheet) + 'static) -> Self {
        self.on_process_sheet = Some(Rc::new(hook));
        self
    }

    /// Set the value-change hook.
    #[must_use]
    pub fn on_change_value(mut self, hook: impl Fn(StyleValue, &str, &Rule) -> StyleValue + 'static) -> Self {
        self.on_change_value = Some(Rc::new(hook));
        self
    }

    /// Set the update hook.
    #[must_use]
    pub fn on_update(mut self, hook: impl Fn(&Value, &mut Rule, Option<&SheetRef>, &UpdateOptions) + 'static) -> Self {
        self.on_update = Some(Rc::new(hook));
        self
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("on_create_rule", &self.on_create_rule.is_some())
            .field("on_process_rule", &self.on_process_rule.is_some())
            .field("on_process_style", &self.on_process_style.is_some())
            .field("on_process_sheet", &self.on_process_sheet.is_some())
            .field("on_change_value", &self.on_change_value.is_some())
            .field("on_update", &self.on_update.is_some())
            .finish()
    }
}

#[derive(Clone, Default)]
struct Hooks {
    on_create_rule: Vec<OnCreateRule>,
    on_process_rule: Vec<OnProcessRule>,
    on_process_style: Vec<OnProcessStyle>,
    on_process_sheet: Vec<OnProcessSheet>,
    on_change_value: Vec<OnChangeValue>,
    on_update: Vec<OnUpdate>,
}

/// Ordered plugin registry.
///
/// Plugins are never deduplicated: registering the same plugin twice runs
/// its hooks twice.
#[derive(Clone, Default)]
pub struct PluginsRegistry {
    internal: Vec<Plugin>,
    external: Vec<Plugin>,
    hooks: Hooks,
}

impl PluginsRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin at the end of a queue.
    pub fn use_plugin(&mut self, plugin: Plugin, queue: Queue) {
        match queue {
            Queue::Internal => self.internal.push(plugin),
            Queue::External => self.external.push(plugin),
        }
        self.rebuild();
    }

    /// Internal plugins in order.
    #[must_use]
    pub fn internal(&self) -> &[Plugin] {
        &self.internal
    }

    /// External plugins in order.
    #[must_use]
    pub fn external(&self) -> &[Plugin] {
        &self.external
    }

    /// Whether any plugin reacts to update data.
    #[must_use]
    pub fn has_update_hooks(&self) -> bool {
        !self.hooks.on_update.is_empty()
    }

    fn rebuild(&mut self) {
        let mut hooks = Hooks::default();
        for plugin in self.internal.iter().chain(&self.external) {
            if let Some(hook) = &plugin.on_create_rule {
                hooks.on_create_rule.push(Rc::clone(hook));
            }
            if let Some(hook) = &plugin.on_process_rule {
                hooks.on_process_rule.push(Rc::clone(hook));
            }
            if let Some(hook) = &plugin.on_process_style {
                hooks.on_process_style.push(Rc::clone(hook));
            }
            if let Some(hook) = &plugin.on_process_sheet {
                hooks.on_process_sheet.push(Rc::clone(hook));
            }
            if let Some(hook) = &plugin.on_change_value {
                hooks.on_change_value.push(Rc::clone(hook));
            }
            if let Some(hook) = &plugin.on_update {
                hooks.on_update.push(Rc::clone(hook));
            }
        }
        self.hooks = hooks;
    }

    /// First rule any creation hook returns.
    #[must_use]
    pub fn on_create_rule(&self, name: &str, decl: &StyleValue, options: &RuleOptions) -> Option<Rule> {
        self.hooks
            .on_create_rule
            .iter()
            .find_map(|hook| hook(name, decl, options, self))
    }

    /// Run processing hooks once per rule: the rule hooks, then the style
    /// chain for rules that have a style.
    pub fn on_process_rule(&self, rule: &mut Rule) {
        if rule.is_processed() {
            return;
        }
        let sheet = rule.options().sheet.clone();
        for hook in &self.hooks.on_process_rule {
            hook(&mut *rule, sheet.as_ref());
        }
        if rule.style().is_some() {
            self.on_process_style(rule);
        }
        rule.mark_processed();
    }

    /// Run the style chain over a rule's own style.
    pub fn on_process_style(&self, rule: &mut Rule) {
        let Some(style) = rule.style_mut().map(std::mem::take) else {
            return;
        };
        let style = self.process_style(style, rule);
        rule.set_style(style);
    }

    /// Run the style chain over a detached style on behalf of `rule`.
    #[must_use]
    pub fn process_style(&self, style: Style, rule: &Rule) -> Style {
        let sheet = rule.options().sheet.as_ref();
        self.hooks
            .on_process_style
            .iter()
            .fold(style, |style, hook| hook(style, rule, sheet))
    }

    /// Run sheet hooks.
    pub fn on_process_sheet(&self, sheet: &mut StyleSheet) {
        for hook in &self.hooks.on_process_sheet {
            hook(&mut *sheet);
        }
    }

    /// Run the value chain.
    #[must_use]
    pub fn on_change_value(&self, value: StyleValue, prop: &str, rule: &Rule) -> StyleValue {
        self.hooks
            .on_change_value
            .iter()
            .fold(value, |value, hook| hook(value, prop, rule))
    }

    /// Run update hooks.
    pub fn on_update(&self, data: &Value, rule: &mut Rule, sheet: Option<&SheetRef>, options: UpdateOptions) {
        for hook in &self.hooks.on_update {
            hook(data, &mut *rule, sheet, &options);
        }
    }
}

impl fmt::Debug for PluginsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginsRegistry")
            .field("internal", &self.internal)
            .field("external", &self.external)
            .finish_non_exhaustive()
    }
}
