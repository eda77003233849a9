//! Style sheets.
//!
//! A sheet owns a top-level [`RuleList`], the shared class and keyframes
//! tables and, optionally, a [`Renderer`]. Before it is attached every change
//! only marks it as not deployed. Once attached, changes reach the native
//! side either per rule (rules with a native handle) or by redeploying the
//! whole serialized text.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use rulesheet_common::warning::{TARGET, warn_once};
use serde::Deserialize;
use serde_json::Value;

use crate::dynamic::extract_dynamic;
use crate::error::RuleError;
use crate::generate_id::GenerateId;
use crate::plugins::PluginsRegistry;
use crate::renderer::Renderer;
use crate::rule::{NameMap, PropChange, Rule, RuleParent, RuleType, SIMPLE_AT_RULES, SheetRef};
use crate::rule_list::{AddRuleOptions, RuleList, RuleListOptions, UpdateOptions, render_rule};
use crate::to_css::ToCssOptions;
use crate::value::{Style, StyleValue};

static SHEET_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Options for a new sheet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleSheetOptions {
    /// Media query for the native style element.
    pub media: Option<String>,
    /// Free-form label for the native style element.
    pub meta: Option<String>,
    /// Ordering hint among sheets. Defaults to one above the highest index
    /// handed out so far.
    pub index: Option<i32>,
    /// Link mode: rules map one-to-one onto native rules.
    pub link: bool,
    /// Prefix for generated class names.
    pub class_name_prefix: Option<String>,
    /// Generator overriding the engine's one.
    #[serde(skip)]
    pub generate_id: Option<GenerateId>,
}

pub(crate) struct SheetSetup {
    pub(crate) plugins: Rc<PluginsRegistry>,
    pub(crate) generate_id: GenerateId,
    pub(crate) renderer: Option<Box<dyn Renderer>>,
    pub(crate) jss_id: u32,
    pub(crate) index: i32,
}

/// A compiled style sheet.
pub struct StyleSheet {
    sheet_ref: SheetRef,
    options: StyleSheetOptions,
    index: i32,
    plugins: Rc<PluginsRegistry>,
    rules: RuleList,
    classes: NameMap,
    keyframes: NameMap,
    renderer: Option<Box<dyn Renderer>>,
    dynamic: Option<Style>,
    attached: bool,
    deployed: bool,
}

impl StyleSheet {
    pub(crate) fn new(styles: &Style, options: StyleSheetOptions, setup: SheetSetup) -> Self {
        let sheet_ref = SheetRef {
            id: SHEET_COUNTER.fetch_add(1, Ordering::Relaxed),
            jss_id: setup.jss_id,
            link: options.link,
            class_name_prefix: options.class_name_prefix.clone(),
        };
        let classes = NameMap::new();
        let keyframes = NameMap::new();
        let rules = RuleList::new(RuleListOptions {
            parent: RuleParent::Sheet,
            sheet: Some(sheet_ref.clone()),
            scoped: true,
            classes: classes.clone(),
            keyframes: keyframes.clone(),
            generate_id: options.generate_id.clone().unwrap_or(setup.generate_id),
        });

        let mut sheet = Self {
            sheet_ref,
            options,
            index: setup.index,
            plugins: setup.plugins,
            rules,
            classes,
            keyframes,
            renderer: setup.renderer,
            dynamic: extract_dynamic(styles),
            attached: false,
            deployed: false,
        };
        for (name, decl) in styles.iter() {
            if let Err(err) = sheet.rules.add(&sheet.plugins, name, decl, AddRuleOptions::default()) {
                log::debug!(target: TARGET, "skipped rule {name}: {err}");
            }
        }
        sheet.rules.process(&sheet.plugins);
        sheet
    }

    /// Sheet identity as seen by its rules.
    #[must_use]
    pub const fn sheet_ref(&self) -> &SheetRef {
        &self.sheet_ref
    }

    /// Creation options.
    #[must_use]
    pub const fn options(&self) -> &StyleSheetOptions {
        &self.options
    }

    /// Ordering index among sheets.
    #[must_use]
    pub const fn index(&self) -> i32 {
        self.index
    }

    /// Plugins this sheet was created with.
    #[must_use]
    pub fn plugins(&self) -> &PluginsRegistry {
        &self.plugins
    }

    /// Top-level rules.
    #[must_use]
    pub const fn rules(&self) -> &RuleList {
        &self.rules
    }

    /// Key → class name.
    #[must_use]
    pub fn classes(&self) -> BTreeMap<String, String> {
        self.classes.snapshot()
    }

    /// Class name generated for a key.
    #[must_use]
    pub fn class_name(&self, key: &str) -> Option<String> {
        self.classes.get(key)
    }

    /// Keyframes name → animation name.
    #[must_use]
    pub fn keyframes(&self) -> BTreeMap<String, String> {
        self.keyframes.snapshot()
    }

    /// Function- and stream-valued part of the creation styles, or `None`
    /// for a fully static sheet.
    #[must_use]
    pub const fn dynamic_styles(&self) -> Option<&Style> {
        self.dynamic.as_ref()
    }

    /// Whether the sheet is attached.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Whether the native side reflects the current rules.
    #[must_use]
    pub const fn is_deployed(&self) -> bool {
        self.deployed
    }

    /// The native side, if any.
    #[must_use]
    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    /// Attach to the document. Deploys first if needed. Idempotent.
    pub fn attach(&mut self) {
        if self.attached {
            return;
        }
        if let Some(renderer) = self.renderer.as_deref_mut() {
            renderer.attach();
        }
        self.attached = true;
        if !self.deployed {
            self.deploy();
        }
        log::debug!(target: TARGET, "attached sheet {}", self.sheet_ref.id);
    }

    /// Detach from the document. Idempotent.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        if let Some(renderer) = self.renderer.as_deref_mut() {
            renderer.detach();
        }
        self.attached = false;
        log::debug!(target: TARGET, "detached sheet {}", self.sheet_ref.id);
    }

    /// Push the rules to the native side.
    ///
    /// In link mode every rule without a native handle is inserted. Otherwise
    /// the whole serialized sheet replaces the native contents, which drops
    /// all native handles.
    pub fn deploy(&mut self) {
        if let Some(renderer) = self.renderer.as_deref_mut() {
            if self.sheet_ref.link {
                let _ = self.rules.render(renderer, None);
            } else {
                let css = self.rules.to_css(&ToCssOptions::default());
                renderer.deploy(&css);
                self.rules.clear_renderables();
            }
        }
        self.deployed = true;
    }

    /// Create, register and process a rule.
    ///
    /// Statement at-rules (`@import`, ...) without an explicit index are
    /// placed after the leading statement rules, ahead of everything else.
    /// On an attached sheet the new rule is inserted natively as well.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateKey`] when the key is taken.
    pub fn add_rule(
        &mut self,
        name: &str,
        decl: &StyleValue,
        options: AddRuleOptions,
    ) -> Result<Option<&mut Rule>, RuleError> {
        let mut options = options;
        if options.index.is_none() && SIMPLE_AT_RULES.contains(&name) {
            options.index = Some(
                self.rules
                    .iter()
                    .take_while(|rule| rule.rule_type() == RuleType::Simple)
                    .count(),
            );
        }

        let Some(key) = self
            .rules
            .add(&self.plugins, name, decl, options)?
            .map(|rule| rule.key().to_string())
        else {
            return Ok(None);
        };
        if let Some(rule) = self.rules.get_mut(&key) {
            self.plugins.on_process_rule(rule);
        }
        self.record_dynamic(name, decl);

        if self.attached {
            self.insert_native(&key);
        } else {
            self.deployed = false;
        }
        Ok(self.rules.get_mut(&key))
    }

    /// Add every entry of a styles object. Returns the keys that were added.
    pub fn add_rules(&mut self, styles: &Style) -> Vec<String> {
        let mut added = Vec::new();
        for (name, decl) in styles.iter() {
            match self.add_rule(name, decl, AddRuleOptions::default()) {
                Ok(Some(rule)) => added.push(rule.key().to_string()),
                Ok(None) => {}
                Err(err) => log::debug!(target: TARGET, "skipped rule {name}: {err}"),
            }
        }
        added
    }

    /// Replace a rule in place, or add it when nothing is registered under
    /// `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateKey`] when the new key collides with
    /// another rule.
    pub fn replace_rule(
        &mut self,
        name: &str,
        decl: &StyleValue,
        options: AddRuleOptions,
    ) -> Result<Option<&mut Rule>, RuleError> {
        let Some((old_key, old_handle)) = self
            .rules
            .get(name)
            .map(|rule| (rule.key().to_string(), rule.renderable()))
        else {
            return self.add_rule(name, decl, options);
        };
        let native_index = self.rules.native_index(&old_key);

        let replaced = self
            .rules
            .replace(&self.plugins, name, decl, options)?
            .map(|rule| rule.key().to_string());
        if let Some(rule) = replaced.as_deref().and_then(|key| self.rules.get_mut(key)) {
            self.plugins.on_process_rule(rule);
        }
        if let Some(dynamic) = self.dynamic.as_mut() {
            let _ = dynamic.remove(name);
        }
        if replaced.is_some() {
            self.record_dynamic(name, decl);
        }

        let mut resync = false;
        if !self.attached {
            self.deployed = false;
        } else if let (Some(handle), Some(renderer)) = (old_handle, self.renderer.as_deref_mut()) {
            match replaced.as_deref().and_then(|key| self.rules.get_mut(key)) {
                Some(rule) if rule.rules().is_none() => {
                    let css = rule.to_css(&ToCssOptions::default());
                    let next = renderer.replace_rule(handle, &css);
                    resync = next.is_none();
                    rule.set_renderable(next);
                }
                Some(rule) => {
                    if !renderer.delete_rule(handle) {
                        warn_once("StyleSheet", &format!("failed to delete native rule {old_key}"));
                    }
                    resync = !render_rule(rule, renderer, Some(native_index), None);
                }
                None => {
                    if !renderer.delete_rule(handle) {
                        warn_once("StyleSheet", &format!("failed to delete native rule {old_key}"));
                    }
                }
            }
        } else {
            self.deploy();
        }
        if resync {
            self.local_change();
        }
        Ok(replaced.and_then(|key| self.rules.get_mut(&key)))
    }

    /// Look up a rule by key, selector or original name.
    #[must_use]
    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Look up a rule mutably. Changes made through it bypass the renderer.
    pub fn get_rule_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.get_mut(name)
    }

    /// Position of a top-level rule.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.rules.index_of(name)
    }

    /// Remove a rule.
    ///
    /// The rule always leaves the local model. The result is `false` when
    /// nothing was registered under `name` or the renderer failed to delete
    /// the native rule.
    pub fn delete_rule(&mut self, name: &str) -> bool {
        let Some(rule) = self.rules.remove(name) else {
            return false;
        };
        if !self.attached {
            self.deployed = false;
            return true;
        }
        let Some(renderer) = self.renderer.as_deref_mut() else {
            return true;
        };
        if let Some(handle) = rule.renderable() {
            return renderer.delete_rule(handle);
        }
        self.deploy();
        true
    }

    /// Re-evaluate dynamic values of every rule. Returns the number of
    /// changed properties.
    ///
    /// Sheets whose rules hold no dynamic values and that have no update
    /// hooks return immediately.
    pub fn update(&mut self, data: &Value, options: UpdateOptions) -> usize {
        if !self.plugins.has_update_hooks() && !self.rules.has_dynamic() {
            return 0;
        }
        let summary = self
            .rules
            .update(&self.plugins, data, self.renderer.as_deref_mut(), options);
        if summary.local > 0 {
            self.local_change();
        }
        summary.changed()
    }

    /// Re-evaluate one rule. Returns the number of changed properties.
    pub fn update_one(&mut self, name: &str, data: &Value, options: UpdateOptions) -> usize {
        let summary = self
            .rules
            .update_one(name, &self.plugins, data, self.renderer.as_deref_mut(), options);
        if summary.local > 0 {
            self.local_change();
        }
        summary.changed()
    }

    /// Set one property of a rule, running value-change hooks. Returns
    /// whether anything changed.
    pub fn set_prop(&mut self, name: &str, prop: &str, value: impl Into<StyleValue>) -> bool {
        let value = value.into();
        let Some(rule) = self.rules.get_mut(name) else {
            return false;
        };
        let key = rule.key().to_string();
        let dynamic = value.is_dynamic().then(|| Style::new().with(prop, value.clone()));
        let change = rule.set_prop(
            &self.plugins,
            self.renderer.as_deref_mut(),
            prop,
            value,
            UpdateOptions::default(),
        );
        if let Some(dynamic) = dynamic {
            self.record_dynamic(&key, &StyleValue::Object(dynamic));
        }
        if change == PropChange::Local {
            self.local_change();
        }
        change != PropChange::Unchanged
    }

    /// Change the selector of a style rule.
    pub fn set_selector(&mut self, name: &str, selector: &str) -> bool {
        let has_handle = self.rules.get(name).and_then(Rule::renderable).is_some();
        if !self.rules.set_selector(name, selector, self.renderer.as_deref_mut()) {
            return false;
        }
        if !has_handle {
            self.local_change();
        }
        true
    }

    /// Serialize the sheet.
    #[must_use]
    pub fn to_css_string(&self, options: &ToCssOptions) -> String {
        self.rules.to_css(options)
    }

    fn insert_native(&mut self, key: &str) {
        if !self.deployed {
            return;
        }
        let index = self.rules.native_index(key);
        if let (Some(renderer), Some(rule)) = (self.renderer.as_deref_mut(), self.rules.get_mut(key)) {
            let _ = render_rule(rule, renderer, Some(index), None);
        }
    }

    /// Merge the dynamic part of `decl` into the sheet's dynamic styles.
    fn record_dynamic(&mut self, name: &str, decl: &StyleValue) {
        let Some(dynamic) = extract_dynamic(&Style::new().with(name, decl.clone())) else {
            return;
        };
        let merged = self.dynamic.get_or_insert_with(Style::new);
        for (key, value) in dynamic {
            match (merged.get_mut(&key), value) {
                (Some(StyleValue::Object(existing)), StyleValue::Object(props)) => {
                    for (prop, value) in props {
                        let _ = existing.insert(prop, value);
                    }
                }
                (_, value) => {
                    let _ = merged.insert(key, value);
                }
            }
        }
    }

    fn local_change(&mut self) {
        if self.attached {
            if self.sheet_ref.link {
                warn_once("StyleSheet", "rule is not linked, missing native rule; inserting it again");
            }
            self.deploy();
        } else {
            self.deployed = false;
        }
    }
}

impl fmt::Display for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css_string(&ToCssOptions::default()))
    }
}

impl fmt::Debug for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleSheet")
            .field("sheet_ref", &self.sheet_ref)
            .field("index", &self.index)
            .field("rules", &self.rules.len())
            .field("attached", &self.attached)
            .field("deployed", &self.deployed)
            .finish_non_exhaustive()
    }
}
