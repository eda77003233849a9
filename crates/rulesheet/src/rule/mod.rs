//! Rule model.
//!
//! A closed set of rule variants sharing one [`Rule`] header (key, options,
//! native handle, processed flag). Containers own a nested [`RuleList`] by
//! composition. Rules never own their sheet: they carry a [`SheetRef`]
//! snapshot with the few sheet settings they read.

mod conditional;
mod font_face;
mod keyframes;
mod simple;
mod style;
mod viewport;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub use conditional::{CONDITIONAL_AT_RULES, ConditionalRule};
pub use font_face::FontFaceRule;
pub use keyframes::{KeyframeRule, KeyframesRule, parse_keyframes_name};
pub use simple::{SIMPLE_AT_RULES, SimpleRule};
pub use style::StyleRule;
pub use viewport::{VIEWPORT_AT_RULES, ViewportRule};

use crate::generate_id::GenerateId;
use crate::plugins::PluginsRegistry;
use crate::renderer::{RenderHandle, Renderer};
use crate::rule_list::{RuleList, UpdateOptions};
use crate::to_css::{ToCssOptions, to_css_value};
use crate::value::{DynamicValue, Style, StyleValue};

/// Non-owning description of the sheet a rule belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    /// Process-unique sheet id.
    pub id: u32,
    /// Id of the engine instance that created the sheet.
    pub jss_id: u32,
    /// Link mode: rules are placeholders for already rendered native CSS.
    pub link: bool,
    /// Prefix for generated class names.
    pub class_name_prefix: Option<String>,
}

/// What contains a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuleParent {
    /// Created on its own, outside any sheet (inline styles).
    #[default]
    None,
    /// Top level of a sheet.
    Sheet,
    /// Inside `@media`, `@supports` or `@container`.
    Conditional,
    /// Inside `@keyframes`.
    Keyframes,
}

/// A name table shared by every rule list of one sheet.
///
/// Class names are written by rule lists when style rules register and read
/// when nested rules with the same key need the same class.
#[derive(Debug, Clone, Default)]
pub struct NameMap(Rc<RefCell<BTreeMap<String, String>>>);

impl NameMap {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.0.borrow().get(key).cloned()
    }

    /// Whether the key has a name.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Record a name.
    pub fn insert(&self, key: impl Into<String>, name: impl Into<String>) {
        let _ = self.0.borrow_mut().insert(key.into(), name.into());
    }

    /// Forget a name.
    pub fn remove(&self, key: &str) {
        let _ = self.0.borrow_mut().remove(key);
    }

    /// Copy of the table.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.0.borrow().clone()
    }
}

/// Options every rule is created with.
#[derive(Debug, Clone)]
pub struct RuleOptions {
    /// Explicit selector; skips class name generation.
    pub selector: Option<String>,
    /// Generate class names. `false` uses keys verbatim.
    pub scoped: bool,
    /// Owning sheet, if any.
    pub sheet: Option<SheetRef>,
    /// Requested position in the owning list.
    pub index: Option<usize>,
    /// What contains the rule.
    pub parent: RuleParent,
    /// Key → class name table.
    pub classes: NameMap,
    /// Keyframes name → animation name table.
    pub keyframes: NameMap,
    /// Name generator.
    pub generate_id: GenerateId,
    /// Name as passed by the caller, before any rewriting of the key.
    pub name: Option<String>,
}

impl RuleOptions {
    /// Defaults for a rule outside any sheet.
    #[must_use]
    pub fn new(generate_id: GenerateId) -> Self {
        Self {
            selector: None,
            scoped: true,
            sheet: None,
            index: None,
            parent: RuleParent::None,
            classes: NameMap::new(),
            keyframes: NameMap::new(),
            generate_id,
            name: None,
        }
    }

    /// Whether the owning sheet is in link mode.
    #[must_use]
    pub fn link(&self) -> bool {
        self.sheet.as_ref().is_some_and(|sheet| sheet.link)
    }
}

/// Variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum RuleType {
    /// Selector block.
    #[strum(serialize = "style")]
    Style,
    /// One step inside `@keyframes`.
    #[strum(serialize = "keyframe")]
    Keyframe,
    /// `@keyframes` container.
    #[strum(serialize = "keyframes")]
    Keyframes,
    /// `@media` / `@supports` / `@container`.
    #[strum(serialize = "conditional")]
    Conditional,
    /// `@font-face`.
    #[strum(serialize = "font-face")]
    FontFace,
    /// `@viewport`.
    #[strum(serialize = "viewport")]
    Viewport,
    /// `@charset`, `@import`, `@namespace`.
    #[strum(serialize = "simple")]
    Simple,
}

/// Variant payload.
#[derive(Debug)]
pub enum RuleKind {
    /// Selector block.
    Style(StyleRule),
    /// Keyframe step.
    Keyframe(KeyframeRule),
    /// Keyframes container.
    Keyframes(KeyframesRule),
    /// Conditional container.
    Conditional(ConditionalRule),
    /// Font face.
    FontFace(FontFaceRule),
    /// Viewport.
    Viewport(ViewportRule),
    /// Raw at-rule statement.
    Simple(SimpleRule),
}

/// Result of a single property write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropChange {
    /// Value was equal; nothing happened.
    Unchanged,
    /// Stored and pushed to the native rule.
    Rendered,
    /// Stored, but the rule has no native handle to push to.
    Local,
}

/// One rule plus its metadata.
#[derive(Debug)]
pub struct Rule {
    key: String,
    kind: RuleKind,
    options: RuleOptions,
    renderable: Option<RenderHandle>,
    is_processed: bool,
}

impl Rule {
    /// Assemble a rule from a variant payload.
    #[must_use]
    pub fn new(key: impl Into<String>, kind: RuleKind, options: RuleOptions) -> Self {
        Self {
            key: key.into(),
            kind,
            options,
            renderable: None,
            is_processed: false,
        }
    }

    /// Stable identifier, unique within the owning list.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Variant tag.
    #[must_use]
    pub const fn rule_type(&self) -> RuleType {
        match &self.kind {
            RuleKind::Style(_) => RuleType::Style,
            RuleKind::Keyframe(_) => RuleType::Keyframe,
            RuleKind::Keyframes(_) => RuleType::Keyframes,
            RuleKind::Conditional(_) => RuleType::Conditional,
            RuleKind::FontFace(_) => RuleType::FontFace,
            RuleKind::Viewport(_) => RuleType::Viewport,
            RuleKind::Simple(_) => RuleType::Simple,
        }
    }

    /// Variant payload.
    #[must_use]
    pub const fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Variant payload, mutably.
    pub const fn kind_mut(&mut self) -> &mut RuleKind {
        &mut self.kind
    }

    /// Creation options.
    #[must_use]
    pub const fn options(&self) -> &RuleOptions {
        &self.options
    }

    /// Native handle, set once the renderer inserted the rule.
    #[must_use]
    pub const fn renderable(&self) -> Option<RenderHandle> {
        self.renderable
    }

    pub(crate) const fn set_renderable(&mut self, handle: Option<RenderHandle>) {
        self.renderable = handle;
    }

    /// Whether processing hooks already ran for this rule.
    #[must_use]
    pub const fn is_processed(&self) -> bool {
        self.is_processed
    }

    pub(crate) const fn mark_processed(&mut self) {
        self.is_processed = true;
    }

    /// Selector of a style rule.
    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::Style(rule) => Some(rule.selector()),
            _ => None,
        }
    }

    /// Declaration mapping of leaf rules.
    #[must_use]
    pub const fn style(&self) -> Option<&Style> {
        match &self.kind {
            RuleKind::Style(rule) => Some(&rule.style),
            RuleKind::Keyframe(rule) => Some(&rule.style),
            RuleKind::Viewport(rule) => Some(&rule.style),
            RuleKind::FontFace(rule) => rule.single(),
            RuleKind::Keyframes(_) | RuleKind::Conditional(_) | RuleKind::Simple(_) => None,
        }
    }

    /// Declaration mapping of leaf rules, mutably.
    ///
    /// Changes made here bypass value-change hooks and the renderer.
    pub const fn style_mut(&mut self) -> Option<&mut Style> {
        match &mut self.kind {
            RuleKind::Style(rule) => Some(&mut rule.style),
            RuleKind::Keyframe(rule) => Some(&mut rule.style),
            RuleKind::Viewport(rule) => Some(&mut rule.style),
            RuleKind::FontFace(rule) => rule.single_mut(),
            RuleKind::Keyframes(_) | RuleKind::Conditional(_) | RuleKind::Simple(_) => None,
        }
    }

    /// Replace the declaration mapping. Function and stream values move to
    /// the dynamic table of style and keyframe rules.
    pub(crate) fn set_style(&mut self, mut style: Style) {
        if let Some(dynamic) = self.dynamic_mut() {
            for (prop, value) in style.take_dynamic() {
                let _ = dynamic.insert(prop, value);
            }
        }
        if let Some(slot) = self.style_mut() {
            *slot = style;
        }
    }

    /// Function- and stream-valued properties awaiting evaluation.
    #[must_use]
    pub const fn dynamic(&self) -> Option<&Style> {
        match &self.kind {
            RuleKind::Style(rule) => Some(&rule.dynamic),
            RuleKind::Keyframe(rule) => Some(&rule.dynamic),
            _ => None,
        }
    }

    const fn dynamic_mut(&mut self) -> Option<&mut Style> {
        match &mut self.kind {
            RuleKind::Style(rule) => Some(&mut rule.dynamic),
            RuleKind::Keyframe(rule) => Some(&mut rule.dynamic),
            _ => None,
        }
    }

    /// The function computing the whole style of a function rule.
    #[must_use]
    pub const fn function_style(&self) -> Option<&DynamicValue> {
        match &self.kind {
            RuleKind::Style(rule) => rule.fn_style.as_ref(),
            _ => None,
        }
    }

    /// Nested rule list of container rules.
    #[must_use]
    pub const fn rules(&self) -> Option<&RuleList> {
        match &self.kind {
            RuleKind::Keyframes(rule) => Some(&rule.rules),
            RuleKind::Conditional(rule) => Some(&rule.rules),
            _ => None,
        }
    }

    /// Nested rule list of container rules, mutably.
    pub const fn rules_mut(&mut self) -> Option<&mut RuleList> {
        match &mut self.kind {
            RuleKind::Keyframes(rule) => Some(&mut rule.rules),
            RuleKind::Conditional(rule) => Some(&mut rule.rules),
            _ => None,
        }
    }

    /// Serialize this rule.
    #[must_use]
    pub fn to_css(&self, options: &ToCssOptions) -> String {
        let link = self.options.link();
        match &self.kind {
            RuleKind::Style(rule) => rule.to_css(options, link),
            RuleKind::Keyframe(rule) => rule.to_css(&self.key, options, link),
            RuleKind::Keyframes(rule) => rule.to_css(options),
            RuleKind::Conditional(rule) => rule.to_css(options),
            RuleKind::FontFace(rule) => rule.to_css(options),
            RuleKind::Viewport(rule) => rule.to_css(&self.key, options),
            RuleKind::Simple(rule) => rule.to_css(&self.key, options),
        }
    }

    /// Write one property of a style or keyframe rule.
    ///
    /// Equal values are skipped unless `options.force` is set. Value-change
    /// hooks run when `options.process` is set. `null`/`false` removes the
    /// property. Function and stream values are parked in the dynamic table
    /// and take effect on the next update.
    ///
    /// When the renderer refuses the declaration, the native rule is
    /// replaced with the freshly serialized rule. If that fails too the rule
    /// loses its handle and the change is reported as local.
    pub fn set_prop(
        &mut self,
        plugins: &PluginsRegistry,
        renderer: Option<&mut (dyn Renderer + '_)>,
        name: &str,
        value: StyleValue,
        options: UpdateOptions,
    ) -> PropChange {
        if value.is_dynamic() {
            if let Some(dynamic) = self.dynamic_mut() {
                let _ = dynamic.insert(name, value);
            }
            return PropChange::Unchanged;
        }
        if !matches!(self.kind, RuleKind::Style(_) | RuleKind::Keyframe(_)) {
            return PropChange::Unchanged;
        }
        let Some(current) = self.style() else {
            return PropChange::Unchanged;
        };
        if !options.force && current.get(name) == Some(&value) {
            return PropChange::Unchanged;
        }
        let is_defined = current.contains_key(name);

        let next = if options.process {
            plugins.on_change_value(value, name, self)
        } else {
            value
        };

        let remove = next.is_empty_value();
        if remove && !is_defined {
            return PropChange::Unchanged;
        }

        let css = to_css_value(&next);
        if let Some(style) = self.style_mut() {
            if remove {
                let _ = style.remove(name);
            } else {
                let _ = style.insert(name, next);
            }
        }

        let (Some(handle), Some(renderer)) = (self.renderable, renderer) else {
            return PropChange::Local;
        };
        match css {
            Some(css) if !remove => {
                if !renderer.set_property(handle, name, &css) {
                    let text = self.to_css(&ToCssOptions::default());
                    self.renderable = renderer.replace_rule(handle, &text);
                    if self.renderable.is_none() {
                        return PropChange::Local;
                    }
                }
            }
            _ => renderer.remove_property(handle, name),
        }
        PropChange::Rendered
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css(&ToCssOptions::default()))
    }
}
