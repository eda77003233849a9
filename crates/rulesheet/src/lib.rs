//! Compiles nested style objects into CSS rules through a plugin pipeline.
//!
//! # Scope
//!
//! This crate implements:
//! - **Value model**: ordered style mappings, list values, function and
//!   stream values evaluated on update
//! - **Serializer**: deterministic CSS text with fallbacks, nested blocks and
//!   a compact (unformatted) mode
//! - **Rule model**: style, keyframes and keyframe steps, conditional group
//!   rules, `@font-face`, `@viewport`, statement at-rules
//! - **Plugin pipeline**: rule creation, rule/style/sheet processing, value
//!   changes and dynamic updates, in two ordered queues
//! - **Sheets**: ordered rule lists, class and keyframes name tables,
//!   attach/detach lifecycle against a [`Renderer`]
//!
//! # Not Yet Implemented
//!
//! - A browser renderer (only [`MemoryRenderer`] ships here)
//! - Sheet registries and server-side collection of many sheets

/// Deep copies of style values.
pub mod clone;
/// Extraction of function- and stream-valued entries.
pub mod dynamic;
/// Error types.
pub mod error;
/// Rule factory and fallback style rules.
pub mod factory;
/// Class name and animation name generation.
pub mod generate_id;
/// Engine facade.
pub mod jss;
/// Plugin hooks and the ordered registry.
pub mod plugins;
/// Native side of style sheets.
pub mod renderer;
/// Rule variants.
pub mod rule;
/// Ordered, keyed rule collection.
pub mod rule_list;
/// Style sheets.
pub mod sheet;
/// CSS serializer.
pub mod to_css;
/// Style values and mappings.
pub mod value;

// Re-exports for convenience
pub use clone::{clone_mapping, clone_style};
pub use dynamic::extract_dynamic;
pub use error::{RuleError, StyleParseError};
pub use factory::create_rule;
pub use generate_id::{CreateGenerateId, GenerateId, IdOptions, create_generate_id};
pub use jss::{InlineRuleOptions, Jss, JssOptions, RendererFactory};
pub use plugins::{Plugin, PluginsRegistry, Queue};
pub use renderer::{MemoryRenderer, NativeRule, RenderHandle, Renderer};
pub use rule::{NameMap, PropChange, Rule, RuleKind, RuleOptions, RuleParent, RuleType, SheetRef};
pub use rule_list::{AddRuleOptions, RuleList, RuleListOptions, UpdateOptions, UpdateSummary};
pub use sheet::{StyleSheet, StyleSheetOptions};
pub use to_css::{ToCssOptions, to_css, to_css_value};
pub use value::{DynamicValue, IMPORTANT, StreamValue, Style, StyleStream, StyleValue};
