//! Engine facade.
//!
//! A [`Jss`] instance owns the plugin registry, the id generator and the
//! renderer factory, and hands out sheets and inline rules. Every sheet takes
//! a snapshot of the registry at creation, so plugins registered later only
//! affect sheets created later.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use rulesheet_common::warning::TARGET;

use crate::factory::{self, ANONYMOUS_KEY};
use crate::generate_id::{CreateGenerateId, GenerateId, IdOptions, create_generate_id};
use crate::plugins::{Plugin, PluginsRegistry, Queue, internal_plugins};
use crate::renderer::Renderer;
use crate::rule::{NameMap, Rule, RuleOptions, RuleParent};
use crate::sheet::{SheetSetup, StyleSheet, StyleSheetOptions};
use crate::value::{Style, StyleValue};

static INSTANCE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Builds the native side of each new sheet.
pub type RendererFactory = Rc<dyn Fn() -> Box<dyn Renderer>>;

/// Engine setup.
#[derive(Clone, Default)]
pub struct JssOptions {
    /// Options for the id generator.
    pub id: Option<IdOptions>,
    /// Replaces the default id generator factory.
    pub create_generate_id: Option<CreateGenerateId>,
    /// External plugins to register, in order.
    pub plugins: Vec<Plugin>,
    /// Renderer factory for new sheets.
    pub renderer: Option<RendererFactory>,
}

impl fmt::Debug for JssOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JssOptions")
            .field("id", &self.id)
            .field("create_generate_id", &self.create_generate_id.is_some())
            .field("plugins", &self.plugins)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

/// Options for an inline rule.
#[derive(Debug, Clone, Default)]
pub struct InlineRuleOptions {
    /// Explicit selector.
    pub selector: Option<String>,
    /// Use the key as the selector instead of a generated class name.
    pub unscoped: bool,
    /// Generator overriding the engine's one.
    pub generate_id: Option<GenerateId>,
}

/// The engine.
pub struct Jss {
    id: u32,
    plugins: Rc<PluginsRegistry>,
    id_options: IdOptions,
    create_generate_id: CreateGenerateId,
    generate_id: GenerateId,
    renderer: Option<RendererFactory>,
    max_sheet_index: Option<i32>,
}

impl Default for Jss {
    fn default() -> Self {
        Self::new()
    }
}

impl Jss {
    /// Create an engine with the core rule types and no renderer.
    #[must_use]
    pub fn new() -> Self {
        let mut plugins = PluginsRegistry::new();
        for plugin in internal_plugins() {
            plugins.use_plugin(plugin, Queue::Internal);
        }
        let id_options = IdOptions::default();
        Self {
            id: INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed),
            plugins: Rc::new(plugins),
            id_options,
            create_generate_id: Rc::new(create_generate_id),
            generate_id: create_generate_id(id_options),
            renderer: None,
            max_sheet_index: None,
        }
    }

    /// Create an engine and apply `options`.
    #[must_use]
    pub fn with_options(options: JssOptions) -> Self {
        let mut jss = Self::new();
        jss.setup(options);
        jss
    }

    /// Apply `options`. Plugins are appended to the external queue. A new id
    /// generator is created whenever id options or the generator factory
    /// are given.
    pub fn setup(&mut self, options: JssOptions) {
        let mut regenerate = false;
        if let Some(create) = options.create_generate_id {
            self.create_generate_id = create;
            regenerate = true;
        }
        if let Some(id_options) = options.id {
            self.id_options = id_options;
            regenerate = true;
        }
        if regenerate {
            self.generate_id = (self.create_generate_id)(self.id_options);
        }
        if let Some(renderer) = options.renderer {
            self.renderer = Some(renderer);
        }
        for plugin in options.plugins {
            self.use_plugin(plugin);
        }
    }

    /// Register an external plugin.
    pub fn use_plugin(&mut self, plugin: Plugin) {
        self.use_plugin_in(plugin, Queue::External);
    }

    /// Register a plugin in a specific queue.
    pub fn use_plugin_in(&mut self, plugin: Plugin, queue: Queue) {
        log::debug!(target: TARGET, "registering plugin {:?}", plugin.name());
        Rc::make_mut(&mut self.plugins).use_plugin(plugin, queue);
    }

    /// Engine id, part of every generated name.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Current plugin registry.
    #[must_use]
    pub fn plugins(&self) -> &PluginsRegistry {
        &self.plugins
    }

    /// Current id generator.
    #[must_use]
    pub const fn generate_id(&self) -> &GenerateId {
        &self.generate_id
    }

    /// Compile a styles object into a sheet and run sheet hooks on it.
    ///
    /// Without an explicit index the sheet gets one above the highest index
    /// handed out so far, or `0` for the first sheet.
    pub fn create_style_sheet(&mut self, styles: &Style, options: StyleSheetOptions) -> StyleSheet {
        let index = options
            .index
            .unwrap_or_else(|| self.max_sheet_index.map_or(0, |max| max + 1));
        self.max_sheet_index = Some(self.max_sheet_index.map_or(index, |max| max.max(index)));

        let setup = SheetSetup {
            plugins: Rc::clone(&self.plugins),
            generate_id: self.generate_id.clone(),
            renderer: self.renderer.as_ref().map(|factory| factory()),
            jss_id: self.id,
            index,
        };
        let mut sheet = StyleSheet::new(styles, options, setup);
        let plugins = Rc::clone(&self.plugins);
        plugins.on_process_sheet(&mut sheet);
        sheet
    }

    /// Build and process a standalone rule, for inline styles.
    ///
    /// A missing name uses the anonymous key.
    #[must_use]
    pub fn create_rule(&self, name: Option<&str>, style: &StyleValue, options: InlineRuleOptions) -> Option<Rule> {
        let name = name.unwrap_or(ANONYMOUS_KEY);
        let rule_options = RuleOptions {
            selector: options.selector,
            scoped: !options.unscoped,
            sheet: None,
            index: None,
            parent: RuleParent::None,
            classes: NameMap::new(),
            keyframes: NameMap::new(),
            generate_id: options.generate_id.unwrap_or_else(|| self.generate_id.clone()),
            name: Some(name.to_string()),
        };
        let mut rule = factory::create_rule(&self.plugins, Some(name), style, &rule_options)?;
        self.plugins.on_process_rule(&mut rule);
        Some(rule)
    }
}

impl fmt::Debug for Jss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jss")
            .field("id", &self.id)
            .field("plugins", &self.plugins)
            .field("id_options", &self.id_options)
            .field("renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}
