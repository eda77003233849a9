//! Headless renderer.
//!
//! Records native rules and declarations in memory. Cloning yields another
//! handle to the same state, so a caller can keep one clone for inspection
//! while the sheet owns the other. Deploying text replaces every inserted
//! rule, the way setting a style element's text does.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{RenderHandle, Renderer};

/// One recorded native rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeRule {
    /// CSS text the rule was inserted (or last replaced) with.
    pub css_text: String,
    /// Selector override set through [`Renderer::set_selector`].
    pub selector: Option<String>,
    /// Declarations set through [`Renderer::set_property`], in order.
    pub properties: Vec<(String, String)>,
    /// Container this rule was inserted into.
    pub parent: Option<RenderHandle>,
}

#[derive(Debug, Default)]
struct State {
    attached: bool,
    deployed: Option<String>,
    next_handle: u64,
    top_level: Vec<RenderHandle>,
    children: HashMap<RenderHandle, Vec<RenderHandle>>,
    rules: HashMap<RenderHandle, NativeRule>,
    refuse_inserts: bool,
    refuse_deletes: bool,
    refuse_writes: bool,
}

impl State {
    fn siblings_mut(&mut self, parent: Option<RenderHandle>) -> &mut Vec<RenderHandle> {
        match parent {
            Some(parent) => self.children.entry(parent).or_default(),
            None => &mut self.top_level,
        }
    }

    fn siblings(&self, parent: Option<RenderHandle>) -> Option<&Vec<RenderHandle>> {
        match parent {
            Some(parent) => self.children.get(&parent),
            None => Some(&self.top_level),
        }
    }

    fn drop_subtree(&mut self, handle: RenderHandle) {
        if let Some(children) = self.children.remove(&handle) {
            for child in children {
                self.drop_subtree(child);
            }
        }
        let _ = self.rules.remove(&handle);
    }
}

/// In-memory [`Renderer`].
#[derive(Debug, Clone, Default)]
pub struct MemoryRenderer {
    state: Rc<RefCell<State>>,
}

impl MemoryRenderer {
    /// Create an empty, detached renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `insert_rule` fail, like a CSSOM rejecting
    /// invalid rule text.
    pub fn refuse_inserts(&self, refuse: bool) {
        self.state.borrow_mut().refuse_inserts = refuse;
    }

    /// Make every subsequent `delete_rule` (and so `replace_rule`) fail.
    pub fn refuse_deletes(&self, refuse: bool) {
        self.state.borrow_mut().refuse_deletes = refuse;
    }

    /// Make every subsequent `set_property` fail, like a CSSOM rejecting
    /// an invalid value.
    pub fn refuse_writes(&self, refuse: bool) {
        self.state.borrow_mut().refuse_writes = refuse;
    }

    /// Whether `attach` was called more recently than `detach`.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.state.borrow().attached
    }

    /// Text passed to the last `deploy`.
    #[must_use]
    pub fn deployed_css(&self) -> Option<String> {
        self.state.borrow().deployed.clone()
    }

    /// Top-level native rules in order.
    #[must_use]
    pub fn top_level(&self) -> Vec<RenderHandle> {
        self.state.borrow().top_level.clone()
    }

    /// Children of a native container rule in order.
    #[must_use]
    pub fn children(&self, handle: RenderHandle) -> Vec<RenderHandle> {
        self.state
            .borrow()
            .children
            .get(&handle)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of one native rule.
    #[must_use]
    pub fn rule(&self, handle: RenderHandle) -> Option<NativeRule> {
        self.state.borrow().rules.get(&handle).cloned()
    }

    /// Number of live native rules, nested ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().rules.len()
    }

    /// Whether no native rules are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Renderer for MemoryRenderer {
    fn attach(&mut self) {
        self.state.borrow_mut().attached = true;
    }

    fn detach(&mut self) {
        self.state.borrow_mut().attached = false;
    }

    fn deploy(&mut self, css: &str) {
        let mut state = self.state.borrow_mut();
        state.top_level.clear();
        state.children.clear();
        state.rules.clear();
        state.deployed = Some(css.to_string());
    }

    fn insert_rule(
        &mut self,
        css: &str,
        index: Option<usize>,
        parent: Option<RenderHandle>,
    ) -> Option<RenderHandle> {
        let mut state = self.state.borrow_mut();
        if state.refuse_inserts || css.is_empty() {
            return None;
        }
        if let Some(parent) = parent {
            if !state.rules.contains_key(&parent) {
                return None;
            }
        }
        state.next_handle += 1;
        let handle = RenderHandle(state.next_handle);
        let siblings = state.siblings_mut(parent);
        let position = index.map_or(siblings.len(), |i| i.min(siblings.len()));
        siblings.insert(position, handle);
        let _ = state.rules.insert(
            handle,
            NativeRule {
                css_text: css.to_string(),
                selector: None,
                properties: Vec::new(),
                parent,
            },
        );
        Some(handle)
    }

    fn delete_rule(&mut self, handle: RenderHandle) -> bool {
        let mut state = self.state.borrow_mut();
        if state.refuse_deletes {
            return false;
        }
        let Some(parent) = state.rules.get(&handle).map(|rule| rule.parent) else {
            return false;
        };
        state.siblings_mut(parent).retain(|h| *h != handle);
        state.drop_subtree(handle);
        true
    }

    fn replace_rule(&mut self, handle: RenderHandle, css: &str) -> Option<RenderHandle> {
        let parent = self.state.borrow().rules.get(&handle)?.parent;
        let index = self.index_of(handle);
        if !self.delete_rule(handle) {
            return None;
        }
        self.insert_rule(css, index, parent)
    }

    fn set_property(&mut self, handle: RenderHandle, prop: &str, value: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if state.refuse_writes {
            return false;
        }
        let Some(rule) = state.rules.get_mut(&handle) else {
            return false;
        };
        if let Some(slot) = rule.properties.iter_mut().find(|(p, _)| p == prop) {
            slot.1 = value.to_string();
        } else {
            rule.properties.push((prop.to_string(), value.to_string()));
        }
        true
    }

    fn get_property_value(&self, handle: RenderHandle, prop: &str) -> String {
        self.state
            .borrow()
            .rules
            .get(&handle)
            .and_then(|rule| rule.properties.iter().find(|(p, _)| p == prop))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn remove_property(&mut self, handle: RenderHandle, prop: &str) {
        if let Some(rule) = self.state.borrow_mut().rules.get_mut(&handle) {
            rule.properties.retain(|(p, _)| p != prop);
        }
    }

    fn set_selector(&mut self, handle: RenderHandle, selector: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(rule) = state.rules.get_mut(&handle) else {
            return false;
        };
        rule.selector = Some(selector.to_string());
        true
    }

    fn index_of(&self, handle: RenderHandle) -> Option<usize> {
        let state = self.state.borrow();
        let parent = state.rules.get(&handle)?.parent;
        state.siblings(parent)?.iter().position(|h| *h == handle)
    }
}
