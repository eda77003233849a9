//! Renderer contract.
//!
//! The engine keeps the logical model (rule lists, styles) and talks to the
//! native side only through [`Renderer`]. A browser implementation wraps a
//! `<style>` element and its CSSOM; [`MemoryRenderer`] is a headless stand-in.
//!
//! No call is assumed to succeed. Every result is checked before local
//! bookkeeping that depends on it is updated.

mod memory;

pub use memory::{MemoryRenderer, NativeRule};

/// Opaque handle to a native rule. Owned and interpreted by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderHandle(pub u64);

/// Native side of a style sheet.
pub trait Renderer {
    /// Attach the native sheet to the document.
    fn attach(&mut self);

    /// Detach the native sheet from the document.
    fn detach(&mut self);

    /// Replace the native sheet contents with serialized CSS.
    fn deploy(&mut self, css: &str);

    /// Insert one rule, either top-level or into a container rule.
    ///
    /// `index` counts among the parent's children; `None` appends.
    fn insert_rule(
        &mut self,
        css: &str,
        index: Option<usize>,
        parent: Option<RenderHandle>,
    ) -> Option<RenderHandle>;

    /// Remove a native rule.
    fn delete_rule(&mut self, handle: RenderHandle) -> bool;

    /// Swap the native rule for freshly serialized CSS at the same position.
    fn replace_rule(&mut self, handle: RenderHandle, css: &str) -> Option<RenderHandle>;

    /// Set one declaration on a native rule.
    fn set_property(&mut self, handle: RenderHandle, prop: &str, value: &str) -> bool;

    /// Read one declaration back.
    fn get_property_value(&self, handle: RenderHandle, prop: &str) -> String;

    /// Remove one declaration.
    fn remove_property(&mut self, handle: RenderHandle, prop: &str);

    /// Change the selector of a native style rule.
    fn set_selector(&mut self, handle: RenderHandle, selector: &str) -> bool;

    /// Position of the native rule among its siblings.
    fn index_of(&self, handle: RenderHandle) -> Option<usize>;
}
