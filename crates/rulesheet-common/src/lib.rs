//! Common utilities for the rulesheet crates.
//!
//! This crate provides shared infrastructure used by the engine and the CLI:
//! - **Warning System** - deduplicated diagnostics routed through `log`
//! - **Identifier Escaping** - making generated names safe inside selectors

pub mod escape;
pub mod warning;
