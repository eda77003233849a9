//! Usage warnings routed through the `log` facade.
//!
//! Provides deduplication to avoid spamming the same warning multiple times.
//! Used by the rule factory, rule lists and style sheets to report caller
//! mistakes that are not fatal (unknown at-rules, duplicate keys, ...).

use std::collections::HashSet;
use std::sync::Mutex;

/// Log target shared by every rulesheet diagnostic.
pub const TARGET: &str = "rulesheet";

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about a usage problem (emits once per unique message)
///
/// A poisoned lock still emits the warning, it just loses deduplication.
///
/// # Example
/// ```ignore
/// warn_once("Rule", "unknown rule @foo");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let should_emit = match WARNED.lock() {
        Ok(mut guard) => guard.get_or_insert_with(HashSet::new).insert(key),
        Err(_) => true,
    };

    if should_emit {
        log::warn!(target: TARGET, "[{component}] {message}");
    }
}

/// Returns true if this exact warning was already emitted.
#[must_use]
pub fn was_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    WARNED
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(|set| set.contains(&key)))
        .unwrap_or(false)
}

/// Clear all recorded warnings (call between independent compilations)
pub fn clear_warnings() {
    if let Ok(mut guard) = WARNED.lock() {
        if let Some(set) = guard.as_mut() {
            set.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_records_message() {
        warn_once("Test", "recorded message");
        assert!(was_warned("Test", "recorded message"));
        assert!(!was_warned("Test", "never emitted"));
    }
}
