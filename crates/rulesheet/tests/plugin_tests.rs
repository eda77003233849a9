//! Integration tests for plugin ordering and hook semantics.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rulesheet::rule::StyleRule;
use rulesheet::{
    AddRuleOptions, InlineRuleOptions, Jss, Plugin, Queue, Rule, RuleKind, Style,
    StyleSheetOptions, StyleValue,
};

fn log_plugin(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Plugin {
    let log = Rc::clone(log);
    Plugin::new(name).on_process_style(move |style, _, _| {
        log.borrow_mut().push(name);
        style
    })
}

fn one_rule() -> Style {
    Style::new().with("a", Style::new().with("color", "red"))
}

#[test]
fn test_internal_queue_runs_first() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut jss = Jss::new();
    jss.use_plugin(log_plugin("external", &log));
    jss.use_plugin_in(log_plugin("internal", &log), Queue::Internal);

    let _ = jss.create_style_sheet(&one_rule(), StyleSheetOptions::default());
    assert_eq!(*log.borrow(), ["internal", "external"]);
}

#[test]
fn test_plugins_are_not_deduplicated() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let plugin = log_plugin("twice", &log);
    let mut jss = Jss::new();
    jss.use_plugin(plugin.clone());
    jss.use_plugin(plugin);

    let _ = jss.create_style_sheet(&one_rule(), StyleSheetOptions::default());
    assert_eq!(*log.borrow(), ["twice", "twice"]);
}

#[test]
fn test_style_hooks_chain_in_order() {
    let mut jss = Jss::new();
    jss.use_plugin(Plugin::new("upper").on_process_style(|style, _, _| {
        style
            .into_iter()
            .map(|(prop, value)| match value {
                StyleValue::String(s) => (prop, StyleValue::from(s.to_uppercase())),
                other => (prop, other),
            })
            .collect()
    }));
    jss.use_plugin(Plugin::new("suffix").on_process_style(|style, _, _| {
        style
            .into_iter()
            .map(|(prop, value)| match value {
                StyleValue::String(s) => (prop, StyleValue::from(format!("{s}!"))),
                other => (prop, other),
            })
            .collect()
    }));

    let sheet = jss.create_style_sheet(&one_rule(), StyleSheetOptions::default());
    let rule = sheet.get_rule("a").unwrap();
    assert_eq!(rule.style().unwrap().get("color"), Some(&StyleValue::from("RED!")));
}

#[test]
fn test_external_plugin_creates_custom_rule() {
    let mut jss = Jss::new();
    jss.use_plugin(Plugin::new("global").on_create_rule(|key, decl, options, _| {
        if key != "@global" {
            return None;
        }
        let mut options = options.clone();
        options.selector = Some("html".to_string());
        let style = decl.as_object()?.clone();
        let rule = StyleRule::new(key, style, &options);
        Some(Rule::new(key, RuleKind::Style(rule), options))
    }));

    let styles = Style::new().with("@global", Style::new().with("margin", 0));
    let sheet = jss.create_style_sheet(&styles, StyleSheetOptions::default());
    assert_eq!(sheet.to_string(), "html {\n  margin: 0;\n}");
}

#[test]
fn test_first_create_hook_wins() {
    let mut jss = Jss::new();
    for selector in ["first", "second"] {
        jss.use_plugin(Plugin::new(selector).on_create_rule(move |key, decl, options, _| {
            if key != "@x" {
                return None;
            }
            let mut options = options.clone();
            options.selector = Some(selector.to_string());
            let rule = StyleRule::new(key, decl.as_object()?.clone(), &options);
            Some(Rule::new(key, RuleKind::Style(rule), options))
        }));
    }

    let styles = Style::new().with("@x", Style::new().with("color", "red"));
    let sheet = jss.create_style_sheet(&styles, StyleSheetOptions::default());
    assert_eq!(sheet.get_rule("@x").unwrap().selector(), Some("first"));
}

#[test]
fn test_rules_are_processed_once() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let mut jss = Jss::new();
    jss.use_plugin(Plugin::new("count").on_process_rule(move |_, _| counter.set(counter.get() + 1)));

    let mut sheet = jss.create_style_sheet(&one_rule(), StyleSheetOptions::default());
    assert_eq!(calls.get(), 1);

    let rule = sheet.get_rule_mut("a").unwrap();
    assert!(rule.is_processed());
    jss.plugins().on_process_rule(rule);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_nested_rules_are_processed_before_container() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&log);
    let mut jss = Jss::new();
    jss.use_plugin(Plugin::new("order").on_process_rule(move |rule, _| {
        seen.borrow_mut().push(rule.key().to_string());
    }));

    let styles = Style::new().with("@media print", one_rule());
    let _ = jss.create_style_sheet(&styles, StyleSheetOptions::default());
    assert_eq!(*log.borrow(), ["a", "@media print"]);
}

#[test]
fn test_sheet_hook_can_add_rules() {
    let mut jss = Jss::new();
    jss.use_plugin(Plugin::new("reset").on_process_sheet(|sheet| {
        let decl = StyleValue::from(Style::new().with("margin", 0));
        let options = AddRuleOptions {
            selector: Some("body".to_string()),
            ..AddRuleOptions::default()
        };
        let _ = sheet.add_rule("reset", &decl, options);
    }));

    let sheet = jss.create_style_sheet(&Style::new(), StyleSheetOptions::default());
    assert_eq!(sheet.to_string(), "body {\n  margin: 0;\n}");
}

#[test]
fn test_sheets_snapshot_the_registry() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut jss = Jss::new();
    let mut sheet = jss.create_style_sheet(&Style::new(), StyleSheetOptions::default());
    jss.use_plugin(log_plugin("late", &log));

    let decl = StyleValue::from(Style::new().with("color", "red"));
    let _ = sheet.add_rule("a", &decl, AddRuleOptions::default()).unwrap();
    assert!(log.borrow().is_empty());
}

#[test]
fn test_inline_rule() {
    let jss = Jss::new();
    let style = StyleValue::from(Style::new().with("color", "red"));
    let options = InlineRuleOptions {
        selector: Some(".title".to_string()),
        ..InlineRuleOptions::default()
    };
    let rule = jss.create_rule(Some("title"), &style, options).unwrap();
    assert_eq!(rule.to_string(), ".title {\n  color: red;\n}");
    assert!(rule.is_processed());

    let anonymous = jss.create_rule(None, &style, InlineRuleOptions::default()).unwrap();
    assert_eq!(anonymous.key(), "unnamed");
}

#[test]
fn test_unscoped_inline_rule_uses_key() {
    let jss = Jss::new();
    let style = StyleValue::from(Style::new().with("margin", 0));
    let options = InlineRuleOptions {
        unscoped: true,
        ..InlineRuleOptions::default()
    };
    let rule = jss.create_rule(Some("body"), &style, options).unwrap();
    assert_eq!(rule.selector(), Some("body"));
}
