//! Integration tests for sheet compilation and serialization.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rulesheet::{
    AddRuleOptions, GenerateId, IdOptions, Jss, JssOptions, RuleError, RuleType, Style, StyleSheet,
    StyleSheetOptions, StyleValue, ToCssOptions,
};

/// Engine whose generator yields `<key>-<n>`, independent of engine ids.
fn jss() -> Jss {
    Jss::with_options(JssOptions {
        create_generate_id: Some(Rc::new(|_: IdOptions| {
            let counter = Cell::new(0);
            GenerateId::new(move |key, _| {
                counter.set(counter.get() + 1);
                format!("{key}-{}", counter.get())
            })
        })),
        ..JssOptions::default()
    })
}

fn styles(json: &str) -> Style {
    Style::from_json_str(json).unwrap()
}

fn compile(json: &str) -> StyleSheet {
    jss().create_style_sheet(&styles(json), StyleSheetOptions::default())
}

#[test]
fn test_single_style_rule() {
    let sheet = compile(r#"{"button": {"color": "red", "font-size": 12}}"#);
    assert_eq!(sheet.to_string(), ".button-1 {\n  color: red;\n  font-size: 12;\n}");
    assert_eq!(sheet.class_name("button").as_deref(), Some("button-1"));
}

#[test]
fn test_rules_keep_declaration_order() {
    let sheet = compile(r#"{"b": {"color": "red"}, "a": {"color": "blue"}}"#);
    let keys: Vec<&str> = sheet.rules().keys().collect();
    assert_eq!(keys, ["b", "a"]);
    assert_eq!(sheet.to_string(), ".b-1 {\n  color: red;\n}\n.a-2 {\n  color: blue;\n}");
}

#[test]
fn test_nested_media_reuses_class() {
    let sheet = compile(
        r#"{
            "button": {"color": "red"},
            "@media print": {"button": {"color": "black"}}
        }"#,
    );
    assert_eq!(
        sheet.to_string(),
        ".button-1 {\n  color: red;\n}\n@media print {\n  .button-1 {\n    color: black;\n  }\n}"
    );
    let media = sheet.get_rule("@media print").unwrap();
    assert_eq!(media.rule_type(), RuleType::Conditional);
    assert_eq!(media.rules().unwrap().len(), 1);
}

#[test]
fn test_empty_conditional_renders_nothing() {
    let sheet = compile(r#"{"@media print": {"a": {}}, "b": {"color": "red"}}"#);
    assert_eq!(sheet.to_string(), ".b-2 {\n  color: red;\n}");
}

#[test]
fn test_keyframes_and_references() {
    let sheet = compile(
        r#"{
            "@keyframes fade": {"from": {"opacity": 0}, "to": {"opacity": 1}},
            "box": {"animation": "$fade 1s"}
        }"#,
    );
    assert_eq!(
        sheet.to_string(),
        "@keyframes fade-1 {\n  from {\n    opacity: 0;\n  }\n  to {\n    opacity: 1;\n  }\n}\n\
         .box-2 {\n  animation: fade-1 1s;\n}"
    );
    assert_eq!(sheet.keyframes().get("fade").map(String::as_str), Some("fade-1"));

    let rule = sheet.get_rule("@keyframes fade").unwrap();
    assert_eq!(rule.key(), "keyframes-fade");
    assert_eq!(rule.rule_type(), RuleType::Keyframes);
}

#[test]
fn test_unknown_keyframes_reference_is_kept() {
    let sheet = compile(r#"{"box": {"animation-name": "$missing"}}"#);
    assert_eq!(sheet.to_string(), ".box-1 {\n  animation-name: $missing;\n}");
}

#[test]
fn test_fallbacks_come_first() {
    let sheet = compile(r#"{"a": {"display": "flex", "fallbacks": [{"display": "box"}]}}"#);
    assert_eq!(sheet.to_string(), ".a-1 {\n  display: box;\n  display: flex;\n}");
}

#[test]
fn test_list_values() {
    let sheet = compile(
        r#"{"a": {
            "border": [["1px", "solid", "red"], ["2px", "dashed", "blue"]],
            "transition": ["opacity 1s", "color 2s"],
            "margin": [["0", "auto"], "!important"]
        }}"#,
    );
    assert_eq!(
        sheet.to_string(),
        ".a-1 {\n  border: 1px solid red, 2px dashed blue;\n  transition: opacity 1s, color 2s;\n  margin: 0 auto !important;\n}"
    );
}

#[test]
fn test_empty_values_are_omitted() {
    let sheet = compile(r#"{"a": {"color": null, "display": false, "width": 0}}"#);
    assert_eq!(sheet.to_string(), ".a-1 {\n  width: 0;\n}");
}

#[test]
fn test_empty_rules_are_skipped() {
    let sheet = compile(r#"{"a": {}, "b": {"color": "red"}}"#);
    assert_eq!(sheet.to_string(), ".b-2 {\n  color: red;\n}");
}

#[test]
fn test_link_mode_keeps_empty_rules() {
    let styles = styles(r#"{"a": {}, "b": {"color": "red"}}"#);
    let sheet = jss().create_style_sheet(
        &styles,
        StyleSheetOptions {
            link: true,
            ..StyleSheetOptions::default()
        },
    );
    assert_eq!(sheet.to_string(), ".a-1 {}\n.b-2 {\n  color: red;\n}");
}

#[test]
fn test_compact_format() {
    let sheet = compile(r#"{"a": {"color": "red"}, "@media print": {"a": {"color": "black"}}}"#);
    let options = ToCssOptions {
        format: false,
        ..ToCssOptions::default()
    };
    assert_eq!(sheet.to_css_string(&options), ".a-1{color:red;}@media print {.a-1{color:black;}}");
}

#[test]
fn test_font_face_single_and_many() {
    let sheet = compile(
        r#"{"@font-face": [
            {"font-family": "A", "src": "url(a.woff)"},
            {"font-family": "B", "src": "url(b.woff)"}
        ]}"#,
    );
    assert_eq!(
        sheet.to_string(),
        "@font-face {\n  font-family: A;\n  src: url(a.woff);\n}\n@font-face {\n  font-family: B;\n  src: url(b.woff);\n}"
    );

    let sheet = compile(r#"{"@font-face": {"font-family": "C"}}"#);
    assert_eq!(sheet.to_string(), "@font-face {\n  font-family: C;\n}");
}

#[test]
fn test_viewport_and_simple_rules() {
    let sheet = compile(
        r#"{
            "@charset": "\"utf-8\"",
            "@import": ["url(a.css)", "url(b.css)"],
            "@-ms-viewport": {"width": "device-width"}
        }"#,
    );
    assert_eq!(
        sheet.to_string(),
        "@charset \"utf-8\";\n@import url(a.css);\n@import url(b.css);\n@-ms-viewport {\n  width: device-width;\n}"
    );
}

#[test]
fn test_unknown_at_rule_is_skipped() {
    let sheet = compile(r#"{"@unknown": {"a": "b"}, "a": {"color": "red"}}"#);
    assert_eq!(sheet.rules().len(), 1);
    assert!(sheet.get_rule("@unknown").is_none());
}

#[test]
fn test_non_object_top_level_value_is_skipped() {
    let sheet = compile(r#"{"a": "red", "b": {"color": "red"}}"#);
    assert_eq!(sheet.rules().len(), 1);
}

#[test]
fn test_duplicate_key_is_rejected() {
    let mut sheet = compile(r#"{"a": {"color": "red"}}"#);
    let decl = StyleValue::from(Style::new().with("color", "blue"));
    let err = sheet.add_rule("a", &decl, AddRuleOptions::default()).unwrap_err();
    assert_eq!(err, RuleError::DuplicateKey { key: "a".to_string() });
    assert_eq!(sheet.to_string(), ".a-1 {\n  color: red;\n}");
}

#[test]
fn test_add_rule_at_index() {
    let mut sheet = compile(r#"{"a": {"color": "red"}, "b": {"color": "blue"}}"#);
    let decl = StyleValue::from(Style::new().with("color", "green"));
    let options = AddRuleOptions {
        index: Some(1),
        ..AddRuleOptions::default()
    };
    let rule = sheet.add_rule("c", &decl, options).unwrap().unwrap();
    assert_eq!(rule.selector(), Some(".c-3"));
    assert_eq!(sheet.index_of("c"), Some(1));
    assert_eq!(sheet.index_of("b"), Some(2));
}

#[test]
fn test_add_rule_with_explicit_selector() {
    let mut sheet = compile("{}");
    let decl = StyleValue::from(Style::new().with("margin", 0));
    let options = AddRuleOptions {
        selector: Some("body".to_string()),
        ..AddRuleOptions::default()
    };
    let _ = sheet.add_rule("reset", &decl, options).unwrap();
    assert_eq!(sheet.to_string(), "body {\n  margin: 0;\n}");
    assert!(sheet.get_rule("body").is_some());
    assert!(sheet.class_name("reset").is_none());
}

#[test]
fn test_import_is_hoisted() {
    let mut sheet = compile(r#"{"a": {"color": "red"}}"#);
    let _ = sheet
        .add_rule("@import", &StyleValue::from("url(x.css)"), AddRuleOptions::default())
        .unwrap();
    assert_eq!(sheet.to_string(), "@import url(x.css);\n.a-1 {\n  color: red;\n}");
}

#[test]
fn test_replace_rule_keeps_position() {
    let mut sheet = compile(r#"{"a": {"color": "red"}, "b": {"color": "blue"}}"#);
    let decl = StyleValue::from(Style::new().with("color", "green"));
    let _ = sheet.replace_rule("a", &decl, AddRuleOptions::default()).unwrap();
    assert_eq!(sheet.index_of("a"), Some(0));
    assert_eq!(sheet.to_string(), ".a-3 {\n  color: green;\n}\n.b-2 {\n  color: blue;\n}");
}

#[test]
fn test_delete_rule_by_selector() {
    let mut sheet = compile(r#"{"a": {"color": "red"}, "b": {"color": "blue"}}"#);
    assert!(sheet.delete_rule(".a-1"));
    assert!(sheet.get_rule("a").is_none());
    assert!(sheet.class_name("a").is_none());
    assert!(!sheet.delete_rule("a"));
    assert_eq!(sheet.to_string(), ".b-2 {\n  color: blue;\n}");
}

#[test]
fn test_sheet_index_defaults() {
    let mut jss = jss();
    let first = jss.create_style_sheet(&Style::new(), StyleSheetOptions::default());
    let explicit = jss.create_style_sheet(
        &Style::new(),
        StyleSheetOptions {
            index: Some(10),
            ..StyleSheetOptions::default()
        },
    );
    let next = jss.create_style_sheet(&Style::new(), StyleSheetOptions::default());
    assert_eq!(first.index(), 0);
    assert_eq!(explicit.index(), 10);
    assert_eq!(next.index(), 11);
}

#[test]
fn test_static_sheet_has_no_dynamic_styles() {
    let sheet = compile(r#"{"a": {"color": "red"}}"#);
    assert!(sheet.dynamic_styles().is_none());
}

#[test]
fn test_style_rule_to_json() {
    let sheet = compile(r#"{"a": {"color": "red", "margin": ["0", "auto"], "z-index": 2, "b": {"x": 1}}}"#);
    let Some(rulesheet::RuleKind::Style(rule)) = sheet.get_rule("a").map(rulesheet::Rule::kind) else {
        panic!("expected a style rule");
    };
    assert_eq!(
        rule.to_json(),
        serde_json::json!({"color": "red", "margin": "0, auto", "z-index": 2.0})
    );
}

#[test]
fn test_link_mode_skips_empty_containers() {
    let options = StyleSheetOptions {
        link: true,
        ..StyleSheetOptions::default()
    };
    let sheet = jss().create_style_sheet(
        &styles(r#"{"a": {"color": "red"}, "@media print": {}, "b": {}}"#),
        options,
    );
    assert_eq!(sheet.to_string(), ".a-1 {\n  color: red;\n}\n.b-2 {}");
}
