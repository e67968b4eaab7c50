use crate::common::{fixture_includer, yaml};
use serde_yaml::Value;
use yaml_include::readers::ReaderTable;
use yaml_include::{IncludeError, Includer};

#[test]
fn test_structured_default_replaces_missing_file() {
    let doc = fixture_includer()
        .load_str("opt: !inc {urlpath: local.yaml, default: {debug: false, level: 3}}")
        .unwrap();
    assert_eq!(doc["opt"], yaml("{debug: false, level: 3}"));
}

#[test]
fn test_textual_default_is_parsed_like_file_content() {
    let doc = fixture_includer().load_str("opt: !inc {urlpath: local.yaml, default: 'a: [1, 2]'}").unwrap();
    assert_eq!(doc["opt"], yaml("a: [1, 2]"));
}

#[test]
fn test_textual_default_can_hold_includes() {
    let doc = fixture_includer()
        .load_str("opt: !inc {urlpath: local.yaml, default: 'x: !inc include.d/1.yaml'}")
        .unwrap();
    assert_eq!(doc["opt"], yaml("x: {name: '1'}"));
}

#[test]
fn test_unparseable_default_is_kept_as_text() {
    let doc = fixture_includer().load_str("opt: !inc {urlpath: local.yaml, default: '[oops'}").unwrap();
    assert_eq!(doc["opt"], Value::from("[oops"));
}

#[test]
fn test_null_default_is_honoured() {
    let doc = fixture_includer().load_str("opt: !inc {urlpath: local.yaml, default: null}").unwrap();
    assert_eq!(doc["opt"], Value::Null);
}

#[test]
fn test_default_is_unused_when_file_exists() {
    let doc = fixture_includer()
        .load_str("opt: !inc {urlpath: include.d/1.yaml, default: {fallback: true}}")
        .unwrap();
    assert_eq!(doc["opt"], yaml("name: '1'"));
}

#[test]
fn test_default_does_not_hide_other_errors() {
    let err = fixture_includer()
        .load_str("opt: !inc {urlpath: include.d/1.yaml, mode: w, default: {}}")
        .unwrap_err();
    assert!(matches!(err, IncludeError::ConfigError { .. }), "{err:?}");
}

#[test]
fn test_textual_default_goes_through_reader_table() {
    let includer = Includer::builder()
        .base_dir(crate::common::fixtures_dir())
        .shared_format_loader(ReaderTable::default().into_loader())
        .build()
        .unwrap();
    let doc = includer
        .load_str(r#"opt: !inc {urlpath: missing.json, default: '{"port": 80}'}"#)
        .unwrap();
    assert_eq!(doc["opt"], yaml("port: 80"));
}

#[test]
fn test_missing_file_without_default_fails() {
    let err = fixture_includer().load_str("opt: !inc local.yaml").unwrap_err();
    assert!(err.is_not_found());
}
