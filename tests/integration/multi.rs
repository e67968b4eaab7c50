use crate::common::{fixture_includer, sorted_by_name, yaml};
use serde_yaml::Value;
use tempfile::TempDir;
use yaml_include::test_utils::write_fixture;
use yaml_include::{IncludeError, Includer};

#[test]
fn test_wildcard_include_lists_every_match() {
    let doc = fixture_includer().load_str("files: !inc include.d/*.yaml").unwrap();
    assert_eq!(sorted_by_name(&doc["files"]), vec![yaml("name: '1'"), yaml("name: '2'")]);
}

#[test]
fn test_double_star_without_maxdepth_is_unbounded() {
    let doc = fixture_includer().load_str("files: !inc include.d/**/*.yaml").unwrap();
    let names: Vec<Value> = sorted_by_name(&doc["files"]).iter().map(|v| v["name"].clone()).collect();
    assert_eq!(names, ["1", "2", "3", "4"].map(Value::from).to_vec());
}

#[test]
fn test_maxdepth_forms_agree() {
    let includer = fixture_includer();
    let positional = includer.load_str("f: !inc [include.d/**/*.yaml, 1]").unwrap();
    let keyword = includer.load_str("f: !inc {urlpath: include.d/**/*.yaml, glob: {maxdepth: 1}}").unwrap();
    let bare = includer.load_str("f: !inc {urlpath: include.d/**/*.yaml, glob: 1}").unwrap();
    let string = includer.load_str("f: !inc [include.d/**/*.yaml, '1']").unwrap();

    let names = |doc: &Value| -> Vec<Value> {
        sorted_by_name(&doc["f"]).iter().map(|v| v["name"].clone()).collect()
    };
    assert_eq!(names(&positional), ["1", "2", "3"].map(Value::from).to_vec());
    assert_eq!(names(&keyword), names(&positional));
    assert_eq!(names(&bare), names(&positional));
    assert_eq!(names(&string), names(&positional));
}

#[test]
fn test_positional_glob_and_open_params() {
    let doc = fixture_includer().load_str("f: !inc [include.d/*.yaml, null, {encoding: utf-8}]").unwrap();
    assert_eq!(doc["f"].as_sequence().map(Vec::len), Some(2));
}

#[test]
fn test_invalid_maxdepth_in_mapping() {
    let err = fixture_includer()
        .load_str("f: !inc {urlpath: include.d/**/*.yaml, glob: {maxdepth: deep}}")
        .unwrap_err();
    assert!(matches!(err, IncludeError::ConfigError { .. }), "{err:?}");
}

#[test]
fn test_zero_matches_is_empty_list() {
    let doc = fixture_includer().load_str("f: !inc include.d/*.json").unwrap();
    assert_eq!(doc["f"], Value::Sequence(Vec::new()));
}

#[test]
fn test_flatten_concatenates_lists() {
    let includer = fixture_includer();
    let flat = includer.load_str("f: !inc {urlpath: lists/*.yaml, flatten: true}").unwrap();
    let nested = includer.load_str("f: !inc lists/*.yaml").unwrap();

    let concatenated: Vec<Value> = nested["f"]
        .as_sequence()
        .unwrap()
        .iter()
        .flat_map(|part| part.as_sequence().cloned().unwrap_or_default())
        .collect();
    assert_eq!(flat["f"], Value::Sequence(concatenated));
    assert_eq!(flat["f"], yaml("[1, 2, 3]"));
}

#[test]
fn test_flatten_accepts_string_boolean() {
    let doc = fixture_includer().load_str("f: !inc {urlpath: lists/*.yaml, flatten: 'true'}").unwrap();
    assert_eq!(doc["f"], yaml("[1, 2, 3]"));
}

#[test]
fn test_flatten_rejects_non_list_file() {
    let err = fixture_includer().load_str("f: !inc {urlpath: include.d/*.yaml, flatten: true}").unwrap_err();
    match err {
        IncludeError::FlattenNotSequence {
            path,
            found,
        } => {
            assert!(path.ends_with(".yaml"), "{path}");
            assert_eq!(found, "a mapping");
        }
        other => panic!("expected FlattenNotSequence, got {other:?}"),
    }
}

#[test]
fn test_flatten_is_ignored_for_single_files() {
    let doc = fixture_includer().load_str("f: !inc {urlpath: include.d/1.yaml, flatten: true}").unwrap();
    assert_eq!(doc["f"], yaml("name: '1'"));
}

#[test]
fn test_one_bad_file_fails_the_whole_include() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "conf/a.yaml", "ok: true");
    write_fixture(temp.path(), "conf/b.yaml", "broken: [");
    let includer = Includer::builder().base_dir(temp.path()).build().unwrap();

    let err = includer.load_str("all: !inc conf/*.yaml").unwrap_err();
    assert!(matches!(err, IncludeError::Parse { ref path, .. } if path.ends_with("b.yaml")), "{err:?}");
}

#[test]
fn test_results_follow_listing_order() {
    let temp = TempDir::new().unwrap();
    for name in ["c", "a", "b"] {
        write_fixture(temp.path(), &format!("conf/{name}.yaml"), name);
    }
    let includer = Includer::builder().base_dir(temp.path()).build().unwrap();
    let doc = includer.load_str("all: !inc conf/*.yaml").unwrap();
    assert_eq!(doc["all"], yaml("[a, b, c]"));
}
