use crate::common::{fixture_includer, yaml};
use serde_yaml::Value;
use tempfile::TempDir;
use yaml_include::test_utils::write_fixture;
use yaml_include::walker::Segment;
use yaml_include::{Directive, IncludeError, Includer, LazyWalk, walk, walk_in_place};

const DOC: &str = "\
file1: !inc include.d/1.yaml
files: !inc [include.d/*.yaml]
nested:
  - plain
  - !inc {urlpath: lists/*.yaml, flatten: true}
";

#[test]
fn test_deferred_load_then_walk_matches_eager_load() {
    let includer = fixture_includer();
    let eager = includer.load_str(DOC).unwrap();
    let deferred = includer.with_autoload(false).load_str(DOC).unwrap();
    assert_ne!(deferred, eager);

    let walked = walk(&includer, &deferred, true).unwrap();
    assert_eq!(walked, eager);
    // the input tree is left alone
    assert!(matches!(deferred["file1"], Value::Tagged(_)));
}

#[test]
fn test_walk_in_place_matches_eager_load() {
    let includer = fixture_includer();
    let mut doc = includer.with_autoload(false).load_str(DOC).unwrap();
    walk_in_place(&includer, &mut doc, true).unwrap();
    assert_eq!(doc, includer.load_str(DOC).unwrap());
}

#[test]
fn test_dump_round_trips_deferred_directives() {
    let includer = fixture_includer().with_autoload(false);
    let doc = includer.load_str(DOC).unwrap();
    let text = includer.dump(&doc).unwrap();
    assert!(text.contains("!inc include.d/1.yaml"), "{text}");
    assert!(text.contains("flatten: true"), "{text}");
    assert_eq!(includer.load_str(&text).unwrap(), doc);
}

#[test]
fn test_dump_of_directive_built_in_code() {
    let includer = Includer::new();
    let directive = Directive::new("conf/*.yaml")
        .unwrap()
        .with_positional(vec![Value::from(2)]);
    let node = directive.to_node(includer.tag());
    let text = includer.dump(&node).unwrap();
    assert!(text.starts_with("!inc"), "{text}");

    let reparsed = includer.with_autoload(false).load_str(&text).unwrap();
    assert_eq!(reparsed, node);
    let Value::Tagged(tagged) = reparsed else {
        panic!("expected a tagged node, got {reparsed:?}");
    };
    assert_eq!(Directive::from_node(&tagged.value).unwrap(), directive);
}

#[test]
fn test_lazy_walk_yields_in_document_order() {
    let includer = fixture_includer();
    let mut doc = includer.with_autoload(false).load_str(DOC).unwrap();

    let steps: Vec<_> = LazyWalk::new(&includer, &mut doc, true).collect::<Result<_, _>>().unwrap();
    let targets: Vec<&str> = steps.iter().map(|s| s.directive.target()).collect();
    assert_eq!(targets, ["include.d/1.yaml", "include.d/*.yaml", "lists/*.yaml"]);
    assert_eq!(steps[2].location.segments(), &[Segment::Key(Value::from("nested")), Segment::Index(1)]);
    assert_eq!(steps[2].location.to_string(), "$.nested[1]");

    assert_eq!(doc, includer.load_str(DOC).unwrap());
}

#[test]
fn test_lazy_walk_can_stop_early() {
    let includer = fixture_includer();
    let mut doc = includer.with_autoload(false).load_str(DOC).unwrap();
    {
        let mut steps = LazyWalk::new(&includer, &mut doc, true);
        let first = steps.next().unwrap().unwrap();
        assert_eq!(first.directive.target(), "include.d/1.yaml");
    }
    assert_eq!(doc["file1"], yaml("name: '1'"));
    assert!(matches!(doc["files"], Value::Tagged(_)));
}

#[test]
fn test_nested_walk_resolves_directives_inside_included_files() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "outer.yaml", "inner: !inc inner.yaml");
    write_fixture(temp.path(), "inner.yaml", "value: 42");
    let includer = Includer::builder().base_dir(temp.path()).autoload(false).build().unwrap();

    let doc = includer.load_str("top: !inc outer.yaml").unwrap();

    let shallow = walk(&includer, &doc, false).unwrap();
    assert!(matches!(shallow["top"]["inner"], Value::Tagged(_)), "{shallow:?}");

    let deep = walk(&includer, &doc, true).unwrap();
    assert_eq!(deep, yaml("top: {inner: {value: 42}}"));

    let mut lazy = doc.clone();
    let count = LazyWalk::new(&includer, &mut lazy, true).filter_map(Result::ok).count();
    assert_eq!(count, 2);
    assert_eq!(lazy, deep);
}

#[test]
fn test_lazy_walk_stops_after_error() {
    let includer = fixture_includer();
    let mut doc = includer
        .with_autoload(false)
        .load_str("a: !inc include.d/1.yaml\nb: !inc missing.yaml\nc: !inc include.d/2.yaml")
        .unwrap();

    let results: Vec<_> = LazyWalk::new(&includer, &mut doc, true).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(IncludeError::NotFound { .. })));

    // work done before the failure is kept
    assert_eq!(doc["a"], yaml("name: '1'"));
    assert!(matches!(doc["c"], Value::Tagged(_)));
}

#[test]
fn test_walk_leaves_foreign_tags_alone() {
    let includer = fixture_includer();
    let doc = includer.with_autoload(false).load_str("a: !secret xyz\nb: !inc include.d/1.yaml").unwrap();
    let walked = walk(&includer, &doc, true).unwrap();
    assert_eq!(walked["a"], doc["a"]);
    assert_eq!(walked["b"]["name"], "1");
}
