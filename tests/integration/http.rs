use crate::common::{TestServer, sorted_by_name, yaml};
use serde_yaml::Value;
use yaml_include::fs::{DefaultFileSystem, HttpConfig};
use yaml_include::{IncludeError, Includer};

fn server() -> TestServer {
    TestServer::start()
        .with_file("/conf/1.yaml", "name: '1'")
        .with_file("/conf/2.yaml", "name: '2'")
        .with_file("/conf/readme.txt", "not yaml")
        .with_file("/conf/sub/3.yaml", "name: '3'")
        .with_file("/conf/sub/deeper/4.yaml", "name: '4'")
        .with_file("/lists/a.yaml", "[1, 2]")
        .with_file("/lists/b.yaml", "[3]")
}

fn names(value: &Value) -> Vec<Value> {
    sorted_by_name(value).iter().map(|v| v["name"].clone()).collect()
}

#[test]
fn test_remote_single_include() {
    let server = server();
    let doc = Includer::new().load_str(&format!("a: !inc '{}'", server.url("/conf/1.yaml"))).unwrap();
    assert_eq!(doc["a"], yaml("name: '1'"));
    assert_eq!(server.requests(), ["GET /conf/1.yaml"]);
}

#[test]
fn test_remote_glob_crawls_index() {
    let server = server();
    let doc = Includer::new().load_str(&format!("a: !inc '{}'", server.url("/conf/*.yaml"))).unwrap();
    assert_eq!(names(&doc["a"]), ["1", "2"].map(Value::from).to_vec());
}

#[test]
fn test_remote_double_star_respects_maxdepth() {
    let server = server();
    let includer = Includer::new();
    let pattern = server.url("/conf/**/*.yaml");

    let bounded = includer.load_str(&format!("a: !inc {{urlpath: '{pattern}', maxdepth: 1}}")).unwrap();
    assert_eq!(names(&bounded["a"]), ["1", "2", "3"].map(Value::from).to_vec());

    let unbounded = includer.load_str(&format!("a: !inc '{pattern}'")).unwrap();
    assert_eq!(names(&unbounded["a"]), ["1", "2", "3", "4"].map(Value::from).to_vec());
}

#[test]
fn test_remote_flatten() {
    let server = server();
    let doc = Includer::new()
        .load_str(&format!("a: !inc {{urlpath: '{}', flatten: true}}", server.url("/lists/*.yaml")))
        .unwrap();
    assert_eq!(doc["a"], yaml("[1, 2, 3]"));
}

#[test]
fn test_remote_glob_without_index_is_empty() {
    let server = server();
    let doc = Includer::new().load_str(&format!("a: !inc '{}'", server.url("/nothing/*.yaml"))).unwrap();
    assert_eq!(doc["a"], Value::Sequence(Vec::new()));
}

#[test]
fn test_missing_remote_file_is_not_found() {
    let server = server();
    let url = server.url("/conf/missing.yaml");
    let err = Includer::new().load_str(&format!("a: !inc '{url}'")).unwrap_err();
    assert!(matches!(err, IncludeError::NotFound { ref path } if *path == url), "{err:?}");

    let doc = Includer::new()
        .load_str(&format!("a: !inc {{urlpath: '{url}', default: {{remote: false}}}}"))
        .unwrap();
    assert_eq!(doc["a"], yaml("remote: false"));
}

#[test]
fn test_remote_file_with_nested_remote_include() {
    let server = server();
    let server = server.clone().with_file(
        "/outer.yaml",
        format!("inner: !inc '{}'", server.url("/conf/2.yaml")),
    );
    let doc = Includer::new().load_str(&format!("a: !inc '{}'", server.url("/outer.yaml"))).unwrap();
    assert_eq!(doc["a"], yaml("inner: {name: '2'}"));
}

#[test]
fn test_remote_open_options() {
    let server = server();
    let includer = Includer::new();
    let url = server.url("/conf/1.yaml");

    let doc = includer
        .load_str(&format!("a: !inc {{urlpath: '{url}', timeout: 2.5, headers: {{X-Test: yes}}}}"))
        .unwrap();
    assert_eq!(doc["a"]["name"], "1");

    let err = includer.load_str(&format!("a: !inc {{urlpath: '{url}', timeout: -1}}")).unwrap_err();
    assert!(matches!(err, IncludeError::ConfigError { .. }), "{err:?}");

    let err = includer.load_str(&format!("a: !inc {{urlpath: '{url}', block_size: 1}}")).unwrap_err();
    assert!(matches!(err, IncludeError::ConfigError { .. }), "{err:?}");
}

#[test]
fn test_configured_backend() {
    let server = server();
    let config = HttpConfig {
        headers: [("X-Token".to_string(), "secret".to_string())].into(),
        ..HttpConfig::default()
    };
    let includer = Includer::builder().fs(DefaultFileSystem::with_http_config(config)).build().unwrap();
    let doc = includer.load_str(&format!("a: !inc '{}'", server.url("/conf/2.yaml"))).unwrap();
    assert_eq!(doc["a"]["name"], "2");
}
