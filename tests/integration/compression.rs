use crate::common::yaml;
use flate2::Compression as Level;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use yaml_include::{IncludeError, Includer};

fn write_gz(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Level::default());
    encoder.write_all(contents.as_bytes()).unwrap();
    std::fs::write(path, encoder.finish().unwrap()).unwrap();
}

fn gz_tree() -> (TempDir, Includer) {
    let temp = TempDir::new().unwrap();
    write_gz(&temp.path().join("data/a.yaml.gz"), "a: 1");
    write_gz(&temp.path().join("data/b.yaml.gz"), "b: 2");
    let includer = Includer::builder().base_dir(temp.path()).build().unwrap();
    (temp, includer)
}

#[test]
fn test_single_gzip_file() {
    let (_temp, includer) = gz_tree();
    let doc = includer.load_str("x: !inc {urlpath: data/a.yaml.gz, compression: gzip}").unwrap();
    assert_eq!(doc["x"], yaml("a: 1"));
}

#[test]
fn test_inferred_compression_over_glob() {
    let (_temp, includer) = gz_tree();
    let doc = includer
        .load_str("x: !inc {urlpath: data/*.yaml.gz, open: {compression: infer}}")
        .unwrap();
    assert_eq!(doc["x"], yaml("[{a: 1}, {b: 2}]"));
}

#[test]
fn test_positional_open_params_carry_compression() {
    let (_temp, includer) = gz_tree();
    let doc = includer.load_str("x: !inc [data/*.yaml.gz, null, [r, gzip]]").unwrap();
    assert_eq!(doc["x"], yaml("[{a: 1}, {b: 2}]"));
}

#[test]
fn test_unknown_compression_is_rejected() {
    let (_temp, includer) = gz_tree();
    let err = includer.load_str("x: !inc {urlpath: data/a.yaml.gz, compression: lz4}").unwrap_err();
    assert!(matches!(err, IncludeError::ConfigError { .. }), "{err:?}");
}
