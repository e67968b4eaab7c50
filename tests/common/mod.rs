//! Common test utilities for the yaml-include integration suite
//!
//! Fixture paths, includer shortcuts and a tiny blocking HTTP server used by
//! the remote-backend tests.

// Not every helper is used by every test module
#![allow(dead_code)]

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use yaml_include::Includer;

/// The checked-in fixture tree.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// An includer rooted at the fixture tree.
pub fn fixture_includer() -> Includer {
    Includer::builder().base_dir(fixtures_dir()).build().expect("default includer settings are valid")
}

/// Parse a YAML literal for comparisons.
pub fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap_or_else(|e| panic!("invalid YAML literal {text:?}: {e}"))
}

/// Sort a sequence of mappings by their `name` key.
pub fn sorted_by_name(value: &Value) -> Vec<Value> {
    let mut items = value.as_sequence().cloned().unwrap_or_default();
    items.sort_by(|a, b| {
        let name = |v: &Value| v.get("name").and_then(Value::as_str).map(str::to_owned);
        name(a).cmp(&name(b))
    });
    items
}

/// Minimal HTTP/1.1 server answering GET requests from an in-memory table.
///
/// Paths ending in `/` get an HTML index linking every served path directly
/// below them. Unknown paths answer 404. The accept loop runs on a detached
/// thread for the lifetime of the test process.
#[derive(Clone)]
pub struct TestServer {
    base: String,
    files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("test server address");
        let server = Self {
            base: format!("http://{addr}"),
            files: Arc::default(),
            requests: Arc::default(),
        };

        let handler = server.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let handler = handler.clone();
                thread::spawn(move || handler.handle(stream));
            }
        });
        server
    }

    /// Serve `contents` at `path` (which starts with `/`).
    pub fn with_file(self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.files.lock().unwrap().insert(path.to_string(), contents.into());
        self
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Request lines received so far, as `METHOD /path`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn handle(&self, mut stream: TcpStream) {
        let Ok(clone) = stream.try_clone() else {
            return;
        };
        let mut reader = BufReader::new(clone);
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            return;
        }
        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) if line == "\r\n" => break,
                Ok(_) => headers.push(line.trim_end().to_string()),
            }
        }

        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or("/").to_string();
        self.requests.lock().unwrap().push(format!("{method} {path}"));

        let found = self.files.lock().unwrap().get(&path).cloned();
        let (status, body) = match found {
            Some(body) => ("200 OK", body),
            None if path.ends_with('/') => match self.index(&path) {
                Some(page) => ("200 OK", page.into_bytes()),
                None => ("404 Not Found", b"not found".to_vec()),
            },
            None => ("404 Not Found", b"not found".to_vec()),
        };

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&body);
        let _ = stream.flush();
    }

    /// Index page for directory `dir`, or `None` when nothing lives below it.
    fn index(&self, dir: &str) -> Option<String> {
        let files = self.files.lock().unwrap();
        let mut entries: Vec<String> = files
            .keys()
            .filter_map(|path| path.strip_prefix(dir))
            .filter(|rest| !rest.is_empty())
            .map(|rest| match rest.split_once('/') {
                Some((subdir, _)) => format!("{subdir}/"),
                None => rest.to_string(),
            })
            .collect();
        entries.dedup();
        if entries.is_empty() {
            return None;
        }
        let links: String =
            entries.iter().map(|e| format!("<li><a href=\"{e}\">{e}</a></li>\n")).collect();
        Some(format!(
            "<html><body><a href=\"../\">Parent</a><a href=\"?C=N;O=D\">Name</a><ul>\n{links}</ul></body></html>"
        ))
    }
}
