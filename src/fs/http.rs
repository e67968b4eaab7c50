//! HTTP(S) backend built on the blocking `reqwest` client.
//!
//! `open` issues one GET per file. `glob` has no server-side listing to
//! call, so it crawls the HTML index page served at the pattern's literal
//! root, follows `href` links below that root and matches them against the
//! wildcard part of the pattern.

use super::{
    FileSystem, OpenFile, OpenOptions, PatternMatcher, glob_depth, glob_maxdepth, split_glob_root,
};
use crate::constants::{MAX_HTTP_CRAWL_DEPTH, default_http_timeout};
use crate::core::{IncludeError, Result};
use crate::params::CallArgs;
use regex::Regex;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, trace};

/// Backend-specific keys accepted by [`HttpFileSystem::open`].
const HTTP_OPEN_KEYS: [&str; 2] = ["headers", "timeout"];

/// Client settings shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
            headers: BTreeMap::new(),
        }
    }
}

/// Backend for `http://` and `https://` URLs.
#[derive(Debug, Clone)]
pub struct HttpFileSystem {
    client: Client,
    config: HttpConfig,
}

impl HttpFileSystem {
    /// Build the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`IncludeError::Http`] when the TLS backend cannot be
    /// initialised.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            IncludeError::Http {
                url: String::new(),
                reason: format!("cannot build HTTP client: {e}"),
            }
        })?;
        Ok(Self {
            client,
            config,
        })
    }

    /// The settings this backend was built with.
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn request(&self, url: &str) -> RequestBuilder {
        self.config
            .headers
            .iter()
            .fold(self.client.get(url), |req, (name, value)| req.header(name, value))
    }

    fn send(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        debug!("GET {}", url);
        let response = request.send().map_err(|e| IncludeError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IncludeError::NotFound {
                path: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(IncludeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Fetch an index page as text.
    fn fetch_page(&self, url: &str) -> Result<String> {
        let mut body = String::new();
        self.send(url, self.request(url))?
            .read_to_string(&mut body)
            .map_err(|e| IncludeError::from_io("reading", url, e))?;
        Ok(body)
    }

    /// Collect file URLs below `root`, at most `depth` path segments deep.
    fn crawl(&self, root: &Url, depth: usize) -> Result<Vec<String>> {
        let mut files = BTreeSet::new();
        let mut pending = vec![(root.clone(), 1usize)];
        let mut visited = BTreeSet::new();

        while let Some((page, level)) = pending.pop() {
            if !visited.insert(page.to_string()) {
                continue;
            }
            let body = match self.fetch_page(page.as_str()) {
                Ok(body) => body,
                // A missing root means nothing matches.
                Err(e) if e.is_not_found() && page == *root => return Ok(Vec::new()),
                Err(e) => return Err(e),
            };

            for link in extract_links(&body) {
                let Some(url) = resolve_link(&page, &link) else {
                    trace!("Skipping unresolvable link {}", link);
                    continue;
                };
                if url.as_str() == page.as_str() || !url.as_str().starts_with(root.as_str()) {
                    continue;
                }
                if url.path().ends_with('/') {
                    if level < depth {
                        pending.push((url, level + 1));
                    }
                } else {
                    files.insert(url.to_string());
                }
            }
        }

        Ok(files.into_iter().collect())
    }
}

/// Pull every `href` target out of an HTML page.
pub(crate) fn extract_links(html: &str) -> Vec<String> {
    static HREF: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = HREF.get_or_init(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).ok())
    else {
        return Vec::new();
    };
    re.captures_iter(html).filter_map(|c| c.get(1)).map(|m| m.as_str().to_string()).collect()
}

/// Resolve a link against the page it appeared on, dropping query and
/// fragment.
pub(crate) fn resolve_link(page: &Url, href: &str) -> Option<Url> {
    if href.starts_with('#') || href.starts_with('?') || href.starts_with("mailto:") {
        return None;
    }
    let mut url = page.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    Some(url)
}

fn parse_root(pattern: &str, root: &[&str]) -> Result<Url> {
    let mut root = root.join("/");
    root.push('/');
    Url::parse(&root).map_err(|e| IncludeError::Http {
        url: pattern.to_string(),
        reason: format!("invalid URL: {e}"),
    })
}

impl FileSystem for HttpFileSystem {
    fn glob(&self, pattern: &str, args: &CallArgs) -> Result<Vec<String>> {
        let maxdepth = glob_maxdepth(pattern, args)?;
        let (root, rest) = split_glob_root(pattern);
        if rest.is_empty() {
            return Ok(vec![pattern.to_string()]);
        }

        let root_url = parse_root(pattern, &root)?;
        let matcher = PatternMatcher::new(&rest.join("/"))?;
        let depth = glob_depth(&rest, maxdepth).unwrap_or(MAX_HTTP_CRAWL_DEPTH);
        debug!("Crawling {} up to depth {} for '{}'", root_url, depth, matcher.pattern());

        let matches = self
            .crawl(&root_url, depth)?
            .into_iter()
            .filter(|url| {
                url.strip_prefix(root_url.as_str()).is_some_and(|relative| matcher.matches(relative))
            })
            .collect();
        Ok(matches)
    }

    fn open(&self, path: &str, args: &CallArgs) -> Result<OpenFile> {
        let options = OpenOptions::parse(path, args, &HTTP_OPEN_KEYS)?;

        let mut request = self.request(path);
        if let Some(headers) = args.named.get("headers") {
            let Value::Mapping(headers) = headers else {
                return Err(IncludeError::config(format!(
                    "`headers` for '{path}' must be a mapping"
                )));
            };
            for (name, value) in headers {
                match (name.as_str(), header_value(value)) {
                    (Some(name), Some(value)) => request = request.header(name, value),
                    _ => {
                        return Err(IncludeError::config(format!(
                            "invalid header {name:?}: {value:?} for '{path}'"
                        )));
                    }
                }
            }
        }
        if let Some(timeout) = args.named.get("timeout") {
            let secs = timeout.as_f64().filter(|s| s.is_finite() && *s > 0.0).ok_or_else(|| {
                IncludeError::config(format!("`timeout` must be a positive number, got {timeout:?}"))
            })?;
            request = request.timeout(Duration::from_secs_f64(secs));
        }

        let response = self.send(path, request)?;
        Ok(OpenFile::new(path, response).decompress(options.compression))
    }
}

fn header_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
