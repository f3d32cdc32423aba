use std::sync::Mutex;

use indexmap::IndexMap;

use crate::foundation::lock;
use crate::foundation::value::Value;

/// Incoming request as seen by parameter extractors and form submission.
pub trait Request: Send + Sync {
    fn path(&self) -> &str;
    /// First value of a query or form parameter.
    fn parameter(&self, name: &str) -> Option<String>;
    /// Every value of a parameter, in received order.
    fn parameters(&self, name: &str) -> Vec<String>;
    fn parameter_names(&self) -> Vec<String>;
    fn body(&self) -> Option<&str>;
}

/// Server-side session attributes.
pub trait Session: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn remove(&self, key: &str) -> Option<Value>;
    fn keys(&self) -> Vec<String>;
}

/// In-memory request, used by tests and the CLI.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestRequest {
    path: String,
    params: Vec<(String, String)>,
    body: Option<String>,
}

impl TestRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Splits a URI such as `/index.delete/42?t:ac=x` into path and decoded query parameters.
    pub fn from_uri(uri: &str) -> Self {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        let mut req = Self::new(path);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            req.params.push((percent_decode(k), percent_decode(v)));
        }
        req
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl Request for TestRequest {
    fn path(&self) -> &str {
        &self.path
    }

    fn parameter(&self, name: &str) -> Option<String> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn parameters(&self, name: &str) -> Vec<String> {
        self.params
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn parameter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (k, _) in &self.params {
            if !names.contains(k) {
                names.push(k.clone());
            }
        }
        names
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct MemorySession {
    attributes: Mutex<IndexMap<String, Value>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.attributes).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Session for MemorySession {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.attributes).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        lock(&self.attributes).insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        lock(&self.attributes).shift_remove(key)
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.attributes).keys().cloned().collect()
    }
}

pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b':') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/request.rs"]
mod tests;
