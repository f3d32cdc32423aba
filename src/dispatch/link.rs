use std::sync::Mutex;

use indexmap::IndexMap;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::lock;
use crate::foundation::value::Value;
use crate::runtime::request::{percent_decode, percent_encode};

/// Query parameter carrying the page activation context of component event links.
pub const ACTIVATION_CONTEXT_PARAMETER: &str = "t:ac";
/// Query parameter that resets the page before rendering it.
pub const RESET_PARAMETER: &str = "t:reset";

pub const LINK: &str = "Link";

/// A generated URL. Event handlers of the decorate events add query parameters to it.
#[derive(Debug)]
pub struct Link {
    base: String,
    parameters: Mutex<IndexMap<String, String>>,
}

impl Link {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            parameters: Mutex::new(IndexMap::new()),
        }
    }

    /// Path without the query string.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn add_parameter(&self, name: impl Into<String>, value: impl Into<String>) {
        lock(&self.parameters).insert(name.into(), value.into());
    }

    pub fn parameter(&self, name: &str) -> Option<String> {
        lock(&self.parameters).get(name).cloned()
    }

    pub fn parameters(&self) -> Vec<(String, String)> {
        lock(&self.parameters)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn to_uri(&self) -> String {
        let params = lock(&self.parameters);
        if params.is_empty() {
            return self.base.clone();
        }
        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect();
        format!("{}?{}", self.base, query.join("&"))
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | ':')
}

/// Encodes one context value as a URL path segment.
///
/// `$B` is the empty string, `$N` is null, `$$` is a literal dollar and `$xxxx` is any other
/// character outside the safe set as four lowercase hex digits.
pub fn encode_context_value(value: &Value) -> String {
    if value.is_null() {
        return "$N".to_string();
    }
    let raw = value.to_client_string();
    if raw.is_empty() {
        return "$B".to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '$' {
            out.push_str("$$");
        } else if is_safe(c) {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("${unit:04x}"));
            }
        }
    }
    out
}

pub fn decode_context_value(segment: &str) -> TapestryResult<Value> {
    match segment {
        "$N" => return Ok(Value::Null),
        "$B" => return Ok(Value::from("")),
        _ => {}
    }
    let chars: Vec<char> = segment.chars().collect();
    let mut units: Vec<u16> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '$' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(chars[i].encode_utf16(&mut buf));
            i += 1;
            continue;
        }
        if chars.get(i + 1) == Some(&'$') {
            units.push(u16::from(b'$'));
            i += 2;
            continue;
        }
        let hex: String = chars.iter().skip(i + 1).take(4).collect();
        let unit = (hex.len() == 4)
            .then(|| u16::from_str_radix(&hex, 16).ok())
            .flatten()
            .ok_or_else(|| {
                TapestryError::coercion(format!("invalid escape in context value '{segment}'"))
            })?;
        units.push(unit);
        i += 5;
    }
    String::from_utf16(&units)
        .map(Value::Str)
        .map_err(|_| TapestryError::coercion(format!("invalid context value '{segment}'")))
}

pub fn encode_context(values: &[Value]) -> String {
    values
        .iter()
        .map(encode_context_value)
        .collect::<Vec<_>>()
        .join("/")
}

pub fn decode_context(path: &str) -> TapestryResult<Vec<Value>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| decode_context_value(&percent_decode(s)))
        .collect()
}

/// A parsed request path.
#[derive(Clone, Debug, PartialEq)]
pub enum EventRequest {
    /// `/<page>.<nested id>:<event>/<context...>`; the event defaults to `action`.
    ComponentEvent {
        page: String,
        nested_id: String,
        event_type: String,
        context: Vec<Value>,
    },
    /// `/<page>/<context...>`
    PageRender { page: String, context: Vec<Value> },
}

impl EventRequest {
    pub fn parse(path: &str) -> TapestryResult<Self> {
        let path = path.trim_start_matches('/');
        let (head, rest) = path.split_once('/').unwrap_or((path, ""));
        if head.is_empty() {
            return Err(TapestryError::config(format!("request path '/{path}' names no page")));
        }
        let context = decode_context(rest)?;
        if !head.contains(['.', ':']) {
            return Ok(Self::PageRender {
                page: head.to_string(),
                context,
            });
        }
        let (target, event_type) = match head.split_once(':') {
            Some((t, e)) => (t, e.to_string()),
            None => (head, crate::dispatch::event::ACTION.to_string()),
        };
        let (page, nested_id) = target.split_once('.').unwrap_or((target, ""));
        Ok(Self::ComponentEvent {
            page: page.to_string(),
            nested_id: nested_id.to_string(),
            event_type,
            context,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/link.rs"]
mod tests;
