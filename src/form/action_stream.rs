use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::Value;

/// A method invocation recorded during render and replayed, against the same component, when
/// the form is submitted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComponentAction {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ComponentAction {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActionEntry {
    /// Complete id of the component the action targets.
    pub component_id: String,
    pub action: ComponentAction,
}

/// Serializes entries as frames of `u32` big-endian length + UTF-8 component id followed by
/// `u32` length + JSON action.
#[derive(Debug, Default)]
pub struct ActionWriter {
    buf: Vec<u8>,
}

impl ActionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, entry: &ActionEntry) -> TapestryResult<()> {
        let action = serde_json::to_vec(&entry.action)
            .map_err(|e| TapestryError::serde(format!("encode action: {e}")))?;
        self.frame(entry.component_id.as_bytes())?;
        self.frame(&action)
    }

    fn frame(&mut self, bytes: &[u8]) -> TapestryResult<()> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| TapestryError::serde("action frame exceeds 4 GiB"))?;
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads entries back in recording order.
#[derive(Debug)]
pub struct ActionReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ActionReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn frame(&mut self) -> Option<&'a [u8]> {
        let header = self.buf.get(self.pos..self.pos + 4)?;
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let start = self.pos + 4;
        let body = self.buf.get(start..start.checked_add(len)?)?;
        self.pos = start + len;
        Some(body)
    }

    /// Next entry; `Ok(None)` at the end of the stream, including a truncated final frame.
    pub fn next_entry(&mut self) -> TapestryResult<Option<ActionEntry>> {
        let Some(id) = self.frame() else {
            return Ok(None);
        };
        let Some(action) = self.frame() else {
            return Ok(None);
        };
        let component_id = std::str::from_utf8(id)
            .map_err(|e| TapestryError::serde(format!("component id is not UTF-8: {e}")))?
            .to_string();
        let action: ComponentAction = serde_json::from_slice(action).map_err(|e| {
            TapestryError::serde(format!("decode action for {component_id}: {e}"))
        })?;
        Ok(Some(ActionEntry {
            component_id,
            action,
        }))
    }

    pub fn read_all(mut self) -> TapestryResult<Vec<ActionEntry>> {
        let mut out = Vec::new();
        while let Some(entry) = self.next_entry()? {
            out.push(entry);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/form/action_stream.rs"]
mod tests;
