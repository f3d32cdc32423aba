use crate::foundation::error::{TapestryError, TapestryResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Markup sink used by render-phase methods.
///
/// Elements stay addressable after they are opened, so a component can add attributes to its
/// own element once its body has rendered (a form learning its encoding type, for instance).
pub trait MarkupWriter: Send {
    fn element(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId;
    /// Adds or replaces attributes on an already written element.
    fn attributes(&mut self, node: NodeId, attributes: &[(&str, &str)]);
    fn end(&mut self) -> TapestryResult<()>;
    fn write(&mut self, text: &str);
    fn write_raw(&mut self, markup: &str);
    fn current(&self) -> Option<NodeId>;
    fn to_markup(&self) -> String;
}

#[derive(Debug)]
enum Node {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<usize>,
    },
    Text(String),
    Raw(String),
}

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Minimal in-memory DOM.
#[derive(Debug, Default)]
pub struct DomMarkupWriter {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    open: Vec<usize>,
}

impl DomMarkupWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn attach(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(node);
        match self.open.last().copied() {
            Some(parent) => {
                if let Node::Element { children, .. } = &mut self.nodes[parent] {
                    children.push(idx);
                }
            }
            None => self.roots.push(idx),
        }
        idx
    }

    fn serialize(&self, idx: usize, out: &mut String) {
        match &self.nodes[idx] {
            Node::Text(t) => escape_into(t, false, out),
            Node::Raw(r) => out.push_str(r),
            Node::Element {
                name,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(name);
                for (k, v) in attributes {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    escape_into(v, true, out);
                    out.push('"');
                }
                if children.is_empty() && VOID_ELEMENTS.contains(&name.as_str()) {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &c in children {
                    self.serialize(c, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

impl MarkupWriter for DomMarkupWriter {
    fn element(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        let idx = self.attach(Node::Element {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        });
        self.open.push(idx);
        self.attributes(NodeId(idx), attributes);
        NodeId(idx)
    }

    fn attributes(&mut self, node: NodeId, new_attributes: &[(&str, &str)]) {
        if let Some(Node::Element { attributes, .. }) = self.nodes.get_mut(node.0) {
            for (k, v) in new_attributes {
                match attributes.iter_mut().find(|(name, _)| name == k) {
                    Some(existing) => existing.1 = v.to_string(),
                    None => attributes.push((k.to_string(), v.to_string())),
                }
            }
        }
    }

    fn end(&mut self) -> TapestryResult<()> {
        self.open
            .pop()
            .map(|_| ())
            .ok_or_else(|| TapestryError::render("markup", "end() without an open element"))
    }

    fn write(&mut self, text: &str) {
        if !text.is_empty() {
            self.attach(Node::Text(text.to_string()));
        }
    }

    fn write_raw(&mut self, markup: &str) {
        self.attach(Node::Raw(markup.to_string()));
    }

    fn current(&self) -> Option<NodeId> {
        self.open.last().copied().map(NodeId)
    }

    fn to_markup(&self) -> String {
        let mut out = String::new();
        for &r in &self.roots {
            self.serialize(r, &mut out);
        }
        out
    }
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/markup.rs"]
mod tests;
