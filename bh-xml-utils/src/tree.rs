// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Owned XML tree.
//!
//! Element and attribute names are kept as written (qualified, e.g. `xdc:XMLData`), and namespace
//! declarations are kept as ordinary `xmlns`/`xmlns:*` attributes.  Attribute and child order is
//! preserved, which keeps serialization deterministic.

/// A node of the XML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element node.
    Element(Element),
    /// Unescaped character data.
    Text(String),
    /// `CDATA` section content.
    CData(String),
    /// Comment content.
    Comment(String),
    /// Processing instruction content, i.e. everything between `<?` and `?>`.
    ProcessingInstruction(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an empty element with the qualified `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets the attribute and returns the element, for chaining.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Appends the child and returns the element, for chaining.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.push(child);
        self
    }

    /// Appends a text child and returns the element, for chaining.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push(Node::Text(text.into()));
        self
    }

    /// Sets the attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Appends the child.
    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Qualified name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the element without the namespace prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Namespace prefix of the element, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Value of the attribute with the exact qualified `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first attribute whose local name is `local_name`, regardless of its prefix.
    ///
    /// Namespace declarations are never matched.
    pub fn attribute_local(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .filter(|(key, _)| !is_namespace_declaration(key))
            .find(|(key, _)| local_part(key) == local_name)
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in document order, including namespace declarations.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Namespace declarations made on this element, as `(prefix, uri)` pairs.  The default
    /// namespace has the empty prefix.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|(key, value)| {
            if key == "xmlns" {
                Some(("", value.as_str()))
            } else {
                key.strip_prefix("xmlns:")
                    .map(|prefix| (prefix, value.as_str()))
            }
        })
    }

    /// All child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements only, skipping text, comments and processing instructions.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Concatenated text and `CDATA` content of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) | Node::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// First element in document order (this element included) whose local name is
    /// `local_name`.
    pub fn find(&self, local_name: &str) -> Option<&Element> {
        if self.local_name() == local_name {
            return Some(self);
        }
        self.child_elements()
            .find_map(|child| child.find(local_name))
    }

    /// All elements in document order (this element included) whose local name is `local_name`.
    pub fn find_all(&self, local_name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_by_local_name(self, local_name, &mut found);
        found
    }

    /// All elements in document order (this element included) with the expanded name
    /// `{namespace}local_name`, resolving prefixes through the in-scope namespace declarations.
    pub fn find_all_ns(&self, namespace: &str, local_name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        let mut scope = Vec::new();
        collect_by_expanded_name(self, namespace, local_name, &mut scope, &mut found);
        found
    }
}

fn local_part(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

fn collect_by_local_name<'a>(element: &'a Element, local_name: &str, found: &mut Vec<&'a Element>) {
    if element.local_name() == local_name {
        found.push(element);
    }
    for child in element.child_elements() {
        collect_by_local_name(child, local_name, found);
    }
}

fn collect_by_expanded_name<'a>(
    element: &'a Element,
    namespace: &str,
    local_name: &str,
    scope: &mut Vec<(&'a str, &'a str)>,
    found: &mut Vec<&'a Element>,
) {
    let mark = scope.len();
    scope.extend(element.namespace_declarations());

    let prefix = element.prefix().unwrap_or("");
    let resolved = scope
        .iter()
        .rev()
        .find(|(declared, _)| *declared == prefix)
        .map(|(_, uri)| *uri);

    if element.local_name() == local_name && resolved == Some(namespace) {
        found.push(element);
    }
    for child in element.child_elements() {
        collect_by_expanded_name(child, namespace, local_name, scope, found);
    }

    scope.truncate(mark);
}
