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

use bherror::{traits::ForeignError as _, Error};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{Element, Node, Result, XmlError};

const BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Strips a leading UTF-8 byte order mark, if present.
pub fn strip_bom(input: &[u8]) -> &[u8] {
    input.strip_prefix(BOM).unwrap_or(input)
}

/// Parses UTF-8 encoded XML `content` into its root [`Element`].
///
/// A leading byte order mark is ignored.  The XML declaration, the document type declaration and
/// anything outside of the root element other than whitespace, comments and processing
/// instructions are rejected or dropped.
pub fn parse_document(content: &[u8]) -> Result<Element> {
    let content = std::str::from_utf8(strip_bom(content)).foreign_err(|| XmlError::Parse)?;
    parse_str(content)
}

/// Parses the XML `content` into its root [`Element`].
pub fn parse_str(content: &str) -> Result<Element> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = Reader::from_str(content);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().foreign_err(|| XmlError::Parse)?;

        match event {
            Event::Start(start) => {
                ensure_single_root(&root)?;
                stack.push(element_from(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&root)?;
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::root(XmlError::Parse).ctx("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                let text = text.unescape().foreign_err(|| XmlError::Parse)?;
                match stack.last_mut() {
                    Some(parent) => parent.push(Node::Text(text.into_owned())),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(Error::root(XmlError::Parse).ctx("text outside of root element"))
                    }
                }
            }
            Event::CData(data) => {
                let data = utf8(data.into_inner().into_owned())?;
                match stack.last_mut() {
                    Some(parent) => parent.push(Node::CData(data)),
                    None => {
                        return Err(Error::root(XmlError::Parse).ctx("CDATA outside of root element"))
                    }
                }
            }
            Event::Comment(comment) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push(Node::Comment(utf8(comment.into_inner().into_owned())?));
                }
            }
            Event::PI(instruction) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push(Node::ProcessingInstruction(utf8(instruction.to_vec())?));
                }
            }
            Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(Error::root(XmlError::Parse).ctx("unclosed element"));
    }

    root.ok_or_else(|| Error::root(XmlError::Parse).ctx("missing root element"))
}

fn ensure_single_root(root: &Option<Element>) -> Result<()> {
    match root {
        Some(_) => Err(Error::root(XmlError::Parse).ctx("multiple root elements")),
        None => Ok(()),
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element> {
    let name = utf8(start.name().as_ref().to_vec())?;
    let mut element = Element::new(name);

    for attribute in start.attributes() {
        let attribute = attribute.foreign_err(|| XmlError::Parse)?;
        let key = utf8(attribute.key.as_ref().to_vec())?;
        let value = attribute
            .unescape_value()
            .foreign_err(|| XmlError::Parse)?;
        element.set_attribute(key, value.into_owned());
    }

    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None => *root = Some(element),
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).foreign_err(|| XmlError::Parse)
}
