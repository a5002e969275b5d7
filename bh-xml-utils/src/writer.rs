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

use bherror::traits::ForeignError as _;
use quick_xml::{
    escape::partial_escape,
    events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event},
    Writer,
};

use crate::{Element, Node, Result, XmlError};

/// Serializes the `root` element into a complete UTF-8 XML document, starting with the
/// `<?xml version="1.0" encoding="UTF-8"?>` declaration on its own line.
pub fn to_xml_document(root: &Element) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .foreign_err(|| XmlError::Serialize)?;
    writer
        .write_event(Event::Text(BytesText::from_escaped("\n")))
        .foreign_err(|| XmlError::Serialize)?;
    write_element(&mut writer, root)?;
    into_string(writer)
}

/// Serializes the `element` without the XML declaration.
pub fn to_xml_string(element: &Element) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, element)?;
    into_string(writer)
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner()).foreign_err(|| XmlError::Serialize)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name());
    for attribute in element.attributes() {
        start.push_attribute(attribute);
    }

    if element.children().is_empty() {
        return write(writer, Event::Empty(start));
    }

    write(writer, Event::Start(start))?;
    for child in element.children() {
        match child {
            Node::Element(child) => write_element(writer, child)?,
            Node::Text(text) => {
                write(writer, Event::Text(BytesText::from_escaped(partial_escape(text))))?
            }
            Node::CData(data) => {
                for section in BytesCData::escaped(data) {
                    write(writer, Event::CData(section))?;
                }
            }
            Node::Comment(comment) => {
                write(writer, Event::Comment(BytesText::from_escaped(comment.as_str())))?
            }
            Node::ProcessingInstruction(instruction) => {
                write(writer, Event::PI(BytesPI::new(instruction.as_str())))?
            }
        }
    }
    write(writer, Event::End(BytesEnd::new(element.name())))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).foreign_err(|| XmlError::Serialize)
}
