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

use bherror::Error;
use libxml::{
    parser::Parser,
    schemas::{SchemaParserContext, SchemaValidationContext},
};

use crate::{Result, XmlError};

/// Validates the XML document `xml` against the XSD schema `xsd`.
///
/// # Errors
///
/// * [`XmlError::SchemaLoad`] if `xsd` is not a loadable XSD schema,
/// * [`XmlError::Parse`] if `xml` is not well-formed,
/// * [`XmlError::SchemaViolation`] with the number of reported violations otherwise.
pub fn validate_against_xsd(xml: &str, xsd: &str) -> Result<()> {
    let xsd = xsd.strip_prefix('\u{feff}').unwrap_or(xsd);
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);

    let mut schema_parser = SchemaParserContext::from_buffer(xsd);
    let mut schema = SchemaValidationContext::from_parser(&mut schema_parser).map_err(|errors| {
        Error::root(XmlError::SchemaLoad).ctx(format!("{} schema error(s)", errors.len()))
    })?;

    let document = Parser::default()
        .parse_string(xml)
        .map_err(|_| Error::root(XmlError::Parse))?;

    schema
        .validate_document(&document)
        .map_err(|errors| Error::root(XmlError::SchemaViolation(errors.len())))?;

    tracing::debug!("document conforms to the XSD schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:form" xmlns="urn:form" elementFormDefault="qualified">
  <xs:element name="form">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="subject" type="xs:string"/>
        <xs:element name="amount" type="xs:integer" minOccurs="0"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    #[test]
    fn conforming_document_is_accepted() {
        let xml = r#"<form xmlns="urn:form"><subject>Hello</subject><amount>3</amount></form>"#;

        assert_matches!(validate_against_xsd(xml, XSD), Ok(()));
    }

    #[test]
    fn violating_document_is_rejected() {
        let xml = r#"<form xmlns="urn:form"><amount>three</amount></form>"#;

        assert_matches!(
            validate_against_xsd(xml, XSD).unwrap_err().error,
            XmlError::SchemaViolation(count) if count > 0
        );
    }

    #[test]
    fn document_in_other_namespace_is_rejected() {
        let xml = r#"<form xmlns="urn:other"><subject>Hello</subject></form>"#;

        assert_matches!(
            validate_against_xsd(xml, XSD).unwrap_err().error,
            XmlError::SchemaViolation(_)
        );
    }

    #[test]
    fn invalid_schema_fails_to_load() {
        let xml = r#"<form xmlns="urn:form"><subject>Hello</subject></form>"#;

        assert_matches!(
            validate_against_xsd(xml, "<not-a-schema/>").unwrap_err().error,
            XmlError::SchemaLoad
        );
    }
}
