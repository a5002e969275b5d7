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

//! Validation of form documents and XML Data Containers.

use bh_xml_utils::{
    compute_digest, parse_document, strip_bom, to_xml_string, validate_against_xsd, Element,
    MimeType,
};
use bherror::{traits::PropagateError as _, Error};

use crate::{
    container::{unwrap_payload, USED_SCHEMAS_REFERENCED, XSD_REFERENCE, XSLT_REFERENCE},
    error::{Result, ValidationError},
    FormDescriptor,
};

/// Schema of the XML Data Container, version 1.1.
pub const XDC_SCHEMA: &str = include_str!("../resources/xmldatacontainer.xsd");

/// Validates inbound documents against the container schema and a form descriptor.
#[derive(Debug, Clone)]
pub struct XdcValidator {
    container_schema: String,
}

impl Default for XdcValidator {
    fn default() -> Self {
        Self::new(XDC_SCHEMA)
    }
}

impl XdcValidator {
    /// Creates a validator checking containers against `container_schema`.
    pub fn new(container_schema: impl Into<String>) -> Self {
        Self {
            container_schema: container_schema.into(),
        }
    }

    /// Returns `true` if `content` is a document conforming to the container schema.
    pub fn is_container_content(&self, content: &[u8]) -> bool {
        std::str::from_utf8(strip_bom(content))
            .ok()
            .is_some_and(|xml| validate_against_xsd(xml, &self.container_schema).is_ok())
    }

    /// Validates the inbound document `content` of type `mime_type`.
    ///
    /// A document of the [`MimeType::XDC`] type must conform to the container schema and, unless
    /// the `descriptor` embeds its schemas, carry the digests of the descriptor's schema and
    /// transformation.  The form document, unwrapped from the container if needed, must conform
    /// to the descriptor's schema, if there is one.
    ///
    /// # Errors
    ///
    /// Fails with the [`ValidationError`] describing the first failed check.
    pub fn validate(
        &self,
        descriptor: &FormDescriptor,
        content: &[u8],
        mime_type: &MimeType,
    ) -> Result<(), ValidationError> {
        if content.is_empty() {
            return Err(Error::root(ValidationError::FailedToLoadXml).ctx("empty document"));
        }
        let document = parse_document(content).with_err(|| ValidationError::FailedToLoadXml)?;

        let form = if mime_type.is_xdc() {
            self.validate_container(descriptor, content, &document)?;
            unwrap_payload(&document)
                .ok_or_else(|| Error::root(ValidationError::FailedToLoadXmlData))?
        } else {
            document
        };

        if let Some(xsd) = &descriptor.xsd_schema {
            let form = to_xml_string(&form).with_err(|| ValidationError::FailedToLoadXmlData)?;
            validate_against_xsd(&form, xsd).with_err(|| ValidationError::XsdViolation)?;
        }

        tracing::debug!(%mime_type, "document is valid");
        Ok(())
    }

    fn validate_container(
        &self,
        descriptor: &FormDescriptor,
        content: &[u8],
        document: &Element,
    ) -> Result<(), ValidationError> {
        let xml = std::str::from_utf8(strip_bom(content))
            .map_err(|_| Error::root(ValidationError::FailedToLoadXml))?;
        validate_against_xsd(xml, &self.container_schema)
            .with_err(|| ValidationError::DataContainerXsdViolation)?;

        if descriptor.embed_schemas {
            return Ok(());
        }

        if let Some(xsd) = &descriptor.xsd_schema {
            verify_digest(
                descriptor,
                document,
                XSD_REFERENCE,
                xsd,
                ValidationError::XsdDigestMismatch,
            )?;
        }
        if let Some(xslt) = &descriptor.xslt {
            verify_digest(
                descriptor,
                document,
                XSLT_REFERENCE,
                xslt,
                ValidationError::XsltDigestMismatch,
            )?;
        }

        Ok(())
    }
}

fn verify_digest(
    descriptor: &FormDescriptor,
    document: &Element,
    reference: &str,
    content: &str,
    mismatch: ValidationError,
) -> Result<(), ValidationError> {
    let recorded = document
        .child_elements()
        .filter(|element| element.local_name() == USED_SCHEMAS_REFERENCED)
        .flat_map(Element::child_elements)
        .find(|element| element.local_name() == reference)
        .and_then(|element| element.attribute("DigestValue"))
        .ok_or_else(|| Error::root(ValidationError::DigestNotFound(reference.to_owned())))?;

    let computed = compute_digest(
        content.as_bytes(),
        descriptor.canonicalization_method,
        descriptor.digest_algorithm,
    )
    .with_err(|| ValidationError::DigestComputation(reference.to_owned()))?;

    if computed != recorded {
        return Err(Error::root(mismatch).ctx(format!("recorded {recorded}, computed {computed}")));
    }

    Ok(())
}
