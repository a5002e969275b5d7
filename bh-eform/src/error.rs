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

//! This module defines the error values returned by the crate API.
//!
//! Every error kind carries a two-part human message: a short [title][ResolveError::title] and
//! the detailed [`Display`][std::fmt::Display] text.

/// Kind of a remote form resource.
#[derive(strum_macros::Display, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ResourceKind {
    /// The manifest listing the form's transformations.
    #[strum(to_string = "manifest")]
    Manifest,
    /// The XSD schema of the form.
    #[strum(to_string = "XSD schema")]
    Schema,
    /// The XSLT presentation transformation of the form.
    #[strum(to_string = "XSLT transformation")]
    Transformation,
    /// The complete form definition, e.g. the `sign-data.json` document.
    #[strum(to_string = "form definition")]
    FormDefinition,
}

/// Error type for resolving the schema and transformation of a form.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum ResolveError {
    /// Error when a resource could not be found, or no usable transformation was listed.
    #[strum(to_string = "Unable to find the {0} of the electronic form")]
    ResourceNotFound(ResourceKind),
    /// Error when the resolved XSD schema does not match the expected digest.
    #[strum(to_string = "Resolved XSD schema does not match the digest in the XML Data Container")]
    XsdDigestMismatch,
    /// Error when the resolved XSLT transformation does not match the expected digest.
    #[strum(
        to_string = "Resolved XSLT transformation does not match the digest in the XML Data Container"
    )]
    XsltDigestMismatch,
    /// Error when the transport failed.
    #[strum(to_string = "Failed to fetch {0}")]
    Fetch(String),
    /// Error when a resource URL cannot be constructed.
    #[strum(to_string = "Invalid resource URL: {0}")]
    InvalidUrl(String),
    /// Error when a fetched form definition or manifest cannot be read.
    #[strum(to_string = "Invalid form definition: {0}")]
    InvalidFormDefinition(String),
    /// Error when the digest of a fetched resource cannot be computed.
    #[strum(to_string = "Unable to compute the digest of the {0}")]
    Digest(ResourceKind),
}

impl ResolveError {
    /// Short title of the error.
    pub fn title(&self) -> &'static str {
        match self {
            Self::XsdDigestMismatch | Self::XsltDigestMismatch => {
                "XML Data Container validation failed"
            }
            _ => "Electronic form preparation failed",
        }
    }
}

impl bherror::BhError for ResolveError {}

/// Error type for wrapping documents into XML Data Containers.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum BuildError {
    /// Error when the form identifier has no `/` separator.
    #[strum(to_string = "Form identifier contains no slash: {0}")]
    MalformedIdentifier(String),
    /// Error when the document cannot be transformed, e.g. the schema is not well-formed.
    #[strum(to_string = "Error while transforming the document")]
    Transformation,
}

impl BuildError {
    /// Short title of the error.
    pub fn title(&self) -> &'static str {
        "Document transformation failed"
    }
}

impl bherror::BhError for BuildError {}

/// Error type for validating XML documents and XML Data Containers.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum ValidationError {
    /// Error when the document is empty or not well-formed XML.
    #[strum(to_string = "Unable to load the XML document")]
    FailedToLoadXml,
    /// Error when the `XMLData` element of a container is missing or holds no element.
    #[strum(to_string = "Unable to load the XMLData content of the container")]
    FailedToLoadXmlData,
    /// Error when the document does not conform to the XML Data Container schema.
    #[strum(to_string = "Document does not conform to the XML Data Container schema")]
    DataContainerXsdViolation,
    /// Error when the form content does not conform to the form's XSD schema.
    #[strum(to_string = "Form content does not conform to the XSD schema")]
    XsdViolation,
    /// Error when the supplied XSD schema does not match the digest in the container.
    #[strum(to_string = "XSD schema does not match the digest in the container")]
    XsdDigestMismatch,
    /// Error when the supplied XSLT transformation does not match the digest in the container.
    #[strum(to_string = "XSLT transformation does not match the digest in the container")]
    XsltDigestMismatch,
    /// Error when the container has no `DigestValue` for the named reference element.
    #[strum(to_string = "DigestValue of {0} not found")]
    DigestNotFound(String),
    /// Error when the digest of the supplied schema or transformation cannot be computed.
    #[strum(to_string = "Unable to compute the digest of the supplied {0}")]
    DigestComputation(String),
}

impl ValidationError {
    /// Short title of the error.
    pub fn title(&self) -> &'static str {
        "XML Data Container validation failed"
    }
}

impl bherror::BhError for ValidationError {}

/// Result type used across the crate.
pub type Result<T, E> = bherror::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_have_title_and_detail() {
        let error = ResolveError::ResourceNotFound(ResourceKind::Manifest);

        assert_eq!(error.title(), "Electronic form preparation failed");
        assert_eq!(
            error.to_string(),
            "Unable to find the manifest of the electronic form"
        );
        assert_eq!(
            ResolveError::XsltDigestMismatch.title(),
            ValidationError::XsltDigestMismatch.title()
        );
    }
}
