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

/// Error type used across the crate API.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum XmlError {
    /// Error when the content is not a well-formed, UTF-8 encoded XML document.
    #[strum(to_string = "Unable to parse XML content")]
    Parse,
    /// Error when an XML tree cannot be serialized.
    #[strum(to_string = "Unable to serialize XML content")]
    Serialize,
    /// Error when a canonicalization method or digest algorithm identifier is not supported.
    #[strum(to_string = "Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// Error when the underlying canonicalization fails.
    #[strum(to_string = "XML canonicalization failed")]
    Canonicalization,
    /// Error when the XSD schema itself cannot be loaded.
    #[strum(to_string = "Unable to load XSD schema")]
    SchemaLoad,
    /// Error when the content does not conform to the XSD schema.
    #[strum(to_string = "Content does not conform to the XSD schema ({0} error(s))")]
    SchemaViolation(usize),
    /// Error when the `xsl:output` declaration of a transformation cannot be read.
    #[strum(to_string = "Failed to parse transformation: {0}")]
    TransformationParsing(String),
}

impl XmlError {
    /// Short title of the error, suitable as a heading for the [`Display`][std::fmt::Display]
    /// detail.
    pub fn title(&self) -> &'static str {
        match self {
            XmlError::Parse => "Invalid XML",
            XmlError::Serialize => "Serialization failed",
            XmlError::UnsupportedAlgorithm(_) => "Unsupported algorithm",
            XmlError::Canonicalization => "Canonicalization failed",
            XmlError::SchemaLoad | XmlError::SchemaViolation(_) => "XSD validation failed",
            XmlError::TransformationParsing(_) => "Invalid transformation",
        }
    }
}

impl bherror::BhError for XmlError {}

/// Type alias for [`bherror::Result`] types returned by the crate's API.
pub type Result<T> = bherror::Result<T, XmlError>;
