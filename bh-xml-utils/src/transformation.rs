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

use std::str::FromStr;

use bherror::{traits::PropagateError as _, Error};

use crate::{parse_str, Result, XmlError};

/// Namespace of XSLT elements.
pub const XSLT_NAMESPACE: &str = "http://www.w3.org/1999/XSL/Transform";

/// Output format produced by a presentation transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationType {
    /// Plain text, `TXT`.
    Txt,
    /// HTML, `HTML`.
    Html,
    /// XHTML, `XHTML`.
    Xhtml,
}

impl DestinationType {
    /// The value written into the `MediaDestinationTypeDescription` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Txt => "TXT",
            Self::Html => "HTML",
            Self::Xhtml => "XHTML",
        }
    }

    /// Maps the MIME type of a transformation output to the destination type, e.g. `text/html`
    /// to [`DestinationType::Html`].
    pub fn from_media_destination_type(mime_type: &str) -> Option<Self> {
        match mime_type.split(';').next().unwrap_or_default().trim() {
            "text/plain" => Some(Self::Txt),
            "text/html" => Some(Self::Html),
            "application/xhtml+xml" => Some(Self::Xhtml),
            _ => None,
        }
    }

    fn from_output_method(method: &str) -> Option<Self> {
        match method.trim() {
            "text" => Some(Self::Txt),
            "html" => Some(Self::Html),
            "xhtml" => Some(Self::Xhtml),
            _ => None,
        }
    }
}

impl FromStr for DestinationType {
    type Err = Error<XmlError>;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TXT" => Ok(Self::Txt),
            "HTML" => Ok(Self::Html),
            "XHTML" => Ok(Self::Xhtml),
            _ => Err(Error::root(XmlError::TransformationParsing(format!(
                "unknown destination type {value}"
            )))),
        }
    }
}

impl std::fmt::Display for DestinationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determines the destination type of the `xslt` transformation from the `method` attribute of
/// its first `xsl:output` element.
///
/// Returns [`None`] if the method is none of `text`, `html` or `xhtml`.
///
/// # Errors
///
/// [`XmlError::TransformationParsing`] if the transformation is not well-formed, has no
/// `xsl:output` element or the element has no `method`.
pub fn output_destination_type(xslt: &str) -> Result<Option<DestinationType>> {
    let stylesheet = parse_str(xslt)
        .with_err(|| XmlError::TransformationParsing("not well-formed".to_owned()))?;

    let outputs = stylesheet.find_all_ns(XSLT_NAMESPACE, "output");
    let output = outputs.first().ok_or_else(|| {
        Error::root(XmlError::TransformationParsing(
            "missing output element".to_owned(),
        ))
    })?;

    let method = output.attribute("method").ok_or_else(|| {
        Error::root(XmlError::TransformationParsing(
            "missing output method".to_owned(),
        ))
    })?;

    Ok(DestinationType::from_output_method(method))
}
