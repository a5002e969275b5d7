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

use std::borrow::Cow;

/// MIME type of a signed or to-be-signed document.
///
/// Parameters (e.g. `; charset=UTF-8`) are dropped and the type is lowercased, so two values
/// compare equal whenever they denote the same media type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType(Cow<'static, str>);

/// Known types and their canonical file extensions.  The first extension of a type is the one
/// returned by [`MimeType::extension`].
const EXTENSIONS: &[(&str, &str)] = &[
    ("application/xml", "xml"),
    ("text/xml", "xml"),
    ("application/vnd.gov.sk.xmldatacontainer+xml", "xdcf"),
    ("application/vnd.etsi.asic-e+zip", "asice"),
    ("application/vnd.etsi.asic-e+zip", "sce"),
    ("application/vnd.etsi.asic-s+zip", "asics"),
    ("application/vnd.etsi.asic-s+zip", "scs"),
    ("application/pdf", "pdf"),
    ("text/plain", "txt"),
    ("text/html", "html"),
    ("text/html", "htm"),
    ("text/csv", "csv"),
    ("application/json", "json"),
    ("application/xslt+xml", "xslt"),
    ("application/xslt+xml", "xsl"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/jpeg", "jpeg"),
    ("image/tiff", "tiff"),
    ("image/tiff", "tif"),
    ("application/pkcs7-signature", "p7s"),
    ("application/octet-stream", "bin"),
];

impl MimeType {
    /// `application/xml`.
    pub const XML: MimeType = MimeType(Cow::Borrowed("application/xml"));
    /// `text/xml`.
    pub const TEXT_XML: MimeType = MimeType(Cow::Borrowed("text/xml"));
    /// `application/vnd.gov.sk.xmldatacontainer+xml`, the XML Data Container.
    pub const XDC: MimeType = MimeType(Cow::Borrowed("application/vnd.gov.sk.xmldatacontainer+xml"));
    /// `application/vnd.etsi.asic-e+zip`.
    pub const ASICE: MimeType = MimeType(Cow::Borrowed("application/vnd.etsi.asic-e+zip"));
    /// `application/vnd.etsi.asic-s+zip`.
    pub const ASICS: MimeType = MimeType(Cow::Borrowed("application/vnd.etsi.asic-s+zip"));
    /// `application/pdf`.
    pub const PDF: MimeType = MimeType(Cow::Borrowed("application/pdf"));
    /// `text/plain`.
    pub const TEXT: MimeType = MimeType(Cow::Borrowed("text/plain"));
    /// `application/octet-stream`, the fallback for unknown content.
    pub const OCTET_STREAM: MimeType = MimeType(Cow::Borrowed("application/octet-stream"));

    /// Parses a MIME type string, dropping its parameters.
    ///
    /// Returns [`None`] if the value is not of the `type/subtype` form.
    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        let (kind, subtype) = essence.split_once('/')?;

        if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
            return None;
        }

        Some(Self(Cow::Owned(essence.to_ascii_lowercase())))
    }

    /// Infers the MIME type from a file extension, without the leading dot.
    ///
    /// Unknown extensions map to [`MimeType::OCTET_STREAM`].
    pub fn from_extension(extension: &str) -> Self {
        let extension = extension.to_ascii_lowercase();

        EXTENSIONS
            .iter()
            .find(|(_, known)| *known == extension)
            .map(|(mime_type, _)| Self(Cow::Borrowed(mime_type)))
            .unwrap_or(Self::OCTET_STREAM)
    }

    /// Infers the MIME type from the extension of a file name or path.
    pub fn from_filename(filename: &str) -> Self {
        let name = filename.rsplit('/').next().unwrap_or(filename);

        match name.rsplit_once('.') {
            Some((_, extension)) => Self::from_extension(extension),
            None => Self::OCTET_STREAM,
        }
    }

    /// Canonical file extension of the type, if it is known.
    pub fn extension(&self) -> Option<&'static str> {
        EXTENSIONS
            .iter()
            .find(|(mime_type, _)| *mime_type == self.as_str())
            .map(|(_, extension)| *extension)
    }

    /// Whether this is a plain XML type, i.e. `application/xml` or `text/xml`.
    pub fn is_xml(&self) -> bool {
        *self == Self::XML || *self == Self::TEXT_XML
    }

    /// Whether this is the XML Data Container type.
    pub fn is_xdc(&self) -> bool {
        *self == Self::XDC
    }

    /// Whether this is an ASiC container type.
    pub fn is_asic(&self) -> bool {
        *self == Self::ASICE || *self == Self::ASICS
    }

    /// Whether the type says too little about the content and a more specific declaration should
    /// be preferred, i.e. plain XML or `application/octet-stream`.
    pub fn is_generic(&self) -> bool {
        self.is_xml() || *self == Self::OCTET_STREAM
    }

    /// The MIME type string, without parameters.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_parameters_and_case() {
        let mime_type = MimeType::parse("Application/XML; charset=UTF-8").unwrap();

        assert_eq!(mime_type, MimeType::XML);
        assert!(mime_type.is_xml());
        assert_eq!(mime_type.to_string(), "application/xml");
    }

    #[test]
    fn parse_rejects_malformed_values() {
        for value in ["", "xml", "/xml", "text/", "a/b/c"] {
            assert_eq!(MimeType::parse(value), None, "{value:?}");
        }
    }

    #[test]
    fn inferred_from_filename() {
        assert_eq!(MimeType::from_filename("dir/form.XML"), MimeType::XML);
        assert_eq!(MimeType::from_filename("form.xdcf"), MimeType::XDC);
        assert_eq!(MimeType::from_filename("contract.pdf"), MimeType::PDF);
        assert_eq!(MimeType::from_filename("archive.sce"), MimeType::ASICE);
        assert_eq!(MimeType::from_filename("README"), MimeType::OCTET_STREAM);
        assert_eq!(MimeType::from_filename("dir.d/README"), MimeType::OCTET_STREAM);
        assert_eq!(MimeType::from_filename("data.unknown"), MimeType::OCTET_STREAM);
    }

    #[test]
    fn extension_is_the_canonical_one() {
        assert_eq!(MimeType::XDC.extension(), Some("xdcf"));
        assert_eq!(MimeType::ASICE.extension(), Some("asice"));
        assert_eq!(MimeType::parse("x-custom/type").unwrap().extension(), None);
    }

    #[test]
    fn generic_types() {
        assert!(MimeType::XML.is_generic());
        assert!(MimeType::TEXT_XML.is_generic());
        assert!(MimeType::OCTET_STREAM.is_generic());
        assert!(!MimeType::XDC.is_generic());
        assert!(!MimeType::PDF.is_generic());
    }
}
