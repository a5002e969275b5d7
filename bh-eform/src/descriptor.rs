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

use bh_xml_utils::{CanonicalizationMethod, DestinationType, DigestAlgorithm};

/// Namespace of the XML Data Container, version 1.1.
pub const XDC_NAMESPACE: &str = "http://data.gov.sk/def/container/xmldatacontainer+xml/1.1";

/// File extension of XML Data Containers, without the leading dot.
pub const XDC_EXTENSION: &str = "xdcf";

/// Version used when none can be derived from the form identifier.
pub const DEFAULT_VERSION: &str = "1.0";

/// Default `ContentType` of a presentation transformation.
pub const XSLT_MEDIA_TYPE: &str = "application/xslt+xml";

/// Parameters of the presentation transformation, written into the
/// `UsedPresentationSchemaReference` or `UsedPresentationSchemaEmbedded` element.
///
/// When passed to a resolver, the set fields act as selection criteria.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct XsltParams {
    /// Reference URI of the transformation.
    pub identifier: Option<String>,
    /// Language of the transformation output, e.g. `sk`.
    pub language: Option<String>,
    /// Output format of the transformation.
    pub destination_type: Option<DestinationType>,
    /// Target environment of the transformation.
    pub target: Option<String>,
    /// MIME type of the transformation itself.
    pub media_type: Option<String>,
}

/// Identifies the governing schema and transformation pair of an electronic form.
///
/// Produced by a [`ResourceResolver`][crate::ResourceResolver], or assembled by hand when the
/// resources are known up front.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDescriptor {
    /// Form identifier, e.g. `http://data.gov.sk/doc/eform/App.GeneralAgenda/1.9`.
    pub identifier: String,
    /// XSD schema text.
    pub xsd_schema: Option<String>,
    /// XSLT transformation text.
    pub xslt: Option<String>,
    /// Canonicalization method of the container digests.
    pub canonicalization_method: CanonicalizationMethod,
    /// Digest algorithm of the container digests.
    pub digest_algorithm: DigestAlgorithm,
    /// Whether the schema and transformation are embedded instead of referenced.
    pub embed_schemas: bool,
    /// Namespace of the container elements.  Without it the container elements are written
    /// unqualified.
    pub container_namespace: Option<String>,
    /// Reference URI of the XSD schema.
    pub xsd_identifier: Option<String>,
    /// Parameters of the transformation.
    pub xslt_params: XsltParams,
}

impl FormDescriptor {
    /// Creates a descriptor for `identifier` with the default algorithms, in reference mode and
    /// with the [`XDC_NAMESPACE`].
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();

        Self {
            identifier,
            xsd_schema: None,
            xslt: None,
            canonicalization_method: CanonicalizationMethod::default(),
            digest_algorithm: DigestAlgorithm::default(),
            embed_schemas: false,
            container_namespace: Some(XDC_NAMESPACE.to_owned()),
            xsd_identifier: None,
            xslt_params: XsltParams::default(),
        }
    }

    /// Sets the XSD schema.
    pub fn with_schema(mut self, xsd_schema: impl Into<String>) -> Self {
        self.xsd_schema = Some(xsd_schema.into());
        self
    }

    /// Sets the XSLT transformation.
    pub fn with_transformation(mut self, xslt: impl Into<String>) -> Self {
        self.xslt = Some(xslt.into());
        self
    }

    /// Sets the transformation parameters.
    pub fn with_xslt_params(mut self, xslt_params: XsltParams) -> Self {
        self.xslt_params = xslt_params;
        self
    }

    /// Sets the canonicalization method and digest algorithm.
    pub fn with_algorithms(
        mut self,
        canonicalization_method: CanonicalizationMethod,
        digest_algorithm: DigestAlgorithm,
    ) -> Self {
        self.canonicalization_method = canonicalization_method;
        self.digest_algorithm = digest_algorithm;
        self
    }

    /// Switches between embedding and referencing the schemas.
    pub fn with_embedded_schemas(mut self, embed_schemas: bool) -> Self {
        self.embed_schemas = embed_schemas;
        self
    }

    /// Sets the container namespace.
    pub fn with_container_namespace(mut self, container_namespace: Option<String>) -> Self {
        self.container_namespace = container_namespace;
        self
    }

    /// Form version, derived from the [`identifier`][Self::identifier]; see
    /// [`version_from_identifier`].
    pub fn version(&self) -> &str {
        version_from_identifier(&self.identifier)
    }

    /// The identifier with the trailing version segment removed, if the identifier ends with
    /// one.
    pub(crate) fn base_identifier(&self) -> &str {
        match self.identifier.rsplit_once('/') {
            Some((base, last)) if is_version(last) => base,
            _ => &self.identifier,
        }
    }

    /// Conventional reference URI of a schema file, e.g. `<base>/<version>/form.xsd`.
    pub(crate) fn conventional_uri(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.base_identifier(), self.version(), file_name)
    }
}

/// Returns the trailing path segment of `identifier` if it looks like a version (`[v0-9.]+`),
/// otherwise [`DEFAULT_VERSION`].
pub fn version_from_identifier(identifier: &str) -> &str {
    match identifier.rsplit_once('/') {
        Some((_, last)) if is_version(last) => last,
        _ => DEFAULT_VERSION,
    }
}

fn is_version(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c == 'v' || c == '.' || c.is_ascii_digit())
}
