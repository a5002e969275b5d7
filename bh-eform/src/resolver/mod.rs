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

//! Resolution of the schema and transformation governing an electronic form.
//!
//! A form is published under one of three profiles:
//!
//! * [`DirectResolver`] -- the schema and transformation sit at fixed URLs derived from the form
//!   identifier.
//! * [`ManifestResolver`] -- the form directory carries a manifest listing many transformations,
//!   one of which is selected by [`select_xslt`].
//! * [`FsResolver`] -- the complete form definition is published as a `sign-data.json` document.
//!
//! [`resolver_for`] routes a form identifier to its profile, and [`resolve_document`] does the
//! same for a form document or an XML Data Container.

use bh_uri_utils::UriPathExtensions as _;
use bh_xml_utils::{
    compute_digest, output_destination_type, parse_document, strip_bom, CanonicalizationMethod,
    DigestAlgorithm, MimeType,
};
use bherror::{
    traits::{ForeignError as _, PropagateError as _},
    Error,
};
use serde::Deserialize;

mod direct;
mod fs;
mod manifest;
mod selection;

pub use direct::DirectResolver;
pub use fs::{fs_form_id, FsResolver};
pub use manifest::{read_entries, ManifestEntry, ManifestResolver, MediaDestination};
pub use selection::{select_xslt, SelectionCriteria};

use crate::{
    container::ContainerInfo,
    error::{ResolveError, ResourceKind, Result},
    FormDescriptor, ResourceFetcher, XsltParams,
};

const ORSR_PREFIX: &str = "http://www.justice.gov.sk/Forms ";

const MANIFEST_PREFIXES: [&str; 3] = [
    "http://schemas.gov.sk/form/",
    "http://data.gov.sk/doc/eform/",
    "https://data.gov.sk/id/egov/eform/",
];

/// Locations of the remote form resources.
///
/// Deserializable from the embedding application's configuration; missing fields take the
/// [default][ResolverConfig::default] values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the manifest-profile form directories.
    pub manifest_source_url: String,
    /// Base URL of the `sign-data.json` form definitions.
    pub fs_source_url: String,
    /// Base of the conventional schema and transformation reference URIs.
    pub schema_identifier_base: String,
    /// Base of the form identifiers of manifest-profile forms.
    pub form_identifier_base: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            manifest_source_url: "https://data.gov.sk/doc/egov/eform/".to_owned(),
            fs_source_url: "https://autogram.slovensko.digital/public/eforms/fs/".to_owned(),
            schema_identifier_base: "http://schemas.gov.sk/form/".to_owned(),
            form_identifier_base: "http://data.gov.sk/doc/eform/".to_owned(),
        }
    }
}

/// Caller-side input of a resolution.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResolveRequest {
    /// Canonicalization method of the expected digests, and of the resulting descriptor.
    pub canonicalization_method: CanonicalizationMethod,
    /// Digest algorithm of the expected digests, and of the resulting descriptor.
    pub digest_algorithm: DigestAlgorithm,
    /// Digest the resolved XSD schema must match.
    pub expected_xsd_digest: Option<String>,
    /// Digest the resolved XSLT transformation must match.
    pub expected_xslt_digest: Option<String>,
    /// Reference URI of the XSD schema, overriding the conventional one.
    pub xsd_identifier: Option<String>,
    /// Selection criteria, and overrides of the resulting transformation parameters.
    pub xslt_params: XsltParams,
}

/// Interface providing the functionality of resolving the resources of a single form.
pub trait ResourceResolver {
    /// Fetches the schema and transformation of the form and assembles its [`FormDescriptor`].
    ///
    /// # Errors
    ///
    /// * [`ResolveError::ResourceNotFound`] if a resource is missing or no transformation
    ///   satisfies the request,
    /// * [`ResolveError::XsdDigestMismatch`] or [`ResolveError::XsltDigestMismatch`] if a
    ///   fetched resource does not match the expected digest,
    /// * [`ResolveError::Fetch`] if the transport failed.
    fn find_resources(&self, request: &ResolveRequest) -> Result<FormDescriptor, ResolveError>;
}

/// The publication profile of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormProfile {
    /// Schema at a fixed URL, transformation next to it.
    Direct {
        /// URL of the XSD schema.
        schema_url: String,
    },
    /// Manifest-described form directory.
    Manifest {
        /// Directory of the form, `<form>/<version>`.
        directory: String,
    },
    /// `sign-data.json` form definition.
    Fs {
        /// Form identifier, e.g. `793_1`.
        form_id: String,
    },
}

impl FormProfile {
    /// Routes a form identifier (or a form document's namespace) to its profile.
    ///
    /// Returns [`None`] for identifiers of no known profile.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        if let Some(schema_url) = identifier.strip_prefix(ORSR_PREFIX) {
            return Some(Self::Direct {
                schema_url: schema_url.trim().to_owned(),
            });
        }

        if !MANIFEST_PREFIXES
            .iter()
            .any(|prefix| identifier.starts_with(prefix))
        {
            return None;
        }

        let mut segments = identifier.trim_end_matches('/').rsplit('/');
        let version = segments.next().filter(|segment| !segment.is_empty())?;
        let form = segments.next().filter(|segment| !segment.is_empty())?;

        Some(Self::Manifest {
            directory: format!("{form}/{version}"),
        })
    }
}

/// Resolver of any [`FormProfile`].
pub enum FormResolver<F> {
    /// See [`DirectResolver`].
    Direct(DirectResolver<F>),
    /// See [`ManifestResolver`].
    Manifest(ManifestResolver<F>),
    /// See [`FsResolver`].
    Fs(FsResolver<F>),
}

impl<F: ResourceFetcher> FormResolver<F> {
    /// Creates the resolver of the `profile`.
    pub fn new(fetcher: F, config: &ResolverConfig, profile: FormProfile) -> Self {
        match profile {
            FormProfile::Direct { schema_url } => {
                Self::Direct(DirectResolver::new(fetcher, schema_url))
            }
            FormProfile::Manifest { directory } => {
                Self::Manifest(ManifestResolver::new(fetcher, config.clone(), directory))
            }
            FormProfile::Fs { form_id } => Self::Fs(FsResolver::new(fetcher, config, form_id)),
        }
    }
}

impl<F: ResourceFetcher> ResourceResolver for FormResolver<F> {
    fn find_resources(&self, request: &ResolveRequest) -> Result<FormDescriptor, ResolveError> {
        match self {
            Self::Direct(resolver) => resolver.find_resources(request),
            Self::Manifest(resolver) => resolver.find_resources(request),
            Self::Fs(resolver) => resolver.find_resources(request),
        }
    }
}

/// Returns the resolver of the form `identifier`, or [`None`] if no profile handles it.
pub fn resolver_for<F: ResourceFetcher>(
    fetcher: F,
    config: &ResolverConfig,
    identifier: &str,
) -> Option<FormResolver<F>> {
    FormProfile::from_identifier(identifier).map(|profile| {
        tracing::debug!(identifier, ?profile, "routed form identifier");
        FormResolver::new(fetcher, config, profile)
    })
}

/// Resolves the form a signed document belongs to.
///
/// * An XML Data Container with embedded schemas yields its embedded resources without any
///   fetching.
/// * An XML Data Container with referenced schemas is resolved through the profile of its
///   `Identifier`, checking the fetched resources against its `DigestValue`s.
/// * A plain form document is resolved through the profile of its root namespace.
///
/// A `fs_form_id` (see [`fs_form_id`]) takes precedence over the identifier.  Returns
/// [`None`] for documents that are not XML or belong to no known form.
pub fn resolve_document<F: ResourceFetcher>(
    fetcher: F,
    config: &ResolverConfig,
    content: &[u8],
    mime_type: &MimeType,
    fs_form_id: Option<&str>,
    request: ResolveRequest,
) -> Result<Option<FormDescriptor>, ResolveError> {
    if !mime_type.is_xml() && !mime_type.is_xdc() {
        return Ok(None);
    }

    let document = parse_document(content).with_err(|| {
        ResolveError::InvalidFormDefinition("document is not well-formed XML".to_owned())
    })?;

    let (identifier, request) = match ContainerInfo::read(&document) {
        Some(container) => {
            if let Some(descriptor) = container.embedded_descriptor() {
                tracing::debug!("using schemas embedded in the container");
                return Ok(Some(descriptor));
            }
            let identifier = container.identifier.clone();
            (identifier, container.into_request(request))
        }
        None => (
            document.attribute("xmlns").map(ToOwned::to_owned),
            request,
        ),
    };

    let resolver = match (fs_form_id, identifier) {
        (Some(form_id), _) => FormResolver::new(
            fetcher,
            config,
            FormProfile::Fs {
                form_id: form_id.to_owned(),
            },
        ),
        (None, Some(identifier)) => match resolver_for(fetcher, config, &identifier) {
            Some(resolver) => resolver,
            None => return Ok(None),
        },
        (None, None) => return Ok(None),
    };

    resolver.find_resources(&request).map(Some)
}

/// Fills the transformation parameters a caller typically leaves out: the destination type is
/// read from the transformation's `xsl:output` method.
pub(crate) fn fill_xslt_params(xslt: &str, mut params: XsltParams) -> XsltParams {
    if params.destination_type.is_none() {
        params.destination_type = output_destination_type(xslt).ok().flatten();
    }
    params
}

/// Appends `path` to the `base` URL.
pub(crate) fn resource_url(base: &str, path: &str) -> Result<String, ResolveError> {
    let url = reqwest::Url::parse(base).foreign_err(|| ResolveError::InvalidUrl(base.to_owned()))?;

    url.add_path_suffix(path)
        .with_err(|| ResolveError::InvalidUrl(format!("{base} + {path}")))
        .map(String::from)
}

/// Fetches a resource which must exist.
pub(crate) fn fetch_resource<F: ResourceFetcher>(
    fetcher: &F,
    url: &str,
    kind: ResourceKind,
) -> Result<Vec<u8>, ResolveError> {
    fetcher
        .fetch(url)
        .foreign_err(|| ResolveError::Fetch(url.to_owned()))?
        .ok_or_else(|| Error::root(ResolveError::ResourceNotFound(kind)).ctx(url.to_owned()))
}

/// Decodes a fetched resource, dropping a leading byte order mark.
pub(crate) fn to_text(body: Vec<u8>, kind: ResourceKind) -> Result<String, ResolveError> {
    String::from_utf8(strip_bom(&body).to_vec())
        .foreign_err(|| ResolveError::InvalidFormDefinition(format!("{kind} is not UTF-8")))
}

/// Checks the digest of a fetched resource, if one is expected.
pub(crate) fn verify_digest(
    content: &[u8],
    expected: Option<&str>,
    request: &ResolveRequest,
    kind: ResourceKind,
) -> Result<(), ResolveError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let digest = compute_digest(
        content,
        request.canonicalization_method,
        request.digest_algorithm,
    )
    .with_err(|| ResolveError::Digest(kind))?;

    if digest == expected {
        return Ok(());
    }

    let mismatch = match kind {
        ResourceKind::Schema => ResolveError::XsdDigestMismatch,
        _ => ResolveError::XsltDigestMismatch,
    };
    Err(Error::root(mismatch).ctx(format!("expected {expected}, computed {digest}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::fetch::tests::MemoryFetcher;

    #[test]
    fn routes_identifiers_to_profiles() {
        assert_eq!(
            FormProfile::from_identifier("http://schemas.gov.sk/form/App.GeneralAgenda/1.9"),
            Some(FormProfile::Manifest {
                directory: "App.GeneralAgenda/1.9".to_owned()
            })
        );
        assert_eq!(
            FormProfile::from_identifier("https://data.gov.sk/id/egov/eform/42156424.IMPORT/1.0/"),
            Some(FormProfile::Manifest {
                directory: "42156424.IMPORT/1.0".to_owned()
            })
        );
        assert_eq!(
            FormProfile::from_identifier(
                "http://www.justice.gov.sk/Forms https://www.slovensko.sk/static/zep/orsr/form.xsd"
            ),
            Some(FormProfile::Direct {
                schema_url: "https://www.slovensko.sk/static/zep/orsr/form.xsd".to_owned()
            })
        );
        assert_eq!(
            FormProfile::from_identifier("http://data.gov.sk/doc/eform/"),
            Some(FormProfile::Manifest {
                directory: "doc/eform".to_owned()
            })
        );
        assert_eq!(FormProfile::from_identifier("urn:example:form"), None);
    }

    #[test]
    fn resource_urls_do_not_double_slashes() {
        assert_eq!(
            resource_url("https://data.gov.sk/doc/egov/eform/", "/App.GeneralAgenda/1.9/schema.xsd")
                .unwrap(),
            "https://data.gov.sk/doc/egov/eform/App.GeneralAgenda/1.9/schema.xsd"
        );
        assert_matches!(
            resource_url("not a url", "/schema.xsd").unwrap_err().error,
            ResolveError::InvalidUrl(_)
        );
    }

    #[test]
    fn text_resources_lose_their_bom() {
        assert_eq!(
            to_text(b"\xEF\xBB\xBF<a/>".to_vec(), ResourceKind::Schema).unwrap(),
            "<a/>"
        );
        assert_eq!(to_text(b"<a/>".to_vec(), ResourceKind::Schema).unwrap(), "<a/>");
    }

    #[test]
    fn unknown_documents_resolve_to_nothing() {
        let fetcher = MemoryFetcher::default();
        let config = ResolverConfig::default();

        let resolved = resolve_document(
            &fetcher,
            &config,
            br#"<form xmlns="urn:example:form"/>"#,
            &MimeType::XML,
            None,
            ResolveRequest::default(),
        )
        .unwrap();
        assert_eq!(resolved, None);

        let resolved = resolve_document(
            &fetcher,
            &config,
            b"%PDF-1.7",
            &MimeType::PDF,
            None,
            ResolveRequest::default(),
        )
        .unwrap();
        assert_eq!(resolved, None);
        assert!(fetcher.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn plain_document_routes_by_namespace() {
        let schema_url = "https://www.slovensko.sk/static/zep/orsr/form.xsd";
        let fetcher = MemoryFetcher::default()
            .with(schema_url, r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#)
            .with(
                "https://www.slovensko.sk/static/zep/orsr/form.xslt",
                r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform"/>"#,
            );
        let document = format!(r#"<form xmlns="{ORSR_PREFIX}{schema_url}"><name>A</name></form>"#);

        let descriptor = resolve_document(
            &fetcher,
            &ResolverConfig::default(),
            document.as_bytes(),
            &MimeType::XML,
            None,
            ResolveRequest::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(descriptor.identifier, schema_url);
        assert!(descriptor.embed_schemas);
    }

    #[test]
    fn fs_form_id_takes_precedence() {
        let fetcher = MemoryFetcher::default();

        let error = resolve_document(
            &fetcher,
            &ResolverConfig::default(),
            br#"<form xmlns="http://data.gov.sk/doc/eform/App.GeneralAgenda/1.9"/>"#,
            &MimeType::XML,
            Some("793_1"),
            ResolveRequest::default(),
        )
        .unwrap_err();

        assert_matches!(
            error.error,
            ResolveError::ResourceNotFound(ResourceKind::FormDefinition)
        );
        assert_eq!(
            fetcher.request_count(
                "https://autogram.slovensko.digital/public/eforms/fs/793_1/sign-data.json"
            ),
            1
        );
    }

    #[test]
    fn embedded_container_needs_no_fetching() {
        let fetcher = MemoryFetcher::default();
        let container = br#"<xdc:XMLDataContainer xmlns:xdc="http://data.gov.sk/def/container/xmldatacontainer+xml/1.1">
  <xdc:XMLData ContentType="application/xml; charset=UTF-8"><form xmlns="http://www.justice.gov.sk/Forms https://orsr.example/form.xsd"/></xdc:XMLData>
  <xdc:UsedSchemasEmbedded>
    <xdc:UsedXSDEmbedded><xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/></xdc:UsedXSDEmbedded>
    <xdc:UsedPresentationSchemaEmbedded ContentType="application/xslt+xml"><xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform"/></xdc:UsedPresentationSchemaEmbedded>
  </xdc:UsedSchemasEmbedded>
</xdc:XMLDataContainer>"#;

        let descriptor = resolve_document(
            &fetcher,
            &ResolverConfig::default(),
            container,
            &MimeType::XDC,
            None,
            ResolveRequest::default(),
        )
        .unwrap()
        .unwrap();

        assert!(descriptor.embed_schemas);
        assert!(descriptor.xsd_schema.unwrap().starts_with("<xs:schema"));
        assert!(fetcher.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn referenced_container_seeds_expected_digests() {
        let base = "https://data.gov.sk/doc/egov/eform/App.GeneralAgenda/1.9";
        let fetcher = MemoryFetcher::default()
            .with(
                &format!("{base}/META-INF/manifest.xml"),
                r#"<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">
  <manifest:file-entry media-type="application/xslt+xml" media-destination="sign" media-destination-type-description="TXT" full-path="form.sb.xslt"/>
</manifest:manifest>"#,
            )
            .with(
                &format!("{base}/form.sb.xslt"),
                r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform"/>"#,
            )
            .with(
                &format!("{base}/schema.xsd"),
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#,
            );
        let container = r#"<xdc:XMLDataContainer xmlns:xdc="http://data.gov.sk/def/container/xmldatacontainer+xml/1.1">
  <xdc:XMLData ContentType="application/xml; charset=UTF-8" Identifier="http://data.gov.sk/doc/eform/App.GeneralAgenda/1.9" Version="1.9"><GeneralAgenda xmlns="http://data.gov.sk/doc/eform/App.GeneralAgenda/1.9"/></xdc:XMLData>
  <xdc:UsedSchemasReferenced>
    <xdc:UsedXSDReference TransformAlgorithm="http://www.w3.org/TR/2001/REC-xml-c14n-20010315" DigestMethod="urn:oid:2.16.840.1.101.3.4.2.1" DigestValue="AAAA">http://schemas.gov.sk/form/App.GeneralAgenda/1.9/form.xsd</xdc:UsedXSDReference>
  </xdc:UsedSchemasReferenced>
</xdc:XMLDataContainer>"#;

        let error = resolve_document(
            &fetcher,
            &ResolverConfig::default(),
            container.as_bytes(),
            &MimeType::XDC,
            None,
            ResolveRequest::default(),
        )
        .unwrap_err();

        assert_matches!(error.error, ResolveError::XsdDigestMismatch);
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let fetcher = MemoryFetcher::default();

        assert_matches!(
            resolve_document(
                &fetcher,
                &ResolverConfig::default(),
                b"<form",
                &MimeType::XML,
                None,
                ResolveRequest::default(),
            )
            .unwrap_err()
            .error,
            ResolveError::InvalidFormDefinition(_)
        );
    }

    #[test]
    fn config_fields_default_individually() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"manifest_source_url": "https://mirror.example/eform/"}"#)
                .unwrap();

        assert_eq!(config.manifest_source_url, "https://mirror.example/eform/");
        assert_eq!(config.fs_source_url, ResolverConfig::default().fs_source_url);
    }
}
