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

//! Manifest profile: the form directory holds a `META-INF/manifest.xml` listing many candidate
//! transformations, out of which exactly one is selected.

use bh_xml_utils::{output_destination_type, parse_document, DestinationType, Element};
use bherror::{traits::PropagateError as _, Error};

use super::{
    fetch_resource, resource_url, selection::select_xslt, selection::SelectionCriteria,
    to_text, verify_digest, ResolveRequest, ResolverConfig, ResourceResolver,
};
use crate::{
    error::{ResolveError, ResourceKind, Result},
    FormDescriptor, ResourceFetcher, XsltParams, XDC_NAMESPACE,
};

const XSLT_MEDIA_TYPES: [&str; 2] = ["application/xslt+xml", "text/xsl"];
const XML_MEDIA_TYPES: [&str; 2] = ["text/xml", "application/xml"];

/// Purpose of a manifest transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDestination {
    /// The transformation presents the form for signing.
    Sign,
    /// The transformation presents the form for viewing only.
    View,
}

/// A usable transformation listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path of the transformation relative to the form directory, with `/` separators.
    pub full_path: String,
    /// Declared MIME type of the transformation.
    pub media_type: Option<String>,
    /// Declared output language.
    pub language: Option<String>,
    /// Output format, declared or inspected.
    pub destination_type: DestinationType,
    /// Declared target environment.
    pub target: Option<String>,
    /// Purpose of the transformation.
    pub media_destination: MediaDestination,
}

/// Reads the usable transformations out of a parsed `manifest`, in source order.
///
/// Entries whose output format is not declared are classified by `inspect_output`, called with
/// the entry's path; entries it cannot classify are dropped.
pub fn read_entries<I>(manifest: &Element, mut inspect_output: I) -> Vec<ManifestEntry>
where
    I: FnMut(&str) -> Option<DestinationType>,
{
    let mut entries = Vec::new();

    for file_entry in manifest.find_all("file-entry") {
        let Some(full_path) = file_entry.attribute_local("full-path") else {
            continue;
        };
        let full_path = full_path.replace('\\', "/");
        let media_type = file_entry.attribute_local("media-type");

        let Some(media_destination) = media_destination_of(
            &full_path,
            media_type,
            file_entry.attribute_local("media-destination"),
        ) else {
            continue;
        };

        let declared = file_entry
            .attribute_local("media-destination-type-description")
            .and_then(|description| description.parse().ok())
            .or_else(|| {
                file_entry
                    .attribute_local("media-destination-type")
                    .and_then(DestinationType::from_media_destination_type)
            });

        let Some(destination_type) = declared.or_else(|| inspect_output(&full_path)) else {
            tracing::warn!(full_path, "dropping manifest entry with unknown output format");
            continue;
        };

        entries.push(ManifestEntry {
            full_path,
            media_type: media_type.map(ToOwned::to_owned),
            language: file_entry.attribute_local("media-language").map(ToOwned::to_owned),
            destination_type,
            target: file_entry
                .attribute_local("target-environment")
                .map(ToOwned::to_owned),
            media_destination,
        });
    }

    entries
}

/// Decides whether the entry is a sign or view transformation at all.
///
/// With an explicit `media-destination`, the entry needs an XSLT media type, or an XML media type
/// together with an XSL file name.  Without one, the legacy `*.sb.xslt` and `*.html.xslt` file
/// names are recognized.
fn media_destination_of(
    full_path: &str,
    media_type: Option<&str>,
    media_destination: Option<&str>,
) -> Option<MediaDestination> {
    let Some(media_destination) = media_destination else {
        if full_path.contains(".sb.xslt") {
            return Some(MediaDestination::Sign);
        }
        if full_path.contains(".html.xslt") {
            return Some(MediaDestination::View);
        }
        return None;
    };

    let media_destination = match media_destination {
        "sign" => MediaDestination::Sign,
        "view" => MediaDestination::View,
        _ => return None,
    };

    let media_type = media_type?;
    let is_xslt = XSLT_MEDIA_TYPES.contains(&media_type)
        || (XML_MEDIA_TYPES.contains(&media_type) && full_path.contains(".xsl"));

    is_xslt.then_some(media_destination)
}

/// Resolves the resources of a form published in a manifest-described directory.
pub struct ManifestResolver<F> {
    fetcher: F,
    config: ResolverConfig,
    directory: String,
}

impl<F: ResourceFetcher> ManifestResolver<F> {
    /// Creates a resolver for the form `directory`, e.g. `App.GeneralAgenda/1.9`.
    pub fn new(fetcher: F, config: ResolverConfig, directory: impl Into<String>) -> Self {
        Self {
            fetcher,
            config,
            directory: directory.into(),
        }
    }

    fn url(&self, path: &str) -> Result<String, ResolveError> {
        resource_url(
            &self.config.manifest_source_url,
            &format!("/{}/{}", self.directory, path),
        )
    }

    fn inspect_output(&self, full_path: &str) -> Option<DestinationType> {
        let url = self.url(full_path).ok()?;
        let body = fetch_resource(&self.fetcher, &url, ResourceKind::Transformation).ok()?;
        let xslt = to_text(body, ResourceKind::Transformation).ok()?;

        output_destination_type(&xslt).ok().flatten()
    }
}

impl<F: ResourceFetcher> ResourceResolver for ManifestResolver<F> {
    fn find_resources(&self, request: &ResolveRequest) -> Result<FormDescriptor, ResolveError> {
        let manifest_url = self.url("META-INF/manifest.xml")?;
        tracing::debug!(manifest_url, "resolving form resources from manifest");

        let manifest = fetch_resource(&self.fetcher, &manifest_url, ResourceKind::Manifest)?;
        let manifest = parse_document(&manifest).with_err(|| {
            ResolveError::InvalidFormDefinition(format!("manifest {manifest_url} is not valid XML"))
        })?;

        let entries = read_entries(&manifest, |full_path| self.inspect_output(full_path));
        let criteria = SelectionCriteria {
            destination_type: request.xslt_params.destination_type,
            language: request.xslt_params.language.as_deref(),
            target: request.xslt_params.target.as_deref(),
        };
        let entry = select_xslt(entries, &criteria).ok_or_else(|| {
            Error::root(ResolveError::ResourceNotFound(ResourceKind::Transformation))
                .ctx("no manifest entry satisfies the selection criteria")
        })?;
        tracing::debug!(full_path = entry.full_path, "selected transformation");

        let xslt = fetch_resource(
            &self.fetcher,
            &self.url(&entry.full_path)?,
            ResourceKind::Transformation,
        )?;
        verify_digest(
            &xslt,
            request.expected_xslt_digest.as_deref(),
            request,
            ResourceKind::Transformation,
        )?;

        let schema = fetch_resource(&self.fetcher, &self.url("schema.xsd")?, ResourceKind::Schema)?;
        verify_digest(
            &schema,
            request.expected_xsd_digest.as_deref(),
            request,
            ResourceKind::Schema,
        )?;

        let schema_base = format!("{}{}", self.config.schema_identifier_base, self.directory);
        let identifier = format!("{}{}", self.config.form_identifier_base, self.directory);

        let mut descriptor = FormDescriptor::new(identifier)
            .with_schema(to_text(schema, ResourceKind::Schema)?)
            .with_transformation(to_text(xslt, ResourceKind::Transformation)?)
            .with_algorithms(request.canonicalization_method, request.digest_algorithm)
            .with_container_namespace(Some(XDC_NAMESPACE.to_owned()))
            .with_xslt_params(XsltParams {
                identifier: Some(
                    request
                        .xslt_params
                        .identifier
                        .clone()
                        .unwrap_or_else(|| format!("{schema_base}/form.xslt")),
                ),
                language: entry.language,
                destination_type: Some(entry.destination_type),
                target: entry.target,
                media_type: entry.media_type,
            });
        descriptor.xsd_identifier = Some(
            request
                .xsd_identifier
                .clone()
                .unwrap_or_else(|| format!("{schema_base}/form.xsd")),
        );

        Ok(descriptor)
    }
}
