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

//! Forms of the Financial Administration, published as complete `sign-data.json` definitions.

use bherror::{traits::ForeignError as _, Error};
use regex::Regex;
use serde::Deserialize;

use super::{
    fetch_resource, fill_xslt_params, resource_url, verify_digest, ResolveRequest, ResolverConfig,
    ResourceResolver,
};
use crate::{
    error::{ResolveError, ResourceKind, Result},
    FormDescriptor, ResourceFetcher, XsltParams,
};

lazy_static::lazy_static! {
    static ref FS_FILENAME: Regex =
        Regex::new(r"^.+_fs(\d{2,4}_\d{2,4}).*\.(xml|xdcf|asice|sce|)$").unwrap();
}

/// Extracts the form identifier from a file name such as `dic2120515056_fs792_772.xml`,
/// returning `792_772`.
pub fn fs_form_id(filename: &str) -> Option<String> {
    FS_FILENAME
        .captures(filename)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_owned())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignData {
    identifier: Option<String>,
    transformation: Option<String>,
    schema: Option<String>,
    container_xmlns: Option<String>,
    xsd_identifier: Option<String>,
    xslt_params: Option<SignDataXsltParams>,
    #[serde(default)]
    embed_used_schemas: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignDataXsltParams {
    identifier: Option<String>,
    language: Option<String>,
    destination_type: Option<String>,
    target: Option<String>,
    media_type: Option<String>,
}

impl From<SignDataXsltParams> for XsltParams {
    fn from(params: SignDataXsltParams) -> Self {
        Self {
            identifier: params.identifier,
            language: params.language,
            destination_type: params
                .destination_type
                .and_then(|destination_type| destination_type.parse().ok()),
            target: params.target,
            media_type: params.media_type,
        }
    }
}

/// Resolves a form from its `sign-data.json` definition.
pub struct FsResolver<F> {
    fetcher: F,
    source_url: String,
    form_id: String,
}

impl<F: ResourceFetcher> FsResolver<F> {
    /// Creates a resolver of the form `form_id`, e.g. `793_1`.
    pub fn new(fetcher: F, config: &ResolverConfig, form_id: impl Into<String>) -> Self {
        Self {
            fetcher,
            source_url: config.fs_source_url.clone(),
            form_id: form_id.into(),
        }
    }
}

impl<F: ResourceFetcher> ResourceResolver for FsResolver<F> {
    fn find_resources(&self, request: &ResolveRequest) -> Result<FormDescriptor, ResolveError> {
        let url = resource_url(
            &self.source_url,
            &format!("/{}/sign-data.json", self.form_id),
        )?;
        tracing::debug!(url, "resolving form resources from sign data");

        let sign_data = fetch_resource(&self.fetcher, &url, ResourceKind::FormDefinition)?;
        let sign_data: SignData = serde_json::from_slice(&sign_data)
            .foreign_err(|| ResolveError::InvalidFormDefinition(url.clone()))?;

        let identifier = sign_data.identifier.ok_or_else(|| {
            Error::root(ResolveError::InvalidFormDefinition(url.clone())).ctx("missing identifier")
        })?;
        let schema = sign_data
            .schema
            .ok_or_else(|| Error::root(ResolveError::ResourceNotFound(ResourceKind::Schema)))?;
        let xslt = sign_data.transformation.ok_or_else(|| {
            Error::root(ResolveError::ResourceNotFound(ResourceKind::Transformation))
        })?;

        verify_digest(
            schema.as_bytes(),
            request.expected_xsd_digest.as_deref(),
            request,
            ResourceKind::Schema,
        )?;
        verify_digest(
            xslt.as_bytes(),
            request.expected_xslt_digest.as_deref(),
            request,
            ResourceKind::Transformation,
        )?;

        let schema = schema.trim_start_matches('\u{feff}').to_owned();
        let xslt = xslt.trim_start_matches('\u{feff}').to_owned();
        let xslt_params = sign_data.xslt_params.unwrap_or_default().into();

        let mut descriptor = FormDescriptor::new(identifier)
            .with_schema(schema)
            .with_xslt_params(fill_xslt_params(&xslt, xslt_params))
            .with_transformation(xslt)
            .with_algorithms(request.canonicalization_method, request.digest_algorithm)
            .with_embedded_schemas(sign_data.embed_used_schemas);
        if let Some(container_xmlns) = sign_data.container_xmlns {
            descriptor = descriptor.with_container_namespace(Some(container_xmlns));
        }
        descriptor.xsd_identifier = sign_data.xsd_identifier;

        Ok(descriptor)
    }
}
