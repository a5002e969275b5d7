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

use super::{
    fetch_resource, fill_xslt_params, to_text, verify_digest, ResolveRequest, ResourceResolver,
};
use crate::{
    error::{ResolveError, ResourceKind, Result},
    FormDescriptor, ResourceFetcher, XDC_NAMESPACE,
};

/// Resolves a form whose schema sits at a fixed URL, with the transformation next to it under
/// the `.xslt` extension.
///
/// Forms of this profile are always embedded into the container.
pub struct DirectResolver<F> {
    fetcher: F,
    schema_url: String,
}

impl<F: ResourceFetcher> DirectResolver<F> {
    /// Creates a resolver for the schema at `schema_url`.
    pub fn new(fetcher: F, schema_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            schema_url: schema_url.into(),
        }
    }

    fn transformation_url(&self) -> String {
        self.schema_url.replace(".xsd", ".xslt")
    }
}

impl<F: ResourceFetcher> ResourceResolver for DirectResolver<F> {
    fn find_resources(&self, request: &ResolveRequest) -> Result<FormDescriptor, ResolveError> {
        tracing::debug!(schema_url = self.schema_url, "resolving form resources directly");

        let schema = fetch_resource(&self.fetcher, &self.schema_url, ResourceKind::Schema)?;
        verify_digest(
            &schema,
            request.expected_xsd_digest.as_deref(),
            request,
            ResourceKind::Schema,
        )?;

        let xslt = fetch_resource(
            &self.fetcher,
            &self.transformation_url(),
            ResourceKind::Transformation,
        )?;
        verify_digest(
            &xslt,
            request.expected_xslt_digest.as_deref(),
            request,
            ResourceKind::Transformation,
        )?;
        let xslt = to_text(xslt, ResourceKind::Transformation)?;

        Ok(FormDescriptor::new(self.schema_url.clone())
            .with_schema(to_text(schema, ResourceKind::Schema)?)
            .with_xslt_params(fill_xslt_params(&xslt, request.xslt_params.clone()))
            .with_transformation(xslt)
            .with_algorithms(request.canonicalization_method, request.digest_algorithm)
            .with_embedded_schemas(true)
            .with_container_namespace(Some(XDC_NAMESPACE.to_owned())))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use bh_xml_utils::DestinationType;

    use super::*;
    use crate::fetch::tests::MemoryFetcher;

    const SCHEMA_URL: &str = "https://www.slovensko.sk/static/zep/orsr/form.xsd";
    const XSLT_URL: &str = "https://www.slovensko.sk/static/zep/orsr/form.xslt";

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#;
    const XSLT: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform"><xsl:output method="text"/></xsl:stylesheet>"#;

    #[test]
    fn fetches_both_resources_and_embeds_them() {
        let fetcher = MemoryFetcher::default()
            .with(SCHEMA_URL, SCHEMA)
            .with(XSLT_URL, format!("\u{feff}{XSLT}"));

        let descriptor = DirectResolver::new(&fetcher, SCHEMA_URL)
            .find_resources(&ResolveRequest::default())
            .unwrap();

        assert!(descriptor.embed_schemas);
        assert_eq!(descriptor.xsd_schema.as_deref(), Some(SCHEMA));
        assert_eq!(descriptor.xslt.as_deref(), Some(XSLT));
        assert_eq!(
            descriptor.xslt_params.destination_type,
            Some(DestinationType::Txt)
        );
    }

    #[test]
    fn missing_schema() {
        let fetcher = MemoryFetcher::default().with(XSLT_URL, XSLT);

        assert_matches!(
            DirectResolver::new(&fetcher, SCHEMA_URL)
                .find_resources(&ResolveRequest::default())
                .unwrap_err()
                .error,
            ResolveError::ResourceNotFound(ResourceKind::Schema)
        );
    }

    #[test]
    fn missing_transformation() {
        let fetcher = MemoryFetcher::default().with(SCHEMA_URL, SCHEMA);

        assert_matches!(
            DirectResolver::new(&fetcher, SCHEMA_URL)
                .find_resources(&ResolveRequest::default())
                .unwrap_err()
                .error,
            ResolveError::ResourceNotFound(ResourceKind::Transformation)
        );
    }
}
