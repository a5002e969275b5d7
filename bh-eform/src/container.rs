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

//! Reading the structure of an existing XML Data Container.

use bh_xml_utils::{to_xml_string, CanonicalizationMethod, DigestAlgorithm, Element};

use crate::{FormDescriptor, ResolveRequest, XsltParams};

pub(crate) const ROOT: &str = "XMLDataContainer";
pub(crate) const XML_DATA: &str = "XMLData";
pub(crate) const USED_SCHEMAS_REFERENCED: &str = "UsedSchemasReferenced";
pub(crate) const USED_SCHEMAS_EMBEDDED: &str = "UsedSchemasEmbedded";
pub(crate) const XSD_REFERENCE: &str = "UsedXSDReference";
pub(crate) const XSLT_REFERENCE: &str = "UsedPresentationSchemaReference";
pub(crate) const XSD_EMBEDDED: &str = "UsedXSDEmbedded";
pub(crate) const XSLT_EMBEDDED: &str = "UsedPresentationSchemaEmbedded";

/// Returns `true` if `root` is an `XMLDataContainer` element, in any namespace.
pub fn is_container(root: &Element) -> bool {
    root.local_name() == ROOT
}

/// Everything a container states about the form it wraps.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContainerInfo {
    /// `XMLData/@Identifier`.
    pub identifier: Option<String>,
    /// `XMLData/@Version`.
    pub version: Option<String>,
    /// Namespace of the wrapped form document.
    pub form_namespace: Option<String>,
    /// Text of `UsedXSDReference`.
    pub xsd_identifier: Option<String>,
    /// `UsedXSDReference/@DigestValue`.
    pub xsd_digest: Option<String>,
    /// `UsedPresentationSchemaReference/@DigestValue`.
    pub xslt_digest: Option<String>,
    /// Canonicalization method of the digests, if recognized.
    pub canonicalization_method: Option<CanonicalizationMethod>,
    /// Digest algorithm of the digests, if recognized.
    pub digest_algorithm: Option<DigestAlgorithm>,
    /// Parameters of the presentation transformation.
    pub xslt_params: XsltParams,
    /// Serialized content of `UsedXSDEmbedded`.
    pub embedded_xsd: Option<String>,
    /// Serialized content of `UsedPresentationSchemaEmbedded`.
    pub embedded_xslt: Option<String>,
}

impl ContainerInfo {
    /// Reads the container rooted at `root`, or returns [`None`] if `root` is not a container.
    pub fn read(root: &Element) -> Option<Self> {
        if !is_container(root) {
            return None;
        }

        let mut info = Self::default();

        if let Some(xml_data) = child(root, XML_DATA) {
            info.identifier = xml_data.attribute_local("Identifier").map(ToOwned::to_owned);
            info.version = xml_data.attribute_local("Version").map(ToOwned::to_owned);
            info.form_namespace = xml_data
                .child_elements()
                .next()
                .and_then(|form| form.attribute("xmlns"))
                .map(ToOwned::to_owned);
        }

        if let Some(referenced) = child(root, USED_SCHEMAS_REFERENCED) {
            if let Some(xsd) = child(referenced, XSD_REFERENCE) {
                info.xsd_identifier = non_empty(xsd.text());
                info.xsd_digest = xsd.attribute_local("DigestValue").map(ToOwned::to_owned);
                info.canonicalization_method = xsd
                    .attribute_local("TransformAlgorithm")
                    .and_then(|method| method.parse().ok());
                info.digest_algorithm = xsd
                    .attribute_local("DigestMethod")
                    .and_then(|algorithm| algorithm.parse().ok());
            }
            if let Some(xslt) = child(referenced, XSLT_REFERENCE) {
                info.xslt_digest = xslt.attribute_local("DigestValue").map(ToOwned::to_owned);
                info.xslt_params = xslt_params(xslt);
                info.xslt_params.identifier = non_empty(xslt.text());
            }
        }

        if let Some(embedded) = child(root, USED_SCHEMAS_EMBEDDED) {
            if let Some(xsd) = child(embedded, XSD_EMBEDDED) {
                info.embedded_xsd = embedded_content(&[root, embedded, xsd]);
            }
            if let Some(xslt) = child(embedded, XSLT_EMBEDDED) {
                info.xslt_params = xslt_params(xslt);
                info.embedded_xslt = embedded_content(&[root, embedded, xslt]);
            }
        }

        Some(info)
    }

    /// Builds the descriptor of a container carrying both the schema and the transformation.
    ///
    /// The form is identified by `XMLData/@Identifier`, falling back to the wrapped document's
    /// namespace.
    pub fn embedded_descriptor(&self) -> Option<FormDescriptor> {
        let identifier = self.identifier.as_ref().or(self.form_namespace.as_ref())?;

        Some(
            FormDescriptor::new(identifier.clone())
                .with_schema(self.embedded_xsd.clone()?)
                .with_transformation(self.embedded_xslt.clone()?)
                .with_xslt_params(self.xslt_params.clone())
                .with_embedded_schemas(true),
        )
    }

    /// Turns the container's references into the expectations of a resolution, keeping the
    /// caller's algorithms where the container names none.
    pub fn into_request(self, request: ResolveRequest) -> ResolveRequest {
        ResolveRequest {
            canonicalization_method: self
                .canonicalization_method
                .unwrap_or(request.canonicalization_method),
            digest_algorithm: self.digest_algorithm.unwrap_or(request.digest_algorithm),
            expected_xsd_digest: self.xsd_digest,
            expected_xslt_digest: self.xslt_digest,
            xsd_identifier: self.xsd_identifier,
            xslt_params: self.xslt_params,
        }
    }
}

/// Extracts the form document wrapped in the container's `XMLData` element.
///
/// The namespace declarations in scope at the document are copied onto it, so that it can be
/// serialized on its own.  Returns [`None`] if `root` is not a container, or its `XMLData` holds
/// no element.
pub fn unwrap_payload(root: &Element) -> Option<Element> {
    if !is_container(root) {
        return None;
    }

    let xml_data = child(root, XML_DATA)?;
    let payload = xml_data.child_elements().next()?;

    Some(with_inherited_namespaces(&[root, xml_data], payload))
}

fn child<'a>(parent: &'a Element, local_name: &str) -> Option<&'a Element> {
    parent
        .child_elements()
        .find(|element| element.local_name() == local_name)
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

fn xslt_params(element: &Element) -> XsltParams {
    XsltParams {
        identifier: None,
        language: element.attribute_local("Language").map(ToOwned::to_owned),
        destination_type: element
            .attribute_local("MediaDestinationTypeDescription")
            .and_then(|destination_type| destination_type.parse().ok()),
        target: element
            .attribute_local("TargetEnvironment")
            .map(ToOwned::to_owned),
        media_type: element.attribute_local("ContentType").map(ToOwned::to_owned),
    }
}

/// Serializes the single element child of the last of `path`.
fn embedded_content(path: &[&Element]) -> Option<String> {
    let (holder, ancestors) = path.split_last()?;
    let content = holder.child_elements().next()?;

    let mut scope = ancestors.to_vec();
    scope.push(holder);
    to_xml_string(&with_inherited_namespaces(&scope, content)).ok()
}

/// Copies `element`, declaring on it every namespace of the `ancestors` (outermost first) that it
/// does not redeclare itself.
fn with_inherited_namespaces(ancestors: &[&Element], element: &Element) -> Element {
    let mut detached = element.clone();

    for ancestor in ancestors.iter().rev() {
        for (prefix, uri) in ancestor.namespace_declarations() {
            let name = match prefix {
                "" => "xmlns".to_owned(),
                prefix => format!("xmlns:{prefix}"),
            };
            if detached.attribute(&name).is_none() {
                detached.set_attribute(name, uri);
            }
        }
    }

    detached
}
