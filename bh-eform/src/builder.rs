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

//! Wrapping form documents into XML Data Containers.

use bh_xml_utils::{compute_digest, parse_str, to_xml_document, Element, MimeType};
use bherror::{traits::PropagateError as _, Error};

use crate::{
    container::{
        is_container, ROOT, USED_SCHEMAS_EMBEDDED, USED_SCHEMAS_REFERENCED, XML_DATA,
        XSD_EMBEDDED, XSD_REFERENCE, XSLT_EMBEDDED, XSLT_REFERENCE,
    },
    error::{BuildError, Result},
    FormDescriptor, XsltParams, XDC_EXTENSION, XSLT_MEDIA_TYPE,
};

const XML_DATA_CONTENT_TYPE: &str = "application/xml; charset=UTF-8";
const PREFIX: &str = "xdc";

/// A serialized XML Data Container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltContainer {
    /// UTF-8 encoded container document.
    pub content: Vec<u8>,
    /// File name of the container, see [`container_filename`].
    pub filename: String,
    /// Always [`MimeType::XDC`].
    pub mime_type: MimeType,
}

/// Wraps the form document `payload` into an XML Data Container described by `descriptor`.
///
/// The `payload` is copied, never modified.  A `payload` which already is a container is
/// serialized as is, so building is idempotent.
///
/// # Errors
///
/// * [`BuildError::MalformedIdentifier`] if the form identifier contains no `/`,
/// * [`BuildError::Transformation`] if the schema or transformation cannot be digested or, in
///   embedded mode, parsed.
pub fn build(
    descriptor: &FormDescriptor,
    filename: &str,
    payload: &Element,
) -> Result<BuiltContainer, BuildError> {
    let filename = container_filename(filename);

    if is_container(payload) {
        tracing::debug!(filename, "document already is a container");
        return finish(payload, filename);
    }

    if !descriptor.identifier.contains('/') {
        return Err(Error::root(BuildError::MalformedIdentifier(
            descriptor.identifier.clone(),
        )));
    }

    let names = Names::new(descriptor.container_namespace.is_some());

    let mut xml_data = Element::new(names.qualify(XML_DATA))
        .with_attribute("ContentType", XML_DATA_CONTENT_TYPE);
    if !descriptor.embed_schemas {
        xml_data.set_attribute("Identifier", &descriptor.identifier);
        xml_data.set_attribute("Version", descriptor.version());
    }
    xml_data.push(payload.clone());

    let used_schemas = if descriptor.embed_schemas {
        used_schemas_embedded(descriptor, &names)?
    } else {
        used_schemas_referenced(descriptor, &names)?
    };

    let mut root = Element::new(names.qualify(ROOT));
    if let Some(namespace) = &descriptor.container_namespace {
        root.set_attribute(format!("xmlns:{PREFIX}"), namespace);
    }
    let root = root.with_child(xml_data).with_child(used_schemas);

    tracing::debug!(
        filename,
        embedded = descriptor.embed_schemas,
        "built XML Data Container"
    );
    finish(&root, filename)
}

/// Rewrites a document file name to the container file name.
///
/// A name without an extension gets the [`XDC_EXTENSION`] appended, a `.xml` extension is
/// replaced by it, any other name gets it appended unless it already contains it.
pub fn container_filename(filename: &str) -> String {
    let extension = format!(".{XDC_EXTENSION}");

    if !filename.contains('.') {
        format!("{filename}{extension}")
    } else if let Some(stem) = filename.strip_suffix(".xml") {
        format!("{stem}{extension}")
    } else if filename.contains(&extension) {
        filename.to_owned()
    } else {
        format!("{filename}{extension}")
    }
}

fn finish(root: &Element, filename: String) -> Result<BuiltContainer, BuildError> {
    let content = to_xml_document(root).with_err(|| BuildError::Transformation)?;

    Ok(BuiltContainer {
        content: content.into_bytes(),
        filename,
        mime_type: MimeType::XDC,
    })
}

/// Element naming, prefixed with `xdc:` when the container is namespaced.
struct Names {
    prefixed: bool,
}

impl Names {
    fn new(prefixed: bool) -> Self {
        Self { prefixed }
    }

    fn qualify(&self, local_name: &str) -> String {
        if self.prefixed {
            format!("{PREFIX}:{local_name}")
        } else {
            local_name.to_owned()
        }
    }
}

fn used_schemas_referenced(
    descriptor: &FormDescriptor,
    names: &Names,
) -> Result<Element, BuildError> {
    let mut used_schemas = Element::new(names.qualify(USED_SCHEMAS_REFERENCED));

    if let Some(xsd) = &descriptor.xsd_schema {
        let reference = digest_reference(descriptor, names.qualify(XSD_REFERENCE), xsd)?
            .with_text(
                descriptor
                    .xsd_identifier
                    .clone()
                    .unwrap_or_else(|| descriptor.conventional_uri("form.xsd")),
            );
        used_schemas.push(reference);
    }

    if let Some(xslt) = &descriptor.xslt {
        let mut reference = digest_reference(descriptor, names.qualify(XSLT_REFERENCE), xslt)?;
        presentation_attributes(&mut reference, &descriptor.xslt_params);
        let reference = reference.with_text(
            descriptor
                .xslt_params
                .identifier
                .clone()
                .unwrap_or_else(|| descriptor.conventional_uri("form.xslt")),
        );
        used_schemas.push(reference);
    }

    Ok(used_schemas)
}

fn digest_reference(
    descriptor: &FormDescriptor,
    name: String,
    content: &str,
) -> Result<Element, BuildError> {
    let digest = compute_digest(
        content.as_bytes(),
        descriptor.canonicalization_method,
        descriptor.digest_algorithm,
    )
    .with_err(|| BuildError::Transformation)?;

    Ok(Element::new(name)
        .with_attribute("TransformAlgorithm", descriptor.canonicalization_method.uri())
        .with_attribute("DigestMethod", descriptor.digest_algorithm.urn_oid())
        .with_attribute("DigestValue", digest))
}

fn used_schemas_embedded(
    descriptor: &FormDescriptor,
    names: &Names,
) -> Result<Element, BuildError> {
    let mut used_schemas = Element::new(names.qualify(USED_SCHEMAS_EMBEDDED));

    if let Some(xsd) = &descriptor.xsd_schema {
        let schema = parse_str(xsd).with_err(|| BuildError::Transformation)?;
        used_schemas.push(Element::new(names.qualify(XSD_EMBEDDED)).with_child(schema));
    }

    if let Some(xslt) = &descriptor.xslt {
        let transformation = parse_str(xslt).with_err(|| BuildError::Transformation)?;
        let mut embedded = Element::new(names.qualify(XSLT_EMBEDDED));
        presentation_attributes(&mut embedded, &descriptor.xslt_params);
        used_schemas.push(embedded.with_child(transformation));
    }

    Ok(used_schemas)
}

fn presentation_attributes(element: &mut Element, params: &XsltParams) {
    element.set_attribute(
        "ContentType",
        params.media_type.as_deref().unwrap_or(XSLT_MEDIA_TYPE),
    );
    if let Some(destination_type) = params.destination_type {
        element.set_attribute("MediaDestinationTypeDescription", destination_type.as_str());
    }
    if let Some(language) = &params.language {
        element.set_attribute("Language", language);
    }
    if let Some(target) = &params.target {
        element.set_attribute("TargetEnvironment", target);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use bh_xml_utils::{parse_document, CanonicalizationMethod, DestinationType, DigestAlgorithm};

    use super::*;
    use crate::{container::unwrap_payload, ContainerInfo};

    const PAYLOAD: &str = r#"<GeneralAgenda xmlns="ns"><subject>A</subject></GeneralAgenda>"#;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="ns" elementFormDefault="qualified">
  <xs:element name="GeneralAgenda">
    <xs:complexType><xs:sequence><xs:element name="subject" type="xs:string"/></xs:sequence></xs:complexType>
  </xs:element>
</xs:schema>"#;

    const XSLT: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
  <xsl:output method="text"/>
  <xsl:template match="/"><xsl:value-of select="."/></xsl:template>
</xsl:stylesheet>"#;

    fn descriptor() -> FormDescriptor {
        FormDescriptor::new("http://schemas.example/App.Form/1.9")
            .with_schema(SCHEMA)
            .with_transformation(XSLT)
            .with_algorithms(CanonicalizationMethod::Inclusive, DigestAlgorithm::Sha256)
            .with_xslt_params(XsltParams {
                language: Some("sk".to_owned()),
                destination_type: Some(DestinationType::Txt),
                ..Default::default()
            })
    }

    fn payload() -> Element {
        parse_str(PAYLOAD).unwrap()
    }

    #[test]
    fn builds_referenced_container() {
        let built = build(&descriptor(), "agenda.xml", &payload()).unwrap();

        assert_eq!(built.filename, "agenda.xdcf");
        assert_eq!(built.mime_type, MimeType::XDC);

        let container = parse_document(&built.content).unwrap();
        assert_eq!(container.name(), "xdc:XMLDataContainer");
        assert_eq!(
            container.attribute("xmlns:xdc"),
            Some("http://data.gov.sk/def/container/xmldatacontainer+xml/1.1")
        );

        let xml_data = container.find("XMLData").unwrap();
        assert_eq!(xml_data.attribute("ContentType"), Some(XML_DATA_CONTENT_TYPE));
        assert_eq!(
            xml_data.attribute("Identifier"),
            Some("http://schemas.example/App.Form/1.9")
        );
        assert_eq!(xml_data.attribute("Version"), Some("1.9"));
        let unwrapped = unwrap_payload(&container).unwrap();
        assert_eq!(unwrapped.name(), "GeneralAgenda");
        assert_eq!(unwrapped.attribute("xmlns"), Some("ns"));
        assert_eq!(unwrapped.find("subject").unwrap().text(), "A");

        let xsd_reference = container.find("UsedXSDReference").unwrap();
        assert_eq!(
            xsd_reference.attribute("TransformAlgorithm"),
            Some("http://www.w3.org/TR/2001/REC-xml-c14n-20010315")
        );
        assert_eq!(
            xsd_reference.attribute("DigestMethod"),
            Some("urn:oid:2.16.840.1.101.3.4.2.1")
        );
        let expected = compute_digest(
            SCHEMA.as_bytes(),
            CanonicalizationMethod::Inclusive,
            DigestAlgorithm::Sha256,
        )
        .unwrap();
        assert_eq!(xsd_reference.attribute("DigestValue"), Some(expected.as_str()));
        assert_eq!(
            xsd_reference.text(),
            "http://schemas.example/App.Form/1.9/form.xsd"
        );

        let xslt_reference = container.find("UsedPresentationSchemaReference").unwrap();
        assert_eq!(
            xslt_reference.attribute("ContentType"),
            Some("application/xslt+xml")
        );
        assert_eq!(
            xslt_reference.attribute("MediaDestinationTypeDescription"),
            Some("TXT")
        );
        assert_eq!(xslt_reference.attribute("Language"), Some("sk"));
        assert_eq!(xslt_reference.attribute("TargetEnvironment"), None);
        assert_eq!(
            xslt_reference.text(),
            "http://schemas.example/App.Form/1.9/form.xslt"
        );
    }

    #[test]
    fn building_is_idempotent() {
        let once = build(&descriptor(), "agenda.xml", &payload()).unwrap();
        let container = parse_document(&once.content).unwrap();

        let twice = build(&descriptor(), &once.filename, &container).unwrap();

        assert_eq!(twice.content, once.content);
        assert_eq!(twice.filename, once.filename);
        assert_eq!(
            parse_document(&twice.content)
                .unwrap()
                .find_all("XMLDataContainer")
                .len(),
            1
        );
    }

    #[test]
    fn builds_embedded_container() {
        let descriptor = descriptor().with_embedded_schemas(true);

        let built = build(&descriptor, "agenda.xml", &payload()).unwrap();
        let container = parse_document(&built.content).unwrap();

        let xml_data = container.find("XMLData").unwrap();
        assert_eq!(xml_data.attribute("Identifier"), None);
        assert_eq!(xml_data.attribute("Version"), None);
        assert!(container.find("UsedSchemasReferenced").is_none());

        let schema = container.find("UsedXSDEmbedded").unwrap();
        assert_eq!(schema.child_elements().next().unwrap().name(), "xs:schema");
        let xslt = container.find("UsedPresentationSchemaEmbedded").unwrap();
        assert_eq!(xslt.attribute("MediaDestinationTypeDescription"), Some("TXT"));
        assert_eq!(
            xslt.child_elements().next().unwrap().name(),
            "xsl:stylesheet"
        );

        let info = ContainerInfo::read(&container).unwrap();
        assert!(info.embedded_xsd.unwrap().contains("GeneralAgenda"));
    }

    #[test]
    fn missing_resources_are_omitted() {
        let descriptor = FormDescriptor::new("http://schemas.example/App.Form/1.9");

        let built = build(&descriptor, "agenda.xml", &payload()).unwrap();
        let container = parse_document(&built.content).unwrap();

        let used_schemas = container.find("UsedSchemasReferenced").unwrap();
        assert_eq!(used_schemas.child_elements().count(), 0);
    }

    #[test]
    fn explicit_reference_uris_win() {
        let mut descriptor = descriptor();
        descriptor.xsd_identifier = Some("http://schemas.example/custom.xsd".to_owned());
        descriptor.xslt_params.identifier = Some("http://schemas.example/custom.xslt".to_owned());
        descriptor.xslt_params.target = Some("mobile".to_owned());

        let built = build(&descriptor, "agenda.xml", &payload()).unwrap();
        let container = parse_document(&built.content).unwrap();

        assert_eq!(
            container.find("UsedXSDReference").unwrap().text(),
            "http://schemas.example/custom.xsd"
        );
        let xslt_reference = container.find("UsedPresentationSchemaReference").unwrap();
        assert_eq!(xslt_reference.text(), "http://schemas.example/custom.xslt");
        assert_eq!(xslt_reference.attribute("TargetEnvironment"), Some("mobile"));
    }

    #[test]
    fn unqualified_container_without_namespace() {
        let descriptor = descriptor().with_container_namespace(None);

        let built = build(&descriptor, "agenda.xml", &payload()).unwrap();
        let container = parse_document(&built.content).unwrap();

        assert_eq!(container.name(), "XMLDataContainer");
        assert_eq!(container.attribute("xmlns:xdc"), None);
        assert!(container.find("XMLData").is_some());
    }

    #[test]
    fn version_attribute_follows_identifier() {
        let mut descriptor = descriptor();
        descriptor.identifier = "http://schemas.example/App.Form/2.0".to_owned();

        let built = build(&descriptor, "agenda.xml", &payload()).unwrap();

        let container = parse_document(&built.content).unwrap();
        let xml_data = container.find("XMLData").unwrap();
        assert_eq!(xml_data.attribute("Version"), Some("2.0"));
        assert_eq!(
            container.find("UsedXSDReference").unwrap().text(),
            "http://schemas.example/App.Form/2.0/form.xsd"
        );
    }

    #[test]
    fn identifier_without_slash_is_rejected() {
        let descriptor = FormDescriptor::new("App.Form");

        assert_matches!(
            build(&descriptor, "agenda.xml", &payload()).unwrap_err().error,
            BuildError::MalformedIdentifier(identifier) if identifier == "App.Form"
        );
    }

    #[test]
    fn malformed_embedded_schema_is_rejected() {
        let descriptor = descriptor()
            .with_schema("<xs:schema")
            .with_embedded_schemas(true);

        assert_matches!(
            build(&descriptor, "agenda.xml", &payload()).unwrap_err().error,
            BuildError::Transformation
        );
    }

    #[test]
    fn container_filenames() {
        assert_eq!(container_filename("agenda"), "agenda.xdcf");
        assert_eq!(container_filename("agenda.xml"), "agenda.xdcf");
        assert_eq!(container_filename("agenda.xdcf"), "agenda.xdcf");
        assert_eq!(container_filename("agenda.txt"), "agenda.txt.xdcf");
        assert_eq!(container_filename("v1.xml.bak"), "v1.xml.bak.xdcf");
    }
}
