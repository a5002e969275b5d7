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

use std::io::{Cursor, Read as _};

use bh_xml_utils::{parse_document, Element, MimeType};
use bherror::{
    traits::{ErrorContext as _, ForeignError as _, PropagateError as _},
    Error,
};

use crate::error::{ExtractError, Result};

const MIMETYPE_ENTRY: &str = "mimetype";
const META_INF: &str = "META-INF/";
const MANIFEST_ENTRY: &str = "META-INF/manifest.xml";
const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";
const SIGNED_PROPERTIES_TYPE: &str = "http://uri.etsi.org/01903#SignedProperties";

/// Largest uncompressed entry size accepted by [`AsicContainer::open`], 64 MiB.
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

/// A document carried by an ASiC container.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginalDocument {
    /// Path of the document inside the container.
    pub name: String,
    /// Raw content of the document.
    pub content: Vec<u8>,
    /// MIME type of the document.
    pub mime_type: MimeType,
}

#[derive(Debug)]
struct Entry {
    name: String,
    content: Vec<u8>,
}

/// An opened ASiC-S or ASiC-E container with all of its entries read into memory.
#[derive(Debug)]
pub struct AsicContainer {
    entries: Vec<Entry>,
}

impl AsicContainer {
    /// Opens the ASiC container serialized in `archive`, reading at most
    /// [`DEFAULT_MAX_ENTRY_SIZE`] bytes per entry.
    ///
    /// # Errors
    ///
    /// Fails with [`ExtractError::FileNotFound`] if `archive` is not a ZIP archive, if it declares
    /// a `mimetype` other than an ASiC one, or if it has no `META-INF/` entries.
    pub fn open(archive: &[u8]) -> Result<Self> {
        Self::open_with_limit(archive, DEFAULT_MAX_ENTRY_SIZE)
    }

    /// Opens the ASiC container serialized in `archive`, rejecting it with
    /// [`ExtractError::FileNotFound`] when any entry inflates to more than `max_entry_size`
    /// bytes.  Otherwise behaves like [`AsicContainer::open`].
    pub fn open_with_limit(archive: &[u8], max_entry_size: u64) -> Result<Self> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive))
            .foreign_err(|| ExtractError::FileNotFound)?;

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip
                .by_index(index)
                .foreign_err(|| ExtractError::FileNotFound)?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_owned();
            let mut content = Vec::new();
            (&mut file)
                .take(max_entry_size.saturating_add(1))
                .read_to_end(&mut content)
                .foreign_err(|| ExtractError::FileNotFound)
                .ctx(|| format!("unable to read entry {name}"))?;
            if content.len() as u64 > max_entry_size {
                return Err(Error::root(ExtractError::FileNotFound)
                    .ctx(format!("entry {name} exceeds {max_entry_size} bytes")));
            }

            entries.push(Entry { name, content });
        }

        let container = Self { entries };

        if let Some(declared) = container.entry(MIMETYPE_ENTRY) {
            let declared = String::from_utf8_lossy(&declared.content);
            if !MimeType::parse(&declared).is_some_and(|mime_type| mime_type.is_asic()) {
                return Err(Error::root(ExtractError::FileNotFound)
                    .ctx(format!("unsupported container type {}", declared.trim())));
            }
        }
        if !container.entries.iter().any(|entry| is_meta_inf(&entry.name)) {
            return Err(Error::root(ExtractError::FileNotFound).ctx("no META-INF entries"));
        }

        Ok(container)
    }

    /// Names of the signature entries, i.e. the `META-INF/` entries whose name contains
    /// `signature` and which are either XAdES (`.xml`) or CAdES (`.p7s`) signatures.
    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(|entry| entry.name.as_str())
            .filter(|name| is_signature(name))
    }

    /// All documents carried by the container, i.e. everything outside `META-INF/` except the
    /// `mimetype` entry.
    pub fn documents(&self) -> Vec<OriginalDocument> {
        self.entries
            .iter()
            .filter(|entry| entry.name != MIMETYPE_ENTRY && !is_meta_inf(&entry.name))
            .map(|entry| OriginalDocument {
                name: entry.name.clone(),
                content: entry.content.clone(),
                mime_type: self.mime_type_of(&entry.name),
            })
            .collect()
    }

    /// Returns the single signed document of the container.
    ///
    /// # Errors
    ///
    /// Fails if the container has no signatures or no documents, and if not exactly one of the
    /// documents is covered by a signature.
    pub fn original_document(&self) -> Result<OriginalDocument> {
        let signatures: Vec<&str> = self.signatures().collect();
        if signatures.is_empty() {
            return Err(Error::root(ExtractError::NoSignature));
        }

        let documents = self.documents();
        if documents.is_empty() {
            return Err(Error::root(ExtractError::NoDocuments));
        }

        let mut signed_uris = Vec::new();
        for signature in signatures {
            match self.signed_uris(signature)? {
                Some(uris) => signed_uris.extend(uris),
                // a CAdES signature without an ASiC manifest covers every document
                None => signed_uris.extend(documents.iter().map(|document| document.name.clone())),
            }
        }

        let mut signed: Vec<OriginalDocument> = documents
            .into_iter()
            .filter(|document| signed_uris.iter().any(|uri| refers_to(uri, &document.name)))
            .collect();

        match signed.len() {
            0 => Err(Error::root(ExtractError::NoSignedDocuments)),
            1 => {
                let document = signed.remove(0);
                tracing::debug!(
                    name = %document.name,
                    mime_type = %document.mime_type,
                    "original document found"
                );
                Ok(document)
            }
            count => Err(Error::root(ExtractError::MultipleOriginalDocumentsFound)
                .ctx(format!("{count} signed documents"))),
        }
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// URIs of the documents covered by the signature entry `name`.
    ///
    /// Returns [`None`] for a CAdES signature which is not accompanied by an ASiC manifest.
    fn signed_uris(&self, name: &str) -> Result<Option<Vec<String>>> {
        if name.ends_with(".p7s") {
            return self.asic_manifest_uris();
        }

        let Some(signature) = self.entry(name) else {
            return Ok(Some(Vec::new()));
        };
        let signature = parse_document(&signature.content)
            .with_err(|| ExtractError::FileNotFound)
            .ctx(|| format!("unable to parse signature {name}"))?;

        let uris = signature
            .find_all_ns(XMLDSIG_NAMESPACE, "Reference")
            .into_iter()
            .filter(|reference| reference.attribute("Type") != Some(SIGNED_PROPERTIES_TYPE))
            .filter_map(|reference| reference.attribute("URI"))
            .filter(|uri| !uri.is_empty() && !uri.starts_with('#'))
            .map(str::to_owned)
            .collect();

        Ok(Some(uris))
    }

    fn asic_manifest_uris(&self) -> Result<Option<Vec<String>>> {
        let mut manifests = self
            .entries
            .iter()
            .filter(|entry| is_meta_inf(&entry.name) && entry.name.contains("ASiCManifest"))
            .peekable();
        if manifests.peek().is_none() {
            return Ok(None);
        }

        let mut uris = Vec::new();
        for manifest in manifests {
            let parsed = parse_document(&manifest.content)
                .with_err(|| ExtractError::FileNotFound)
                .ctx(|| format!("unable to parse manifest {}", manifest.name))?;
            uris.extend(
                parsed
                    .find_all("DataObjectReference")
                    .into_iter()
                    .filter_map(|reference| reference.attribute("URI"))
                    .map(str::to_owned),
            );
        }

        Ok(Some(uris))
    }

    /// MIME type of the document `name`, preferring the `META-INF/manifest.xml` declaration
    /// over a generic type inferred from the name.
    fn mime_type_of(&self, name: &str) -> MimeType {
        let inferred = MimeType::from_filename(name);
        if !inferred.is_generic() {
            return inferred;
        }

        self.manifest()
            .and_then(|manifest| declared_media_type(&manifest, name))
            .unwrap_or(inferred)
    }

    fn manifest(&self) -> Option<Element> {
        let manifest = self.entry(MANIFEST_ENTRY)?;
        match parse_document(&manifest.content) {
            Ok(manifest) => Some(manifest),
            Err(err) => {
                tracing::warn!(%err, "ignoring unreadable container manifest");
                None
            }
        }
    }
}

/// Extracts the single signed document out of the ASiC container serialized in `archive`.
///
/// # Errors
///
/// Fails with the [`ExtractError`] describing why no single original document could be found.
pub fn extract_original(archive: &[u8]) -> Result<OriginalDocument> {
    AsicContainer::open(archive)?.original_document()
}

fn is_meta_inf(name: &str) -> bool {
    name.starts_with(META_INF)
}

fn is_signature(name: &str) -> bool {
    is_meta_inf(name)
        && name.to_ascii_lowercase().contains("signature")
        && (name.ends_with(".xml") || name.ends_with(".p7s"))
}

/// Whether the signed `uri` points to the entry `name`.
fn refers_to(uri: &str, name: &str) -> bool {
    let uri = uri.strip_prefix("./").unwrap_or(uri);
    uri == name || uri.replace("%20", " ") == name
}

fn declared_media_type(manifest: &Element, name: &str) -> Option<MimeType> {
    manifest
        .find_all("file-entry")
        .into_iter()
        .find(|entry| entry.attribute_local("full-path") == Some(name))
        .and_then(|entry| entry.attribute_local("media-type"))
        .and_then(MimeType::parse)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use assert_matches::assert_matches;
    use zip::write::SimpleFileOptions;

    use super::*;

    const ASICE: &str = "application/vnd.etsi.asic-e+zip";

    fn xades(uris: &[&str]) -> String {
        let references: String = uris
            .iter()
            .map(|uri| {
                format!(
                    r#"<ds:Reference URI="{uri}"><ds:DigestValue>AA==</ds:DigestValue></ds:Reference>"#
                )
            })
            .collect();

        format!(
            r##"<asic:XAdESSignatures xmlns:asic="http://uri.etsi.org/02918/v1.2.1#" xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
  <ds:Signature Id="S0"><ds:SignedInfo>{references}<ds:Reference Type="http://uri.etsi.org/01903#SignedProperties" URI="#xades-S0"/></ds:SignedInfo></ds:Signature>
</asic:XAdESSignatures>"##
        )
    }

    fn asic_manifest(uris: &[&str]) -> String {
        let references: String = uris
            .iter()
            .map(|uri| format!(r#"<asic:DataObjectReference URI="{uri}"/>"#))
            .collect();

        format!(
            r#"<asic:ASiCManifest xmlns:asic="http://uri.etsi.org/02918/v1.2.1#"><asic:SigReference URI="META-INF/signature001.p7s"/>{references}</asic:ASiCManifest>"#
        )
    }

    fn manifest(entries: &[(&str, &str)]) -> String {
        let entries: String = entries
            .iter()
            .map(|(path, media_type)| {
                format!(r#"<manifest:file-entry manifest:full-path="{path}" manifest:media-type="{media_type}"/>"#)
            })
            .collect();

        format!(
            r#"<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0"><manifest:file-entry manifest:full-path="/" manifest:media-type="{ASICE}"/>{entries}</manifest:manifest>"#
        )
    }

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn error(archive: &[u8]) -> ExtractError {
        extract_original(archive).unwrap_err().error
    }

    #[test]
    fn single_signed_document() {
        let signature = xades(&["agenda.xml"]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("agenda.xml", b"<GeneralAgenda/>"),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);

        let document = extract_original(&archive).unwrap();

        assert_eq!(document.name, "agenda.xml");
        assert_eq!(document.content, b"<GeneralAgenda/>");
        assert_eq!(document.mime_type, MimeType::XML);
    }

    #[test]
    fn unsigned_documents_are_ignored() {
        let signature = xades(&["contract.pdf"]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("contract.pdf", b"%PDF-1.7"),
            ("notes.txt", b"unsigned"),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);

        let document = extract_original(&archive).unwrap();

        assert_eq!(document.name, "contract.pdf");
        assert_eq!(document.mime_type, MimeType::PDF);
    }

    #[test]
    fn two_signed_documents_are_ambiguous() {
        let signature = xades(&["first.xml", "second.xml"]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("first.xml", b"<a/>"),
            ("second.xml", b"<b/>"),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);

        assert_eq!(error(&archive), ExtractError::MultipleOriginalDocumentsFound);
        assert_eq!(
            ExtractError::MultipleOriginalDocumentsFound.title(),
            "Unsupported visualization"
        );
    }

    #[test]
    fn manifest_refines_generic_type() {
        let signature = xades(&["doc.xml", "report.bin"]);
        let manifest = manifest(&[("doc.xml", "text/csv")]);

        let container = AsicContainer::open(&archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("doc.xml", b"a;b;c"),
            ("report.bin", b"\x00\x01"),
            ("META-INF/manifest.xml", manifest.as_bytes()),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]))
        .unwrap();

        let documents = container.documents();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].mime_type, MimeType::parse("text/csv").unwrap());
        // no manifest entry, the inferred type is kept
        assert_eq!(documents[1].mime_type, MimeType::OCTET_STREAM);
    }

    #[test]
    fn manifest_override_on_extraction() {
        let signature = xades(&["doc.xml"]);
        let manifest = manifest(&[("doc.xml", "text/csv")]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("doc.xml", b"a;b;c"),
            ("META-INF/manifest.xml", manifest.as_bytes()),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);

        let document = extract_original(&archive).unwrap();

        assert_eq!(document.mime_type.as_str(), "text/csv");
    }

    #[test]
    fn specific_type_is_not_overridden() {
        let signature = xades(&["contract.pdf"]);
        let manifest = manifest(&[("contract.pdf", "application/octet-stream")]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("contract.pdf", b"%PDF-1.7"),
            ("META-INF/manifest.xml", manifest.as_bytes()),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);

        assert_eq!(extract_original(&archive).unwrap().mime_type, MimeType::PDF);
    }

    #[test]
    fn cades_signature_with_asic_manifest() {
        let manifest = asic_manifest(&["second.txt"]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("first.txt", b"one"),
            ("second.txt", b"two"),
            ("META-INF/ASiCManifest001.xml", manifest.as_bytes()),
            ("META-INF/signature001.p7s", b"\x30\x80"),
        ]);

        let document = extract_original(&archive).unwrap();

        assert_eq!(document.name, "second.txt");
        assert_eq!(document.mime_type, MimeType::TEXT);
    }

    #[test]
    fn cades_signature_without_asic_manifest() {
        let asics = "application/vnd.etsi.asic-s+zip";
        let archive = archive(&[
            ("mimetype", asics.as_bytes()),
            ("payload.txt", b"hello"),
            ("META-INF/signature.p7s", b"\x30\x80"),
        ]);

        assert_eq!(extract_original(&archive).unwrap().name, "payload.txt");
    }

    #[test]
    fn missing_signature() {
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("agenda.xml", b"<GeneralAgenda/>"),
            ("META-INF/manifest.xml", manifest(&[]).as_bytes()),
        ]);

        assert_eq!(error(&archive), ExtractError::NoSignature);
    }

    #[test]
    fn missing_documents() {
        let signature = xades(&["agenda.xml"]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);

        assert_eq!(error(&archive), ExtractError::NoDocuments);
    }

    #[test]
    fn no_document_is_signed() {
        let signature = xades(&["other.xml"]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("agenda.xml", b"<GeneralAgenda/>"),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);

        assert_eq!(error(&archive), ExtractError::NoSignedDocuments);
    }

    #[test]
    fn unsupported_archives() {
        assert_eq!(error(b"definitely not a zip"), ExtractError::FileNotFound);

        let without_meta_inf = archive(&[("mimetype", ASICE.as_bytes()), ("agenda.xml", b"<a/>")]);
        assert_eq!(error(&without_meta_inf), ExtractError::FileNotFound);

        let signature = xades(&["agenda.xml"]);
        let office = archive(&[
            ("mimetype", b"application/vnd.oasis.opendocument.text"),
            ("agenda.xml", b"<a/>"),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);
        assert_eq!(error(&office), ExtractError::FileNotFound);
        assert_eq!(ExtractError::FileNotFound.title(), "Unsupported file");
    }

    #[test]
    fn oversized_entries_are_rejected() {
        let signature = xades(&["agenda.xml"]);
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("agenda.xml", b"<GeneralAgenda/>"),
            ("META-INF/signatures001.xml", signature.as_bytes()),
        ]);
        let largest = signature.len() as u64;

        assert_matches!(
            AsicContainer::open_with_limit(&archive, largest - 1).unwrap_err().error,
            ExtractError::FileNotFound
        );
        let container = AsicContainer::open_with_limit(&archive, largest).unwrap();
        assert_eq!(container.original_document().unwrap().name, "agenda.xml");
    }

    #[test]
    fn unparsable_signature() {
        let archive = archive(&[
            ("mimetype", ASICE.as_bytes()),
            ("agenda.xml", b"<GeneralAgenda/>"),
            ("META-INF/signatures001.xml", b"<unterminated"),
        ]);

        assert_eq!(error(&archive), ExtractError::FileNotFound);
    }
}
