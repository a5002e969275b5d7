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

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bherror::{traits::ForeignError as _, Error};
use xml_c14n::{canonicalize_xml, CanonicalizationOptions};

use crate::{parse::strip_bom, CanonicalizationMethod, DigestAlgorithm, Result, XmlError};

/// Canonicalizes the XML `content` under the given `method`.
///
/// A leading byte order mark is ignored.
pub fn canonicalize(content: &[u8], method: CanonicalizationMethod) -> Result<String> {
    let content = std::str::from_utf8(strip_bom(content)).foreign_err(|| XmlError::Parse)?;

    let options = CanonicalizationOptions {
        mode: method.mode(),
        keep_comments: method.keeps_comments(),
        inclusive_ns_prefixes: vec![],
    };

    canonicalize_xml(content, options).map_err(|error| {
        Error::root(XmlError::Canonicalization).ctx(format!("{method}: {error}"))
    })
}

/// Computes `base64(hash(canonicalize(content)))`, the value of the `DigestValue` attribute of
/// the XML Data Container references.
///
/// The result depends only on the arguments.
pub fn compute_digest(
    content: &[u8],
    method: CanonicalizationMethod,
    algorithm: DigestAlgorithm,
) -> Result<String> {
    let canonical = canonicalize(content, method)?;
    let digest = algorithm.hash(canonical.as_bytes());

    Ok(STANDARD.encode(digest))
}

/// Same as [`compute_digest`], but with the canonicalization method and the digest algorithm given
/// by their identifiers.
///
/// Fails with [`XmlError::UnsupportedAlgorithm`] if either identifier is unknown.
pub fn compute_digest_with(content: &[u8], method: &str, algorithm: &str) -> Result<String> {
    compute_digest(content, method.parse()?, algorithm.parse()?)
}
