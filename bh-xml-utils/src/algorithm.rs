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

//! Canonicalization methods and digest algorithms of the XML Data Container digests.

use std::str::FromStr;

use bherror::Error;
use xml_c14n::CanonicalizationMode;

use crate::XmlError;

const C14N: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
const C14N_WITH_COMMENTS: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments";
const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
const EXC_C14N_WITH_COMMENTS: &str = "http://www.w3.org/2001/10/xml-exc-c14n#WithComments";
const C14N11: &str = "http://www.w3.org/2006/12/xml-c14n11";
const C14N11_WITH_COMMENTS: &str = "http://www.w3.org/2006/12/xml-c14n11#WithComments";

const SHA256_URI: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
const SHA384_URI: &str = "http://www.w3.org/2001/04/xmldsig-more#sha384";
const SHA512_URI: &str = "http://www.w3.org/2001/04/xmlenc#sha512";

const SHA256_OID: &str = "2.16.840.1.101.3.4.2.1";
const SHA384_OID: &str = "2.16.840.1.101.3.4.2.2";
const SHA512_OID: &str = "2.16.840.1.101.3.4.2.3";

const URN_OID_PREFIX: &str = "urn:oid:";

/// XML canonicalization method, identified by its XML-DSig algorithm URI.
///
/// The default is inclusive Canonical XML 1.0 without comments.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalizationMethod {
    /// Canonical XML 1.0.
    #[default]
    Inclusive,
    /// Canonical XML 1.0 with comments.
    InclusiveWithComments,
    /// Exclusive XML Canonicalization 1.0.
    Exclusive,
    /// Exclusive XML Canonicalization 1.0 with comments.
    ExclusiveWithComments,
    /// Canonical XML 1.1.
    Inclusive11,
    /// Canonical XML 1.1 with comments.
    Inclusive11WithComments,
}

impl CanonicalizationMethod {
    /// Returns the algorithm URI, as written into the `TransformAlgorithm` attribute.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => C14N,
            Self::InclusiveWithComments => C14N_WITH_COMMENTS,
            Self::Exclusive => EXC_C14N,
            Self::ExclusiveWithComments => EXC_C14N_WITH_COMMENTS,
            Self::Inclusive11 => C14N11,
            Self::Inclusive11WithComments => C14N11_WITH_COMMENTS,
        }
    }

    pub(crate) fn mode(&self) -> CanonicalizationMode {
        match self {
            Self::Inclusive | Self::InclusiveWithComments => CanonicalizationMode::Canonical1_0,
            Self::Exclusive | Self::ExclusiveWithComments => {
                CanonicalizationMode::ExclusiveCanonical1_0
            }
            Self::Inclusive11 | Self::Inclusive11WithComments => CanonicalizationMode::Canonical1_1,
        }
    }

    pub(crate) fn keeps_comments(&self) -> bool {
        match self {
            Self::InclusiveWithComments
            | Self::ExclusiveWithComments
            | Self::Inclusive11WithComments => true,
            Self::Inclusive | Self::Exclusive | Self::Inclusive11 => false,
        }
    }
}

impl FromStr for CanonicalizationMethod {
    type Err = Error<XmlError>;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            C14N => Ok(Self::Inclusive),
            C14N_WITH_COMMENTS => Ok(Self::InclusiveWithComments),
            EXC_C14N => Ok(Self::Exclusive),
            EXC_C14N_WITH_COMMENTS => Ok(Self::ExclusiveWithComments),
            C14N11 => Ok(Self::Inclusive11),
            C14N11_WITH_COMMENTS => Ok(Self::Inclusive11WithComments),
            other => Err(Error::root(XmlError::UnsupportedAlgorithm(other.to_owned()))),
        }
    }
}

impl std::fmt::Display for CanonicalizationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.uri())
    }
}

/// Hash algorithm of a container digest.
///
/// The default is `SHA-256`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// `SHA-256`.
    #[default]
    Sha256,
    /// `SHA-384`.
    Sha384,
    /// `SHA-512`.
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the dotted OID of the algorithm.
    pub fn oid(&self) -> &'static str {
        match self {
            Self::Sha256 => SHA256_OID,
            Self::Sha384 => SHA384_OID,
            Self::Sha512 => SHA512_OID,
        }
    }

    /// Returns the OID-namespaced identifier, as written into the `DigestMethod` attribute.
    ///
    /// E.g. `urn:oid:2.16.840.1.101.3.4.2.1` for `SHA-256`.
    pub fn urn_oid(&self) -> String {
        format!("{URN_OID_PREFIX}{}", self.oid())
    }

    /// Returns the XML-DSig algorithm URI.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Sha256 => SHA256_URI,
            Self::Sha384 => SHA384_URI,
            Self::Sha512 => SHA512_URI,
        }
    }

    /// Computes the digest of the `payload`.
    pub fn hash(&self, payload: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => openssl::sha::sha256(payload).to_vec(),
            Self::Sha384 => openssl::sha::sha384(payload).to_vec(),
            Self::Sha512 => openssl::sha::sha512(payload).to_vec(),
        }
    }
}

/// Accepts the algorithm name (`SHA256`, `sha-256`), its XML-DSig URI, its dotted OID or its
/// `urn:oid:` form.
impl FromStr for DigestAlgorithm {
    type Err = Error<XmlError>;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let value = value.strip_prefix(URN_OID_PREFIX).unwrap_or(value);

        match value.to_ascii_uppercase().replace('-', "").as_str() {
            "SHA256" => return Ok(Self::Sha256),
            "SHA384" => return Ok(Self::Sha384),
            "SHA512" => return Ok(Self::Sha512),
            _ => {}
        }

        match value {
            SHA256_URI | SHA256_OID => Ok(Self::Sha256),
            SHA384_URI | SHA384_OID => Ok(Self::Sha384),
            SHA512_URI | SHA512_OID => Ok(Self::Sha512),
            other => Err(Error::root(XmlError::UnsupportedAlgorithm(other.to_owned()))),
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => f.write_str("SHA256"),
            Self::Sha384 => f.write_str("SHA384"),
            Self::Sha512 => f.write_str("SHA512"),
        }
    }
}
