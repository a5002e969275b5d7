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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate provides the XML building blocks shared by TBTL's electronic form crates.
//!
//! # Details
//!
//! * [`Element`] & [`Node`] -- an owned, order-preserving XML tree.  Trees are parsed with
//!   [`parse_document`] and serialized with [`to_xml_document`] or [`to_xml_string`], which
//!   write through [`quick_xml::Writer`].  Serializing a parsed tree is a fixed point, i.e.
//!   parsing the output and serializing again yields the same bytes.
//! * [`compute_digest`] -- the canonicalize-then-hash digest used in XML Data Containers, over a
//!   closed set of [`CanonicalizationMethod`]s and [`DigestAlgorithm`]s.
//! * [`validate_against_xsd`] -- XSD validation of serialized XML content.
//! * [`output_destination_type`] -- static inspection of the `xsl:output` method of an XSLT
//!   transformation.
//! * [`MimeType`] -- the MIME types relevant for signed documents.
//!
//! # Examples
//!
//! ```no_run
//! use bh_xml_utils::{compute_digest, CanonicalizationMethod, DigestAlgorithm};
//!
//! let schema = br#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#;
//! let digest = compute_digest(
//!     schema,
//!     CanonicalizationMethod::Inclusive,
//!     DigestAlgorithm::Sha256,
//! )
//! .unwrap();
//! println!("DigestValue=\"{digest}\"");
//! ```

mod algorithm;
mod digest;
mod error;
mod mime;
mod parse;
mod schema;
mod transformation;
mod tree;
mod writer;

pub use algorithm::{CanonicalizationMethod, DigestAlgorithm};
pub use digest::{canonicalize, compute_digest, compute_digest_with};
pub use error::{Result, XmlError};
pub use mime::MimeType;
pub use parse::{parse_document, parse_str, strip_bom};
pub use schema::validate_against_xsd;
pub use transformation::{output_destination_type, DestinationType, XSLT_NAMESPACE};
pub use tree::{Element, Node};
pub use writer::{to_xml_document, to_xml_string};
