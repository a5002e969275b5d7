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

//! This crate prepares electronic forms for signing and checks them on the way back.
//!
//! An electronic form is an XML document governed by an XSD schema and presented to the signer
//! through an XSLT transformation.  Before signing, the document is wrapped into an *XML Data
//! Container* which binds it to that schema and transformation, either by embedding them or by
//! referencing them together with their digests.
//!
//! # Details
//!
//! * [`FormDescriptor`] -- the schema and transformation pair governing a form, together with
//!   the container options.
//! * [`ResourceResolver`] -- fetches the schema and transformation of a form.  The form
//!   identifier is routed to one of the [`FormProfile`]s by [`resolver_for`], and a whole inbound
//!   document by [`resolve_document`].  Remote resources are fetched with a [`ResourceFetcher`],
//!   e.g. the blocking [`ReqwestFetcher`] wrapped in a [`CachingFetcher`].
//! * [`build`] -- wraps a form document into a container.  Wrapping a container again yields the
//!   same bytes.
//! * [`XdcValidator`] -- checks an inbound document against the container schema, the recorded
//!   digests and the form's schema.
//! * [`ContainerInfo`] & [`unwrap_payload`] -- read an existing container.
//!
//! # Examples
//!
//! ```no_run
//! use bh_eform::{
//!     build, resolver_for, CachingFetcher, ReqwestFetcher, ResolveRequest, ResolverConfig,
//!     ResourceResolver, XdcValidator,
//! };
//! use bh_xml_utils::parse_str;
//!
//! let fetcher = CachingFetcher::new(ReqwestFetcher::default());
//! let config = ResolverConfig::default();
//!
//! let resolver = resolver_for(
//!     &fetcher,
//!     &config,
//!     "http://data.gov.sk/doc/eform/App.GeneralAgenda/1.9",
//! )
//! .expect("known form");
//! let descriptor = resolver.find_resources(&ResolveRequest::default()).unwrap();
//!
//! let form = parse_str(
//!     r#"<GeneralAgenda xmlns="http://data.gov.sk/doc/eform/App.GeneralAgenda/1.9">
//!   <subject>Hello</subject><text>World</text>
//! </GeneralAgenda>"#,
//! )
//! .unwrap();
//! let container = build(&descriptor, "agenda.xml", &form).unwrap();
//! assert_eq!(container.filename, "agenda.xdcf");
//!
//! XdcValidator::default()
//!     .validate(&descriptor, &container.content, &container.mime_type)
//!     .unwrap();
//! ```

mod builder;
mod container;
mod descriptor;
mod error;
mod fetch;
mod resolver;
mod validator;

pub use builder::{build, container_filename, BuiltContainer};
pub use container::{is_container, unwrap_payload, ContainerInfo};
pub use descriptor::{
    version_from_identifier, FormDescriptor, XsltParams, DEFAULT_VERSION, XDC_EXTENSION,
    XDC_NAMESPACE, XSLT_MEDIA_TYPE,
};
pub use error::{BuildError, ResolveError, ResourceKind, Result, ValidationError};
pub use fetch::{CachingFetcher, ReqwestFetcher, ResourceFetcher, DEFAULT_CACHE_TTL};
pub use resolver::{
    fs_form_id, read_entries, resolve_document, resolver_for, select_xslt, DirectResolver,
    FormProfile, FormResolver, FsResolver, ManifestEntry, ManifestResolver, MediaDestination,
    ResolveRequest, ResolverConfig, ResourceResolver, SelectionCriteria,
};
pub use validator::{XdcValidator, XDC_SCHEMA};
