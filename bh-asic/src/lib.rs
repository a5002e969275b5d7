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

//! This crate extracts the original signed document out of an ASiC signature container.
//!
//! An ASiC container is a ZIP archive holding the signed documents next to a `META-INF/`
//! directory with the XAdES or CAdES signatures.  Only containers with exactly one signed
//! document are supported.  When the name of that document says little about its type (plain
//! XML or an unknown extension), the type declared in `META-INF/manifest.xml` is used instead.
//!
//! # Examples
//!
//! ```no_run
//! let archive = std::fs::read("agenda.asice").unwrap();
//!
//! let document = bh_asic::extract_original(&archive).unwrap();
//! println!("{} ({})", document.name, document.mime_type);
//! ```

mod container;
mod error;

pub use container::{extract_original, AsicContainer, OriginalDocument, DEFAULT_MAX_ENTRY_SIZE};
pub use error::{ExtractError, Result};
