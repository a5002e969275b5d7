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

/// Error type for extracting the original document out of an ASiC container.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum ExtractError {
    /// Error when the content is not an ASiC container.
    #[strum(to_string = "Unable to read the signature container")]
    FileNotFound,
    /// Error when the container holds no signature.
    #[strum(to_string = "Signature container contains no signature")]
    NoSignature,
    /// Error when the container holds no document.
    #[strum(to_string = "Signature container contains no document")]
    NoDocuments,
    /// Error when no document of the container is covered by a signature.
    #[strum(to_string = "Signature container contains no signed document")]
    NoSignedDocuments,
    /// Error when more than one document of the container is covered by a signature.
    #[strum(to_string = "Signature container contains more than one signed document")]
    MultipleOriginalDocumentsFound,
}

impl ExtractError {
    /// Short title of the error.
    pub fn title(&self) -> &'static str {
        match self {
            Self::FileNotFound => "Unsupported file",
            Self::MultipleOriginalDocumentsFound => "Unsupported visualization",
            _ => "Original document not found",
        }
    }
}

impl bherror::BhError for ExtractError {}

/// Type alias for [`bherror::Result`] types returned by the crate's API.
pub type Result<T> = bherror::Result<T, ExtractError>;
