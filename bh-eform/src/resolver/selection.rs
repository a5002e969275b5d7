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

//! Selection of a single transformation out of the manifest candidates.
//!
//! Every step is a pure function from the remaining candidates to the pruned candidates, in
//! source order.

use bh_xml_utils::DestinationType;

use super::manifest::{ManifestEntry, MediaDestination};

const DESTINATION_TYPE_PREFERENCE: [DestinationType; 3] = [
    DestinationType::Xhtml,
    DestinationType::Html,
    DestinationType::Txt,
];

const LANGUAGE_PREFERENCE: [&str; 2] = ["sk", "en"];

/// Caller-specified constraints on the selected transformation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCriteria<'a> {
    /// Required output format.
    pub destination_type: Option<DestinationType>,
    /// Required output language.
    pub language: Option<&'a str>,
    /// Required target environment.
    pub target: Option<&'a str>,
}

/// Selects exactly one transformation from the `candidates`, or [`None`] if the criteria
/// eliminate all of them.
///
/// 1. Entries not matching the caller's destination type, language and target are eliminated.
/// 2. A single survivor is returned as is.
/// 3. `sign` entries are preferred over `view` entries.
/// 4. XHTML is preferred over HTML, which is preferred over TXT.
/// 5. `sk` is preferred over `en`.
/// 6. The first remaining entry in source order is returned.
pub fn select_xslt(
    candidates: Vec<ManifestEntry>,
    criteria: &SelectionCriteria<'_>,
) -> Option<ManifestEntry> {
    let candidates = filter_by_criteria(candidates, criteria);
    tracing::debug!(remaining = candidates.len(), "filtered by caller criteria");

    if candidates.len() <= 1 {
        return candidates.into_iter().next();
    }

    let candidates = prefer_sign(candidates);
    let candidates = prefer_destination_type(candidates);
    let candidates = prefer_language(candidates);

    if candidates.len() > 1 {
        tracing::warn!(
            remaining = candidates.len(),
            "transformation selection is ambiguous, taking the first candidate"
        );
    }

    candidates.into_iter().next()
}

pub(crate) fn filter_by_criteria(
    candidates: Vec<ManifestEntry>,
    criteria: &SelectionCriteria<'_>,
) -> Vec<ManifestEntry> {
    candidates
        .into_iter()
        .filter(|entry| {
            criteria
                .destination_type
                .map_or(true, |expected| entry.destination_type == expected)
        })
        .filter(|entry| {
            criteria
                .language
                .map_or(true, |expected| entry.language.as_deref() == Some(expected))
        })
        .filter(|entry| {
            criteria
                .target
                .map_or(true, |expected| entry.target.as_deref() == Some(expected))
        })
        .collect()
}

pub(crate) fn prefer_sign(candidates: Vec<ManifestEntry>) -> Vec<ManifestEntry> {
    prefer(candidates, |entry| {
        entry.media_destination == MediaDestination::Sign
    })
}

pub(crate) fn prefer_destination_type(candidates: Vec<ManifestEntry>) -> Vec<ManifestEntry> {
    match DESTINATION_TYPE_PREFERENCE
        .into_iter()
        .find(|preferred| candidates.iter().any(|entry| entry.destination_type == *preferred))
    {
        Some(preferred) => keep(candidates, |entry| entry.destination_type == preferred),
        None => candidates,
    }
}

pub(crate) fn prefer_language(candidates: Vec<ManifestEntry>) -> Vec<ManifestEntry> {
    match LANGUAGE_PREFERENCE.into_iter().find(|preferred| {
        candidates
            .iter()
            .any(|entry| entry.language.as_deref() == Some(*preferred))
    }) {
        Some(preferred) => keep(candidates, |entry| {
            entry.language.as_deref() == Some(preferred)
        }),
        None => candidates,
    }
}

/// Keeps only the matching candidates if there are any, otherwise keeps all of them.
fn prefer<P>(candidates: Vec<ManifestEntry>, predicate: P) -> Vec<ManifestEntry>
where
    P: Fn(&ManifestEntry) -> bool,
{
    if candidates.iter().any(&predicate) {
        keep(candidates, predicate)
    } else {
        candidates
    }
}

fn keep<P>(candidates: Vec<ManifestEntry>, predicate: P) -> Vec<ManifestEntry>
where
    P: Fn(&ManifestEntry) -> bool,
{
    candidates.into_iter().filter(|entry| predicate(entry)).collect()
}
