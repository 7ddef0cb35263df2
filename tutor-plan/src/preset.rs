//! Preset expansion
//!
//! Each preset entry gets an expansion key. Catalog-backed entries are keyed
//! by catalog id, so they collide with the same book added straight from the
//! catalog. Preset-only entries are keyed by `(preset id, name)`: expanding
//! the same preset twice does not duplicate them, while two presets with a
//! same-named preset-only book stay distinct.

use crate::candidates::{Candidate, CandidateSet, TempId};
use std::collections::HashSet;
use tracing::debug;
use tutor_common::{CatalogId, Preset, PresetBookRef, PresetId};

/// Identity of a preset entry for duplicate suppression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpansionKey {
    Catalog(CatalogId),
    PresetLocal { preset_id: PresetId, name: String },
}

impl ExpansionKey {
    pub fn for_ref(preset_id: PresetId, book: &PresetBookRef) -> Self {
        match book.catalog_id {
            Some(id) => ExpansionKey::Catalog(id),
            None => ExpansionKey::PresetLocal {
                preset_id,
                name: book.name.clone(),
            },
        }
    }
}

/// What adding a preset did to the candidate set
///
/// `NothingNew` and `EmptyPreset` both leave the set unchanged but are
/// reported separately: the first is a notice worth showing the user, the
/// second just means the preset is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetExpansion {
    Added { added: Vec<TempId>, skipped: usize },
    NothingNew { skipped: usize },
    EmptyPreset,
}

impl PresetExpansion {
    pub fn added_count(&self) -> usize {
        match self {
            PresetExpansion::Added { added, .. } => added.len(),
            _ => 0,
        }
    }

    pub fn is_nothing_new(&self) -> bool {
        matches!(self, PresetExpansion::NothingNew { .. })
    }
}

/// Candidates a preset would contribute to `existing`
#[derive(Debug, Clone)]
pub struct Expansion {
    pub candidates: Vec<Candidate>,
    /// Entries skipped because they were already present
    pub skipped: usize,
}

/// Expand a preset without touching the set
///
/// Entries repeated within the preset itself are also collapsed.
pub fn expand(preset: &Preset, existing: &CandidateSet) -> Expansion {
    let mut seen: HashSet<ExpansionKey> = HashSet::new();
    let mut candidates = Vec::new();
    let mut skipped = 0;

    for book in &preset.books {
        let key = ExpansionKey::for_ref(preset.id, book);
        if existing.contains_key(&key) || !seen.insert(key.clone()) {
            debug!(preset_id = preset.id, key = ?key, "Skipping preset entry already present");
            skipped += 1;
            continue;
        }
        candidates.push(Candidate::from_preset_ref(preset.id, book));
    }

    Expansion { candidates, skipped }
}

/// Presets offered for a subject, by name
pub fn presets_for_subject<'a>(presets: &'a [Preset], subject: &str) -> Vec<&'a Preset> {
    let mut matching: Vec<&Preset> = presets.iter().filter(|p| p.subject == subject).collect();
    matching.sort_by(|a, b| a.name.cmp(&b.name));
    matching
}
