//! Candidate set: books pending one batch submission
//!
//! Invariants:
//! - at most one candidate per catalog id; re-adding a catalog book is a no-op
//! - custom entries are never deduplicated by content
//! - `is_custom` is true exactly when there is no catalog id
//! - temp ids are fresh UUIDs, never reused and never sent to the API
//!
//! Every mutation happens behind `&mut self` and completes before returning,
//! so observers holding a [`CandidateSnapshot`] only ever see whole states.

use crate::catalog::{self, canonical_key, BookFilter, Classified};
use crate::custom_entry::{self, CustomBookDraft, CustomBookForm};
use crate::error::ValidationError;
use crate::preset::{self, ExpansionKey, PresetExpansion};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use tutor_common::models::CustomBook;
use tutor_common::{CatalogBook, CatalogId, Preset, PresetBookRef, PresetId};
use uuid::Uuid;

/// Session-local candidate key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TempId(Uuid);

impl TempId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TempId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a candidate came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CandidateOrigin {
    Catalog,
    Preset { preset_id: PresetId },
    Custom,
}

/// A book pending submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub temp_id: TempId,
    pub catalog_id: Option<CatalogId>,
    pub subject: String,
    pub level: String,
    pub name: String,
    pub duration_hours: f64,
    pub is_custom: bool,
    pub origin: CandidateOrigin,
}

impl Candidate {
    pub fn from_catalog(book: &CatalogBook) -> Self {
        Self {
            temp_id: TempId::new(),
            catalog_id: Some(book.id),
            subject: book.subject.clone(),
            level: book.level.clone(),
            name: book.name.clone(),
            duration_hours: book.duration_hours,
            is_custom: false,
            origin: CandidateOrigin::Catalog,
        }
    }

    pub fn from_preset_ref(preset_id: PresetId, book: &PresetBookRef) -> Self {
        if book.is_from_catalog != book.catalog_id.is_some() {
            debug!(
                preset_id,
                name = %book.name,
                is_from_catalog = book.is_from_catalog,
                catalog_id = ?book.catalog_id,
                "Preset entry flag disagrees with its catalog id, using the id"
            );
        }
        Self {
            temp_id: TempId::new(),
            catalog_id: book.catalog_id,
            subject: book.subject.clone(),
            level: book.level.clone(),
            name: book.name.clone(),
            duration_hours: book.duration_hours.max(0.0),
            is_custom: book.catalog_id.is_none(),
            origin: CandidateOrigin::Preset { preset_id },
        }
    }

    pub fn from_custom(draft: CustomBookDraft) -> Self {
        Self {
            temp_id: TempId::new(),
            catalog_id: None,
            subject: draft.subject,
            level: draft.level,
            name: draft.name,
            duration_hours: draft.duration_hours,
            is_custom: true,
            origin: CandidateOrigin::Custom,
        }
    }

    /// Key used when re-expanding presets; hand-entered books have none
    pub fn expansion_key(&self) -> Option<ExpansionKey> {
        match (self.catalog_id, &self.origin) {
            (Some(id), _) => Some(ExpansionKey::Catalog(id)),
            (None, CandidateOrigin::Preset { preset_id }) => Some(ExpansionKey::PresetLocal {
                preset_id: *preset_id,
                name: self.name.clone(),
            }),
            (None, _) => None,
        }
    }

    pub fn to_custom_book(&self) -> CustomBook {
        CustomBook {
            subject: self.subject.clone(),
            level: self.level.clone(),
            name: self.name.clone(),
            duration_hours: self.duration_hours,
        }
    }
}

impl Classified for Candidate {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn level(&self) -> &str {
        &self.level
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Result of adding a catalog book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogAdd {
    Added(TempId),
    /// The book was already a candidate under this temp id
    AlreadyPresent(TempId),
}

/// Immutable view of the set at one revision
#[derive(Debug, Clone)]
pub struct CandidateSnapshot {
    pub revision: u64,
    pub candidates: Arc<[Candidate]>,
}

impl CandidateSnapshot {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// The working set of candidates
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    items: Vec<Candidate>,
    revision: u64,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.items
    }

    pub fn get(&self, temp_id: TempId) -> Option<&Candidate> {
        self.items.iter().find(|c| c.temp_id == temp_id)
    }

    /// Bumped on every change that altered the set
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contains_catalog(&self, id: CatalogId) -> bool {
        self.items.iter().any(|c| c.catalog_id == Some(id))
    }

    pub fn contains_key(&self, key: &ExpansionKey) -> bool {
        match key {
            ExpansionKey::Catalog(id) => self.contains_catalog(*id),
            ExpansionKey::PresetLocal { .. } => self
                .items
                .iter()
                .any(|c| c.expansion_key().as_ref() == Some(key)),
        }
    }

    pub fn add_from_catalog(&mut self, book: &CatalogBook) -> CatalogAdd {
        if let Some(existing) = self.items.iter().find(|c| c.catalog_id == Some(book.id)) {
            debug!(catalog_id = book.id, "Catalog book already a candidate");
            return CatalogAdd::AlreadyPresent(existing.temp_id);
        }
        let candidate = Candidate::from_catalog(book);
        let temp_id = candidate.temp_id;
        self.push_all(vec![candidate]);
        CatalogAdd::Added(temp_id)
    }

    /// Append the preset's books that are not already present, in preset order
    pub fn add_from_preset(&mut self, preset: &Preset) -> PresetExpansion {
        if preset.books.is_empty() {
            debug!(preset_id = preset.id, "Preset has no books");
            return PresetExpansion::EmptyPreset;
        }

        let expansion = preset::expand(preset, self);
        if expansion.candidates.is_empty() {
            debug!(preset_id = preset.id, skipped = expansion.skipped, "Preset adds nothing new");
            return PresetExpansion::NothingNew {
                skipped: expansion.skipped,
            };
        }

        let added: Vec<TempId> = expansion.candidates.iter().map(|c| c.temp_id).collect();
        self.push_all(expansion.candidates);
        PresetExpansion::Added {
            added,
            skipped: expansion.skipped,
        }
    }

    /// Validate a form and append it as a new custom candidate
    pub fn add_custom(&mut self, form: &CustomBookForm) -> Result<TempId, ValidationError> {
        let draft = custom_entry::build(form)?;
        let candidate = Candidate::from_custom(draft);
        let temp_id = candidate.temp_id;
        self.push_all(vec![candidate]);
        Ok(temp_id)
    }

    /// Remove by temp id; absent ids are ignored
    pub fn remove(&mut self, temp_id: TempId) -> Option<Candidate> {
        let idx = self.items.iter().position(|c| c.temp_id == temp_id)?;
        self.revision += 1;
        Some(self.items.remove(idx))
    }

    pub fn filter(&self, predicate: &BookFilter) -> Vec<&Candidate> {
        catalog::filter(&self.items, predicate)
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.revision += 1;
        }
    }

    pub fn snapshot(&self) -> CandidateSnapshot {
        CandidateSnapshot {
            revision: self.revision,
            candidates: self.items.clone().into(),
        }
    }

    /// Candidates ordered by canonical level, then name
    pub fn sorted_for_display(&self, level_order: &[String]) -> Vec<&Candidate> {
        let mut sorted: Vec<&Candidate> = self.items.iter().collect();
        sorted.sort_by(|a, b| {
            canonical_key(level_order, &a.level)
                .cmp(&canonical_key(level_order, &b.level))
                .then_with(|| a.name.cmp(&b.name))
        });
        sorted
    }

    fn push_all(&mut self, candidates: Vec<Candidate>) {
        self.items.extend(candidates);
        self.revision += 1;
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
