//! Catalog index and book filtering
//!
//! Filtering is stable: results keep the input order, never re-sort.
//! The same [`BookFilter`] applies to catalog books and to candidates
//! through the [`Classified`] trait.

use std::collections::{BTreeSet, HashMap};
use tracing::warn;
use tutor_common::{CatalogBook, CatalogId};

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Anything carrying subject / level / name labels
pub trait Classified {
    fn subject(&self) -> &str;
    fn level(&self) -> &str;
    fn name(&self) -> &str;
}

impl Classified for CatalogBook {
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

// ============================================================================
// FILTER
// ============================================================================

/// Subject / level / name predicate
///
/// Unset fields match everything. Empty strings count as unset, matching
/// how a cleared selection control reports itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Exact subject match
    pub subject: Option<String>,
    /// Exact level match
    pub level: Option<String>,
    /// Substring of the book name
    pub name_contains: Option<String>,
    /// Name matching is case-insensitive unless set
    pub case_sensitive: bool,
}

impl BookFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn name_contains(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into());
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn matches<T: Classified + ?Sized>(&self, item: &T) -> bool {
        if let Some(subject) = active(&self.subject) {
            if item.subject() != subject {
                return false;
            }
        }
        if let Some(level) = active(&self.level) {
            if item.level() != level {
                return false;
            }
        }
        if let Some(needle) = active(&self.name_contains) {
            let found = if self.case_sensitive {
                item.name().contains(needle)
            } else {
                item.name().to_lowercase().contains(&needle.to_lowercase())
            };
            if !found {
                return false;
            }
        }
        true
    }
}

fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Subsequence of `items` matching `filter`, in input order
pub fn filter<'a, T: Classified>(items: &'a [T], filter: &BookFilter) -> Vec<&'a T> {
    items.iter().filter(|item| filter.matches(*item)).collect()
}

/// Distinct non-empty subjects
pub fn unique_subjects<T: Classified>(items: &[T]) -> BTreeSet<String> {
    items
        .iter()
        .map(|item| item.subject())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct non-empty levels
pub fn unique_levels<T: Classified>(items: &[T]) -> BTreeSet<String> {
    items
        .iter()
        .map(|item| item.level())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sort key placing values listed in `order` first, in that order, then
/// everything else alphabetically
pub fn canonical_key<'a>(order: &[String], value: &'a str) -> (usize, &'a str) {
    let rank = order.iter().position(|o| o == value).unwrap_or(order.len());
    (rank, value)
}

// ============================================================================
// INDEX
// ============================================================================

/// Books of one level within a subject
#[derive(Debug, Clone, PartialEq)]
pub struct LevelGroup<'a> {
    pub level: String,
    pub books: Vec<&'a CatalogBook>,
}

/// Master catalog with lookups by id, subject and level
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    books: Vec<CatalogBook>,
    by_id: HashMap<CatalogId, usize>,
    by_subject: HashMap<String, Vec<usize>>,
    by_level: HashMap<String, Vec<usize>>,
}

impl CatalogIndex {
    /// Build the index; a repeated id keeps its first occurrence
    pub fn new(books: Vec<CatalogBook>) -> Self {
        let mut kept = Vec::with_capacity(books.len());
        let mut by_id = HashMap::with_capacity(books.len());
        let mut by_subject: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_level: HashMap<String, Vec<usize>> = HashMap::new();

        for book in books {
            if by_id.contains_key(&book.id) {
                warn!(id = book.id, name = %book.name, "Duplicate catalog id, keeping first entry");
                continue;
            }
            let idx = kept.len();
            by_id.insert(book.id, idx);
            by_subject.entry(book.subject.clone()).or_default().push(idx);
            by_level.entry(book.level.clone()).or_default().push(idx);
            kept.push(book);
        }

        Self {
            books: kept,
            by_id,
            by_subject,
            by_level,
        }
    }

    pub fn books(&self) -> &[CatalogBook] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: CatalogId) -> Option<&CatalogBook> {
        self.by_id.get(&id).map(|&idx| &self.books[idx])
    }

    pub fn by_subject(&self, subject: &str) -> Vec<&CatalogBook> {
        self.lookup(&self.by_subject, subject)
    }

    pub fn by_level(&self, level: &str) -> Vec<&CatalogBook> {
        self.lookup(&self.by_level, level)
    }

    fn lookup(&self, map: &HashMap<String, Vec<usize>>, key: &str) -> Vec<&CatalogBook> {
        map.get(key)
            .map(|indices| indices.iter().map(|&idx| &self.books[idx]).collect())
            .unwrap_or_default()
    }

    /// Stable filter over the whole catalog
    pub fn filter(&self, predicate: &BookFilter) -> Vec<&CatalogBook> {
        match active(&predicate.subject) {
            // Subject buckets hold ascending indices, so order is preserved
            Some(subject) => self
                .by_subject(subject)
                .into_iter()
                .filter(|book| predicate.matches(*book))
                .collect(),
            None => filter(&self.books, predicate),
        }
    }

    pub fn subjects(&self) -> BTreeSet<String> {
        unique_subjects(&self.books)
    }

    pub fn levels(&self) -> BTreeSet<String> {
        unique_levels(&self.books)
    }

    /// Subjects in canonical display order
    pub fn ordered_subjects(&self, order: &[String]) -> Vec<String> {
        let mut subjects: Vec<String> = self.subjects().into_iter().collect();
        subjects.sort_by(|a, b| canonical_key(order, a).cmp(&canonical_key(order, b)));
        subjects
    }

    /// Books of one subject grouped by level, optionally narrowed by a
    /// case-insensitive name search
    ///
    /// Levels follow `level_order`; books inside a level are sorted by name.
    pub fn grouped_by_level(
        &self,
        subject: &str,
        search: Option<&str>,
        level_order: &[String],
    ) -> Vec<LevelGroup<'_>> {
        let mut predicate = BookFilter::new().subject(subject);
        if let Some(needle) = search {
            predicate = predicate.name_contains(needle.trim());
        }

        let mut groups: Vec<LevelGroup<'_>> = Vec::new();
        for book in self.filter(&predicate) {
            match groups.iter_mut().find(|g| g.level == book.level) {
                Some(group) => group.books.push(book),
                None => groups.push(LevelGroup {
                    level: book.level.clone(),
                    books: vec![book],
                }),
            }
        }

        for group in &mut groups {
            group.books.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups.sort_by(|a, b| {
            canonical_key(level_order, &a.level).cmp(&canonical_key(level_order, &b.level))
        });
        groups
    }
}
