//! Category buckets accumulated during dispatch.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::Category;

/// Filenames grouped by the category they were assigned.
///
/// Filled by the single fan-in loop of the dispatch engine and read-only
/// afterwards. Each bucket is kept sorted, so two result sets built from the
/// same outcomes in a different completion order compare equal.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResultSet {
    buckets: BTreeMap<Category, Vec<String>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one classified entry.
    pub fn insert(&mut self, category: Category, name: impl Into<String>) {
        let bucket = self.buckets.entry(category).or_default();
        let name = name.into();
        let pos = bucket.binary_search(&name).unwrap_or_else(|pos| pos);
        bucket.insert(pos, name);
    }

    /// Filenames in `category`, sorted.
    pub fn names(&self, category: Category) -> &[String] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self, category: Category) -> usize {
        self.names(category).len()
    }

    /// Number of classified entries across every category.
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn category_of(&self, name: &str) -> Option<Category> {
        self.buckets
            .iter()
            .find(|(_, names)| names.binary_search_by(|n| n.as_str().cmp(name)).is_ok())
            .map(|(category, _)| *category)
    }

    /// Non-empty buckets in category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        self.buckets
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(category, names)| (*category, names.as_slice()))
    }

    /// Entries placed in one of the two misclassified categories.
    pub fn misclassified_count(&self) -> usize {
        Category::MISCLASSIFIED
            .iter()
            .map(|category| self.count(*category))
            .sum()
    }
}
