//! Reference catalog entries used to label aggregation buckets.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;
use crate::domain::transaction::Transaction;

pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";
pub const NO_PROVIDER_LABEL: &str = "No provider";
pub const NO_DIVISION_LABEL: &str = "No division";
pub const PATH_SEPARATOR: &str = " > ";

/// Which side of the books a category or concept carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Income,
    Expense,
    #[serde(alias = "both", alias = "ambos")]
    Mixed,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReferenceKind::Income => "Income",
            ReferenceKind::Expense => "Expense",
            ReferenceKind::Mixed => "Mixed",
        };
        f.write_str(label)
    }
}

/// One row of a category, concept, subconcept, or provider table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<ReferenceKind>,
    #[serde(default, alias = "generalId")]
    pub general_id: Option<Uuid>,
    #[serde(default, alias = "conceptId")]
    pub concept_id: Option<Uuid>,
}

impl ReferenceEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: None,
            general_id: None,
            concept_id: None,
        }
    }

    pub fn with_kind(mut self, kind: ReferenceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn under_general(mut self, general_id: Uuid) -> Self {
        self.general_id = Some(general_id);
        self
    }

    pub fn under_concept(mut self, concept_id: Uuid) -> Self {
        self.concept_id = Some(concept_id);
        self
    }

    pub fn is_mixed(&self) -> bool {
        self.kind == Some(ReferenceKind::Mixed)
    }
}

impl Identifiable for ReferenceEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for ReferenceEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Snapshot of every lookup table the aggregator labels buckets with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<ReferenceEntry>,
    #[serde(default)]
    pub concepts: Vec<ReferenceEntry>,
    #[serde(default)]
    pub subconcepts: Vec<ReferenceEntry>,
    #[serde(default)]
    pub providers: Vec<ReferenceEntry>,
}

impl Catalog {
    pub fn category(&self, id: Uuid) -> Option<&ReferenceEntry> {
        find_by_id(&self.categories, id)
    }

    pub fn concept(&self, id: Uuid) -> Option<&ReferenceEntry> {
        find_by_id(&self.concepts, id)
    }

    pub fn subconcept(&self, id: Uuid) -> Option<&ReferenceEntry> {
        find_by_id(&self.subconcepts, id)
    }

    pub fn provider(&self, id: Uuid) -> Option<&ReferenceEntry> {
        find_by_id(&self.providers, id)
    }

    pub fn category_label(&self, id: Option<Uuid>) -> String {
        label(id, |id| self.category(id))
    }

    pub fn concept_label(&self, id: Option<Uuid>) -> String {
        label(id, |id| self.concept(id))
    }

    pub fn subconcept_label(&self, id: Option<Uuid>) -> String {
        label(id, |id| self.subconcept(id))
    }

    pub fn provider_label(&self, id: Option<Uuid>) -> String {
        match id {
            Some(id) => self
                .provider(id)
                .map(|entry| entry.name.clone())
                .unwrap_or_else(|| id.to_string()),
            None => NO_PROVIDER_LABEL.to_string(),
        }
    }

    /// Full `category > concept > subconcept` path for a transaction.
    pub fn hierarchy_path(&self, txn: &Transaction) -> String {
        [
            self.category_label(txn.general_id),
            self.concept_label(txn.concept_id),
            self.subconcept_label(txn.subconcept_id),
        ]
        .join(PATH_SEPARATOR)
    }

    /// True when the category or concept is tagged as carrying both income and expense.
    pub fn is_mixed_pair(&self, general_id: Option<Uuid>, concept_id: Option<Uuid>) -> bool {
        let category_mixed = general_id
            .and_then(|id| self.category(id))
            .is_some_and(ReferenceEntry::is_mixed);
        let concept_mixed = concept_id
            .and_then(|id| self.concept(id))
            .is_some_and(ReferenceEntry::is_mixed);
        category_mixed || concept_mixed
    }
}

fn find_by_id<T: Identifiable>(entries: &[T], id: Uuid) -> Option<&T> {
    entries.iter().find(|entry| entry.id() == id)
}

fn label<'a, F>(id: Option<Uuid>, lookup: F) -> String
where
    F: Fn(Uuid) -> Option<&'a ReferenceEntry>,
{
    match id {
        Some(id) => lookup(id)
            .map(|entry| entry.name().to_string())
            .unwrap_or_else(|| id.to_string()),
        None => UNCATEGORIZED_LABEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn hierarchy_path_falls_back_for_missing_levels() {
        let dues = ReferenceEntry::new("Dues").with_kind(ReferenceKind::Mixed);
        let monthly = ReferenceEntry::new("Monthly").under_general(dues.id);
        let catalog = Catalog {
            categories: vec![dues.clone()],
            concepts: vec![monthly.clone()],
            ..Catalog::default()
        };
        let txn = Transaction::income(Decimal::from(10), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
            .with_hierarchy(Some(dues.id), Some(monthly.id), None);
        assert_eq!(catalog.hierarchy_path(&txn), "Dues > Monthly > Uncategorized");
        assert!(catalog.is_mixed_pair(Some(dues.id), None));
        assert!(!catalog.is_mixed_pair(None, Some(monthly.id)));
    }

    #[test]
    fn mixed_kind_accepts_legacy_aliases() {
        let kind: ReferenceKind = serde_json::from_str("\"ambos\"").unwrap();
        assert_eq!(kind, ReferenceKind::Mixed);
        let kind: ReferenceKind = serde_json::from_str("\"both\"").unwrap();
        assert_eq!(kind, ReferenceKind::Mixed);
    }
}
