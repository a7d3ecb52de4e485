//! Draw records and the dataset they are aggregated into.

use serde::Serialize;

use crate::date::DrawDate;

/// One normalized outcome as reported for a single date, before it is
/// stamped with that date.
///
/// Only [`DrawEntry::new`] builds one, so a value is never blank and a
/// position is never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawEntry {
    value: String,
    position: u32,
    jurisdiction: Option<String>,
    modality: Option<String>,
}

impl DrawEntry {
    /// Build an entry, returning `None` when the value is blank or the
    /// position is zero.
    pub fn new(
        value: impl Into<String>,
        position: u32,
        jurisdiction: Option<String>,
        modality: Option<String>,
    ) -> Option<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() || position == 0 {
            return None;
        }
        Some(Self {
            value,
            position,
            jurisdiction: non_blank(jurisdiction),
            modality: non_blank(modality),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// 1 is the head.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn jurisdiction(&self) -> Option<&str> {
        self.jurisdiction.as_deref()
    }

    pub fn modality(&self) -> Option<&str> {
        self.modality.as_deref()
    }
}

fn non_blank(label: Option<String>) -> Option<String> {
    label
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A draw outcome at one position on one date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DrawRecord {
    value: String,
    position: u32,
    jurisdiction: Option<String>,
    modality: Option<String>,
    date: DrawDate,
}

impl DrawRecord {
    pub fn stamp(entry: DrawEntry, date: DrawDate) -> Self {
        Self {
            value: entry.value,
            position: entry.position,
            jurisdiction: entry.jurisdiction,
            modality: entry.modality,
            date,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn jurisdiction(&self) -> Option<&str> {
        self.jurisdiction.as_deref()
    }

    pub fn modality(&self) -> Option<&str> {
        self.modality.as_deref()
    }

    pub fn date(&self) -> DrawDate {
        self.date
    }

    pub fn pair(&self) -> String {
        crate::pair::pair_key(&self.value)
    }
}

/// Everything one date's retrieval produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrawSet {
    pub entries: Vec<DrawEntry>,
}

impl DrawSet {
    pub fn new(entries: Vec<DrawEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Jurisdiction/modality filter applied to a dataset. `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub jurisdiction: Option<String>,
    pub modality: Option<String>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.jurisdiction.is_none() && self.modality.is_none()
    }

    pub fn matches(&self, record: &DrawRecord) -> bool {
        let by = |want: &Option<String>, have: Option<&str>| match want {
            Some(w) => have == Some(w.as_str()),
            None => true,
        };
        by(&self.jurisdiction, record.jurisdiction()) && by(&self.modality, record.modality())
    }
}

/// The union of draw records across every queried date.
///
/// Built once by [`merge`](crate::merge::merge) and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedDataset {
    records: Vec<DrawRecord>,
}

impl AggregatedDataset {
    pub fn from_records(records: Vec<DrawRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct dates that contributed records, ascending.
    pub fn dates(&self) -> Vec<DrawDate> {
        let mut dates: Vec<DrawDate> = self.records.iter().map(|r| r.date()).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Distinct jurisdiction labels in first-seen order.
    pub fn jurisdictions(&self) -> Vec<&str> {
        distinct(self.records.iter().filter_map(|r| r.jurisdiction()))
    }

    /// Distinct modality labels in first-seen order.
    pub fn modalities(&self) -> Vec<&str> {
        distinct(self.records.iter().filter_map(|r| r.modality()))
    }

    pub fn filter(&self, filter: &RecordFilter) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect(),
        }
    }
}

fn distinct<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for label in labels {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen
}
