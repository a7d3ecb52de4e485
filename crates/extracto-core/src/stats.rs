//! Frequency statistics over an aggregated dataset.
//!
//! Every view is built from the same primitive, [`FrequencyTable::tally`]:
//! group a slice of records by key, count each group, note the positions and
//! dates it was seen at, then rank by count (descending) with the key as a
//! lexical tie-break. Least-frequent is the same ranking read backwards.
//!
//! Three slicings are offered:
//!
//! - per position: one slice for every position present in the dataset
//! - per range: the fixed head / top 5 / top 10 / top 20 position ranges
//! - global: the whole dataset, keyed both by pair and by raw value

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::date::DrawDate;
use crate::pair::pair_key;
use crate::record::{AggregatedDataset, DrawRecord};

/// Default length of ranked lists.
pub const TOP_N: usize = 10;
/// Length of the ranked lists shown on range cards.
pub const CARD_TOP_N: usize = 5;

/// What a record is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// The final two digits of the value.
    Pair,
    /// The value as reported.
    Value,
}

impl KeyKind {
    fn key_of(self, record: &DrawRecord) -> String {
        match self {
            Self::Pair => pair_key(record.value()),
            Self::Value => record.value().to_string(),
        }
    }
}

/// Aggregated count for one key within a slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyStat {
    pub key: String,
    pub count: usize,
    pub positions: BTreeSet<u32>,
    pub dates: BTreeSet<DrawDate>,
    /// `count / slice total * 100`, or 0 for an empty slice.
    pub percentage: f64,
}

impl FrequencyStat {
    fn new(key: String) -> Self {
        Self {
            key,
            count: 0,
            positions: BTreeSet::new(),
            dates: BTreeSet::new(),
            percentage: 0.0,
        }
    }

    /// Most recent date the key was seen on. Informational only.
    pub fn last_seen(&self) -> Option<DrawDate> {
        self.dates.last().copied()
    }
}

/// Ranked frequencies for one slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    /// Number of records in the slice.
    pub total: usize,
    ranked: Vec<FrequencyStat>,
}

impl FrequencyTable {
    /// Group `records` by `kind` and rank the groups.
    pub fn tally<'a, I>(records: I, kind: KeyKind) -> Self
    where
        I: IntoIterator<Item = &'a DrawRecord>,
    {
        let mut groups: HashMap<String, FrequencyStat> = HashMap::new();
        let mut total = 0usize;

        for record in records {
            total += 1;
            let key = kind.key_of(record);
            let stat = groups
                .entry(key)
                .or_insert_with_key(|k| FrequencyStat::new(k.clone()));
            stat.count += 1;
            stat.positions.insert(record.position());
            stat.dates.insert(record.date());
        }

        let mut ranked: Vec<FrequencyStat> = groups.into_values().collect();
        for stat in &mut ranked {
            stat.percentage = percentage(stat.count, total);
        }
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

        Self { total, ranked }
    }

    /// The full ranking, most frequent first.
    pub fn ranked(&self) -> &[FrequencyStat] {
        &self.ranked
    }

    pub fn most_frequent(&self, n: usize) -> &[FrequencyStat] {
        &self.ranked[..n.min(self.ranked.len())]
    }

    /// The ranking reversed, least frequent first.
    pub fn least_frequent(&self, n: usize) -> Vec<&FrequencyStat> {
        self.ranked.iter().rev().take(n).collect()
    }

    pub fn get(&self, key: &str) -> Option<&FrequencyStat> {
        self.ranked.iter().find(|s| s.key == key)
    }

    pub fn distinct_keys(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// The fixed position ranges bet on in quiniela.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PositionRange {
    Head,
    Top5,
    Top10,
    Top20,
}

impl PositionRange {
    pub const ALL: [PositionRange; 4] = [Self::Head, Self::Top5, Self::Top10, Self::Top20];

    pub fn positions(&self) -> RangeInclusive<u32> {
        match self {
            Self::Head => 1..=1,
            Self::Top5 => 1..=5,
            Self::Top10 => 1..=10,
            Self::Top20 => 1..=20,
        }
    }

    pub fn contains(&self, position: u32) -> bool {
        self.positions().contains(&position)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Head => "A la cabeza",
            Self::Top5 => "A los 5",
            Self::Top10 => "A los 10",
            Self::Top20 => "A los 20",
        }
    }

    /// Positions covered, as shown on cards (e.g. "1° - 5°").
    pub fn label(&self) -> String {
        let r = self.positions();
        if r.start() == r.end() {
            format!("{}°", r.start())
        } else {
            format!("{}° - {}°", r.start(), r.end())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSlice {
    pub position: u32,
    pub table: FrequencyTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSlice {
    pub range: PositionRange,
    pub table: FrequencyTable,
}

/// Whole-dataset views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStats {
    pub pairs: FrequencyTable,
    pub values: FrequencyTable,
}

impl GlobalStats {
    pub fn total(&self) -> usize {
        self.values.total
    }

    pub fn unique_values(&self) -> usize {
        self.values.distinct_keys()
    }

    pub fn unique_pairs(&self) -> usize {
        self.pairs.distinct_keys()
    }
}

/// Read-only frequency analysis over a dataset.
pub struct FrequencyAnalyzer<'a> {
    dataset: &'a AggregatedDataset,
}

impl<'a> FrequencyAnalyzer<'a> {
    pub fn new(dataset: &'a AggregatedDataset) -> Self {
        Self { dataset }
    }

    /// Pair frequencies at each position present, ascending by position.
    pub fn by_position(&self) -> Vec<PositionSlice> {
        let positions: BTreeSet<u32> = self.dataset.records().iter().map(|r| r.position()).collect();
        positions
            .into_iter()
            .map(|position| self.position(position))
            .collect()
    }

    /// Pair frequencies at a single position.
    pub fn position(&self, position: u32) -> PositionSlice {
        let records = self.dataset.records().iter().filter(|r| r.position() == position);
        PositionSlice {
            position,
            table: FrequencyTable::tally(records, KeyKind::Pair),
        }
    }

    /// Pair frequencies for every fixed range, head first.
    pub fn by_range(&self) -> Vec<RangeSlice> {
        PositionRange::ALL.iter().map(|r| self.range(*r)).collect()
    }

    pub fn range(&self, range: PositionRange) -> RangeSlice {
        let records = self
            .dataset
            .records()
            .iter()
            .filter(|r| range.contains(r.position()));
        RangeSlice {
            range,
            table: FrequencyTable::tally(records, KeyKind::Pair),
        }
    }

    pub fn global(&self) -> GlobalStats {
        let records = self.dataset.records();
        GlobalStats {
            pairs: FrequencyTable::tally(records, KeyKind::Pair),
            values: FrequencyTable::tally(records, KeyKind::Value),
        }
    }
}
