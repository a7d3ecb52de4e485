//! Compact ranked summary handed to the advisory text generator.
//!
//! The generator only ever sees this summary, never the raw dataset, so it
//! stays small: a handful of top pairs at the head and overall, plus the most
//! recent head values.

use serde::Serialize;

use crate::date::DrawDate;
use crate::record::AggregatedDataset;
use crate::stats::{FrequencyAnalyzer, FrequencyStat, PositionRange, TOP_N};

const HEAD_PAIRS: usize = 8;
const RECENT_HEAD_VALUES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub key: String,
    pub count: usize,
    pub percentage: f64,
    pub last_seen: Option<DrawDate>,
}

impl From<&FrequencyStat> for SummaryEntry {
    fn from(stat: &FrequencyStat) -> Self {
        Self {
            key: stat.key.clone(),
            count: stat.count,
            percentage: stat.percentage,
            last_seen: stat.last_seen(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadValue {
    pub value: String,
    pub date: DrawDate,
    pub modality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorySummary {
    pub from: DrawDate,
    pub to: DrawDate,
    pub total_records: usize,
    pub head_records: usize,
    pub modalities: Vec<String>,
    pub head_pairs: Vec<SummaryEntry>,
    pub top_pairs: Vec<SummaryEntry>,
    /// Newest first.
    pub recent_head_values: Vec<HeadValue>,
}

impl AdvisorySummary {
    pub fn build(dataset: &AggregatedDataset, from: DrawDate, to: DrawDate) -> Self {
        let analyzer = FrequencyAnalyzer::new(dataset);
        let head = analyzer.range(PositionRange::Head);
        let global = analyzer.global();

        let mut heads: Vec<HeadValue> = dataset
            .records()
            .iter()
            .filter(|r| PositionRange::Head.contains(r.position()))
            .map(|r| HeadValue {
                value: r.value().to_string(),
                date: r.date(),
                modality: r.modality().map(String::from),
            })
            .collect();
        // Stable: same-date values keep their reported order.
        heads.sort_by(|a, b| b.date.cmp(&a.date));
        heads.truncate(RECENT_HEAD_VALUES);

        Self {
            from,
            to,
            total_records: dataset.len(),
            head_records: head.table.total,
            modalities: dataset.modalities().into_iter().map(String::from).collect(),
            head_pairs: head
                .table
                .most_frequent(HEAD_PAIRS)
                .iter()
                .map(SummaryEntry::from)
                .collect(),
            top_pairs: global
                .pairs
                .most_frequent(TOP_N)
                .iter()
                .map(SummaryEntry::from)
                .collect(),
            recent_head_values: heads,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
