//! Core types and analytics for draw extracts: dates, records, merging,
//! pair extraction and frequency statistics. No I/O happens here.

pub mod catalog;
pub mod date;
pub mod merge;
pub mod pair;
pub mod record;
pub mod stats;
pub mod summary;

pub use date::{DateError, DrawDate, MAX_RANGE_DAYS, ensure_max_span, expand_range};
pub use merge::merge;
pub use pair::pair_key;
pub use record::{AggregatedDataset, DrawEntry, DrawRecord, DrawSet, RecordFilter};
pub use stats::{
    FrequencyAnalyzer, FrequencyStat, FrequencyTable, GlobalStats, KeyKind, PositionRange,
    PositionSlice, RangeSlice,
};
pub use summary::AdvisorySummary;
