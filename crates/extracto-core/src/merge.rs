//! Merging per-date retrieval results into one dataset.

use tracing::debug;

use crate::date::DrawDate;
use crate::record::{AggregatedDataset, DrawRecord, DrawSet};

/// Stamp every entry with the date it was retrieved for and concatenate.
///
/// Input order only affects record order, never the multiset of records.
pub fn merge<I>(results: I) -> AggregatedDataset
where
    I: IntoIterator<Item = (DrawDate, DrawSet)>,
{
    let mut records = Vec::new();
    for (date, set) in results {
        debug!(date = %date, entries = set.len(), "merging draw set");
        records.extend(
            set.entries
                .into_iter()
                .map(|entry| DrawRecord::stamp(entry, date)),
        );
    }
    AggregatedDataset::from_records(records)
}
