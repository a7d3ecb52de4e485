//! Batched, paced retrieval of a date range.
//!
//! Dates are split into consecutive batches of `batch_size`. Within a batch
//! at most `max_in_flight` fetches run at once; the next batch starts only
//! after every fetch of the current one has settled, and after a fixed
//! pause. A date that fails or has no draws is noted and skipped; the
//! retrieval only fails when no date produced anything.

use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use thiserror::Error;
use tracing::{debug, info, warn};

use extracto_core::{AggregatedDataset, DateError, DrawDate, DrawSet, expand_range, merge};

use crate::fetch::{DrawFetcher, DrawQuery, FetchError};

#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error("no draws found for any of the {requested} requested dates ({failed} failed)")]
    EmptyRange { requested: usize, failed: usize },
    #[error(transparent)]
    InvalidRange(#[from] DateError),
    #[error("retrieval did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl RetrieveError {
    /// True when nothing came back because every date failed to fetch, as
    /// opposed to the source simply having no draws for the range.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::EmptyRange { requested, failed } if *requested > 0 && failed == requested)
    }
}

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    /// Concurrent fetches allowed within a batch; clamped to `1..=batch_size`.
    pub max_in_flight: usize,
    /// Upper bound on the whole retrieval. `None` waits indefinitely.
    pub deadline: Option<Duration>,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            inter_batch_delay: Duration::from_millis(500),
            max_in_flight: 5,
            deadline: None,
        }
    }
}

impl RetrieverConfig {
    fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    fn in_flight_limit(&self) -> usize {
        self.max_in_flight.clamp(1, self.batch_size())
    }
}

/// What happened to each requested date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalReport {
    pub requested: usize,
    pub with_data: Vec<DrawDate>,
    pub empty: Vec<DrawDate>,
    pub failed: Vec<DrawDate>,
    /// Dates in each batch, in the order the batches ran.
    pub batch_sizes: Vec<usize>,
    pub pauses: usize,
}

impl RetrievalReport {
    pub fn batches(&self) -> usize {
        self.batch_sizes.len()
    }
}

#[derive(Debug, Clone)]
pub struct Retrieval {
    pub dataset: AggregatedDataset,
    pub report: RetrievalReport,
}

pub struct BatchedRetriever<F> {
    fetcher: F,
    config: RetrieverConfig,
}

impl<F: DrawFetcher> BatchedRetriever<F> {
    pub fn new(fetcher: F, config: RetrieverConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Retrieve and merge every date in `from..=to`.
    pub async fn retrieve_range(
        &self,
        query: DrawQuery,
        from: DrawDate,
        to: DrawDate,
    ) -> Result<Retrieval, RetrieveError> {
        let dates = expand_range(from, to)?;
        self.retrieve_dates(query, &dates).await
    }

    /// Retrieve and merge the given dates, honouring the configured deadline.
    pub async fn retrieve_dates(
        &self,
        query: DrawQuery,
        dates: &[DrawDate],
    ) -> Result<Retrieval, RetrieveError> {
        match self.config.deadline {
            Some(limit) => tokio::time::timeout(limit, self.run(query, dates))
                .await
                .map_err(|_| RetrieveError::DeadlineExceeded(limit))?,
            None => self.run(query, dates).await,
        }
    }

    async fn run(&self, query: DrawQuery, dates: &[DrawDate]) -> Result<Retrieval, RetrieveError> {
        let batch_size = self.config.batch_size();
        let limit = self.config.in_flight_limit();
        let batch_count = dates.len().div_ceil(batch_size);
        let mut report = RetrievalReport {
            requested: dates.len(),
            ..RetrievalReport::default()
        };
        let mut found: Vec<(DrawDate, DrawSet)> = Vec::new();

        info!(
            organization = query.organization,
            classification = query.classification,
            dates = dates.len(),
            batches = batch_count,
            "retrieving draws"
        );

        for (i, batch) in dates.chunks(batch_size).enumerate() {
            debug!(batch = i + 1, of = batch_count, dates = batch.len(), "starting batch");
            let outcomes: Vec<(DrawDate, Result<DrawSet, FetchError>)> = stream::iter(batch)
                .map(|&date| async move { (date, self.fetcher.fetch(query, date).await) })
                .buffer_unordered(limit)
                .collect()
                .await;
            report.batch_sizes.push(batch.len());

            for (date, outcome) in outcomes {
                match outcome {
                    Ok(set) if set.is_empty() => {
                        debug!(date = %date, "no draws for date");
                        report.empty.push(date);
                    }
                    Ok(set) => {
                        debug!(date = %date, entries = set.len(), "draws retrieved");
                        report.with_data.push(date);
                        found.push((date, set));
                    }
                    Err(e) => {
                        warn!(date = %date, error = %e, "fetch failed; skipping date");
                        report.failed.push(date);
                    }
                }
            }

            if i + 1 < batch_count {
                tokio::time::sleep(self.config.inter_batch_delay).await;
                report.pauses += 1;
            }
        }

        if found.is_empty() {
            return Err(RetrieveError::EmptyRange {
                requested: report.requested,
                failed: report.failed.len(),
            });
        }

        found.sort_by_key(|(date, _)| *date);
        report.with_data.sort();
        report.empty.sort();
        report.failed.sort();

        let dataset = merge(found);
        info!(
            records = dataset.len(),
            with_data = report.with_data.len(),
            empty = report.empty.len(),
            failed = report.failed.len(),
            "retrieval complete"
        );
        Ok(Retrieval { dataset, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use extracto_core::DrawEntry;
    use tokio::time::Instant;

    const FETCH_TIME: Duration = Duration::from_millis(10);

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Start(DrawDate),
        End(DrawDate),
    }

    /// Fetcher that answers every date with two draws unless told otherwise,
    /// and records what it saw.
    #[derive(Default)]
    struct MockFetcher {
        failing: HashSet<DrawDate>,
        empty: HashSet<DrawDate>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        events: Mutex<Vec<Event>>,
    }

    impl MockFetcher {
        fn failing(dates: &[DrawDate]) -> Self {
            Self {
                failing: dates.iter().copied().collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl DrawFetcher for MockFetcher {
        async fn fetch(&self, _query: DrawQuery, date: DrawDate) -> Result<DrawSet, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.events.lock().unwrap().push(Event::Start(date));

            tokio::time::sleep(FETCH_TIME).await;

            self.events.lock().unwrap().push(Event::End(date));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(&date) {
                return Err(FetchError::Server {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            if self.empty.contains(&date) {
                return Ok(DrawSet::default());
            }
            Ok(DrawSet::new(vec![
                DrawEntry::new("1425", 1, Some("Neuquén".into()), None).unwrap(),
                DrawEntry::new("0007", 2, Some("Neuquén".into()), None).unwrap(),
            ]))
        }
    }

    fn days(n: u32) -> Vec<DrawDate> {
        (1..=n)
            .map(|d| DrawDate::from_ymd(2024, 1, d).unwrap())
            .collect()
    }

    fn query() -> DrawQuery {
        DrawQuery::new(1, 0)
    }

    #[tokio::test(start_paused = true)]
    async fn twelve_dates_make_three_batches_and_two_pauses() {
        let fetcher = Arc::new(MockFetcher::default());
        let retriever = BatchedRetriever::new(fetcher.clone(), RetrieverConfig::default());

        let start = Instant::now();
        let result = retriever.retrieve_dates(query(), &days(12)).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(result.report.batches(), 3);
        assert_eq!(result.report.batch_sizes, [5, 5, 2]);
        assert_eq!(result.report.pauses, 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 12);
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 5);
        assert_eq!(result.dataset.len(), 24);
        // Three fetch rounds and two 500ms pauses.
        let expected = FETCH_TIME * 3 + Duration::from_millis(1000);
        assert!(elapsed >= expected, "finished after {elapsed:?}");
        assert!(elapsed < expected + FETCH_TIME, "finished after {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn batches_never_overlap() {
        let fetcher = Arc::new(MockFetcher::default());
        let retriever = BatchedRetriever::new(fetcher.clone(), RetrieverConfig::default());
        let dates = days(12);
        retriever.retrieve_dates(query(), &dates).await.unwrap();

        let events = fetcher.events.lock().unwrap().clone();
        for (i, batch) in dates.chunks(5).enumerate().skip(1) {
            let first_start = events
                .iter()
                .position(|e| matches!(e, Event::Start(d) if batch.contains(d)))
                .unwrap();
            let last_end_before = events
                .iter()
                .rposition(|e| matches!(e, Event::End(d) if dates[..i * 5].contains(d)))
                .unwrap();
            assert!(last_end_before < first_start, "batch {i} started early");
        }

        let starts: Vec<usize> = dates
            .chunks(5)
            .map(|batch| {
                events
                    .iter()
                    .filter(|e| matches!(e, Event::Start(d) if batch.contains(d)))
                    .count()
            })
            .collect();
        assert_eq!(starts, [5, 5, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_bound_is_respected() {
        let fetcher = Arc::new(MockFetcher::default());
        let config = RetrieverConfig {
            max_in_flight: 2,
            ..RetrieverConfig::default()
        };
        let retriever = BatchedRetriever::new(fetcher.clone(), config);
        let result = retriever.retrieve_dates(query(), &days(5)).await.unwrap();

        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 2);
        assert_eq!(result.report.batches(), 1);
        assert_eq!(result.report.pauses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_dates_are_skipped() {
        let dates = days(10);
        let fetcher = Arc::new(MockFetcher::failing(&[dates[2], dates[7]]));
        let retriever = BatchedRetriever::new(fetcher, RetrieverConfig::default());

        let result = retriever.retrieve_dates(query(), &dates).await.unwrap();

        assert_eq!(result.report.with_data.len(), 8);
        assert_eq!(result.report.failed, vec![dates[2], dates[7]]);
        assert_eq!(result.dataset.len(), 16);
        let seen = result.dataset.dates();
        assert_eq!(seen.len(), 8);
        assert!(!seen.contains(&dates[2]));
        assert!(!seen.contains(&dates[7]));
    }

    #[tokio::test(start_paused = true)]
    async fn all_failed_is_unreachable() {
        let dates = days(3);
        let fetcher = MockFetcher::failing(&dates);
        let retriever = BatchedRetriever::new(fetcher, RetrieverConfig::default());

        let err = retriever.retrieve_dates(query(), &dates).await.unwrap_err();
        assert!(matches!(
            err,
            RetrieveError::EmptyRange {
                requested: 3,
                failed: 3
            }
        ));
        assert!(err.is_unreachable());
    }

    #[tokio::test(start_paused = true)]
    async fn all_empty_is_empty_range_without_failures() {
        let dates = days(6);
        let fetcher = MockFetcher {
            empty: dates.iter().copied().collect(),
            ..MockFetcher::default()
        };
        let retriever = BatchedRetriever::new(fetcher, RetrieverConfig::default());

        let err = retriever.retrieve_dates(query(), &dates).await.unwrap_err();
        assert!(matches!(
            err,
            RetrieveError::EmptyRange {
                requested: 6,
                failed: 0
            }
        ));
        assert!(!err.is_unreachable());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_and_failed_mix_is_not_unreachable() {
        let dates = days(7);
        let fetcher = MockFetcher {
            empty: dates[..6].iter().copied().collect(),
            failing: dates[6..].iter().copied().collect(),
            ..MockFetcher::default()
        };
        let retriever = BatchedRetriever::new(fetcher, RetrieverConfig::default());

        let err = retriever.retrieve_dates(query(), &dates).await.unwrap_err();
        assert!(matches!(
            err,
            RetrieveError::EmptyRange {
                requested: 7,
                failed: 1
            }
        ));
        assert!(!err.is_unreachable());
    }

    #[tokio::test(start_paused = true)]
    async fn range_records_carry_their_own_date() {
        let fetcher = MockFetcher::default();
        let retriever = BatchedRetriever::new(fetcher, RetrieverConfig::default());
        let from = DrawDate::from_ymd(2024, 1, 30).unwrap();
        let to = DrawDate::from_ymd(2024, 2, 2).unwrap();

        let result = retriever.retrieve_range(query(), from, to).await.unwrap();

        assert_eq!(result.report.requested, 4);
        let dates: Vec<String> = result.dataset.dates().iter().map(|d| d.to_string()).collect();
        assert_eq!(dates, ["30/01/2024", "31/01/2024", "01/02/2024", "02/02/2024"]);
        assert_eq!(result.dataset.records()[0].date(), from);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let retriever = BatchedRetriever::new(MockFetcher::default(), RetrieverConfig::default());
        let err = retriever
            .retrieve_range(
                query(),
                DrawDate::from_ymd(2024, 1, 2).unwrap(),
                DrawDate::from_ymd(2024, 1, 1).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RetrieveError::InvalidRange(DateError::InvalidRange { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cuts_retrieval_short() {
        let config = RetrieverConfig {
            deadline: Some(Duration::from_millis(200)),
            ..RetrieverConfig::default()
        };
        let retriever = BatchedRetriever::new(MockFetcher::default(), config);

        let err = retriever.retrieve_dates(query(), &days(12)).await.unwrap_err();
        assert!(matches!(err, RetrieveError::DeadlineExceeded(_)));
    }
}
