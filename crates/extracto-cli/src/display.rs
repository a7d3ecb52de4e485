//! Terminal rendering for records, retrieval reports and frequency tables.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use extracto_core::catalog::{self, CLASSIFICATIONS, ORGANIZATIONS};
use extracto_core::stats::CARD_TOP_N;
use extracto_core::{AggregatedDataset, DrawDate, FrequencyStat, GlobalStats, PositionSlice, RangeSlice};
use extracto_sync::{DrawQuery, RetrievalReport};

const MAX_RECORD_ROWS: usize = 50;

// ── Helpers ──

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_positions(stat: &FrequencyStat) -> String {
    stat.positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn last_seen(stat: &FrequencyStat) -> String {
    stat.last_seen()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn stat_table<'a>(stats: impl IntoIterator<Item = &'a FrequencyStat>, color: Color) -> Table {
    let mut table = new_table(vec!["#", "Key", "Count", "%", "Positions", "Last seen"]);
    for (i, stat) in stats.into_iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&stat.key).fg(color),
            Cell::new(stat.count),
            Cell::new(format!("{:.1}", stat.percentage)),
            Cell::new(join_positions(stat)),
            Cell::new(last_seen(stat)),
        ]);
    }
    table
}

// ── Public API ──

pub fn print_catalog() {
    let mut table = new_table(vec!["Organization", "Name"]);
    for e in ORGANIZATIONS {
        table.add_row(vec![e.code.to_string(), e.name.to_string()]);
    }
    println!("{table}");

    let mut table = new_table(vec!["Classification", "Name"]);
    for e in CLASSIFICATIONS {
        table.add_row(vec![e.code.to_string(), e.name.to_string()]);
    }
    println!("{table}");
}

pub fn print_no_data(query: DrawQuery, from: DrawDate, to: DrawDate) {
    println!(
        "No draws published for {} / {} on {}.",
        catalog::organization_name(query.organization),
        catalog::classification_name(query.classification),
        date_range(from, to),
    );
}

pub fn print_header(query: DrawQuery, from: DrawDate, to: DrawDate) {
    println!(
        "=== {} / {} ===",
        catalog::organization_name(query.organization),
        catalog::classification_name(query.classification),
    );
    println!("Period: {}", date_range(from, to));
    println!();
}

fn date_range(from: DrawDate, to: DrawDate) -> String {
    if from == to {
        from.to_string()
    } else {
        format!("{from} to {to}")
    }
}

/// Jurisdictions and modalities present, i.e. the values the filters accept.
pub fn print_labels(dataset: &AggregatedDataset) {
    let jurisdictions = dataset.jurisdictions();
    if !jurisdictions.is_empty() {
        println!("Jurisdictions: {}", jurisdictions.join(", "));
    }
    let modalities = dataset.modalities();
    if !modalities.is_empty() {
        println!("Modalities:    {}", modalities.join(", "));
    }
}

pub fn print_records(dataset: &AggregatedDataset) {
    let mut table = new_table(vec!["Position", "Value", "Date", "Jurisdiction", "Modality"]);
    for r in dataset.records().iter().take(MAX_RECORD_ROWS) {
        table.add_row(vec![
            r.position().to_string(),
            r.value().to_string(),
            r.date().to_string(),
            r.jurisdiction().unwrap_or("-").to_string(),
            r.modality().unwrap_or("-").to_string(),
        ]);
    }
    println!("{table}");
    if dataset.len() > MAX_RECORD_ROWS {
        println!("Showing the first {MAX_RECORD_ROWS} of {} records.", dataset.len());
    }
}

pub fn print_report(report: &RetrievalReport) {
    eprintln!(
        "  {} dates requested: {} with draws, {} empty, {} failed ({} batches)",
        report.requested,
        report.with_data.len(),
        report.empty.len(),
        report.failed.len(),
        report.batches(),
    );
    if !report.failed.is_empty() {
        let failed: Vec<String> = report.failed.iter().map(|d| d.to_string()).collect();
        eprintln!("  Failed dates: {}", failed.join(", "));
    }
}

pub fn print_global(global: &GlobalStats, top: usize) {
    println!(
        "Records: {}  Distinct values: {}  Distinct pairs: {}",
        global.total(),
        global.unique_values(),
        global.unique_pairs(),
    );
    println!();

    println!("── Most frequent values ──");
    println!("{}", stat_table(global.values.most_frequent(top), Color::Red));
    println!("── Least frequent values ──");
    println!("{}", stat_table(global.values.least_frequent(top), Color::Cyan));
    println!("── Most frequent pairs ──");
    println!("{}", stat_table(global.pairs.most_frequent(top), Color::Red));
    println!("── Least frequent pairs ──");
    println!("{}", stat_table(global.pairs.least_frequent(top), Color::Cyan));
}

pub fn print_ranges(ranges: &[RangeSlice]) {
    for slice in ranges {
        println!(
            "── {} ({}) · {} draws ──",
            slice.range.name(),
            slice.range.label(),
            slice.table.total
        );
        if slice.table.is_empty() {
            println!("  no draws in range");
            continue;
        }
        println!("{}", stat_table(slice.table.most_frequent(CARD_TOP_N), Color::Red));
        println!("{}", stat_table(slice.table.least_frequent(CARD_TOP_N), Color::Cyan));
    }
}

pub fn print_positions(slices: &[PositionSlice], top: usize) {
    for slice in slices {
        println!("── Position {} · {} draws ──", slice.position, slice.table.total);
        println!("{}", stat_table(slice.table.most_frequent(top), Color::Red));
        println!("{}", stat_table(slice.table.least_frequent(top), Color::Cyan));
    }
}
