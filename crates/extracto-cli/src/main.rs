mod display;
mod export;

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use extracto_core::{
    AdvisorySummary, DrawDate, FrequencyAnalyzer, MAX_RANGE_DAYS, RecordFilter, ensure_max_span,
};
use extracto_sync::http::DEFAULT_BASE_URL;
use extracto_sync::{
    BatchedRetriever, CachedFetcher, ClientConfig, DrawQuery, ExtractoClient, Retrieval,
    RetrieveError, RetrieverConfig,
};

use crate::export::ExportContext;

#[derive(Parser)]
#[command(
    name = "extracto",
    version,
    about = "Draw extracts: range retrieval and pair frequency statistics"
)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Command,
}

/// Where and how fast to fetch.
#[derive(Args)]
struct SourceArgs {
    /// Base URL of the extract service
    #[arg(long, env = "EXTRACTO_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Bearer token for the extract service
    #[arg(long, env = "EXTRACTO_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Dates fetched together in one batch
    #[arg(long, default_value = "5", global = true)]
    batch_size: usize,

    /// Pause between batches, in milliseconds
    #[arg(long, default_value = "500", global = true)]
    delay_ms: u64,

    /// Give up on the whole retrieval after this many seconds
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout_secs: u64,

    /// How long fetched dates stay memoized, in seconds
    #[arg(long, default_value = "86400", global = true)]
    cache_ttl_secs: u64,
}

#[derive(Args, Clone, Copy)]
struct QueryArgs {
    /// Organization code (see `extracto catalog`)
    #[arg(short, long)]
    org: u32,

    /// Classification code (see `extracto catalog`)
    #[arg(short, long = "class")]
    class: u32,
}

impl From<QueryArgs> for DrawQuery {
    fn from(q: QueryArgs) -> Self {
        DrawQuery::new(q.org, q.class)
    }
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Only keep records of this jurisdiction
    #[arg(long)]
    jurisdiction: Option<String>,

    /// Only keep records of this modality
    #[arg(long)]
    modality: Option<String>,
}

impl From<FilterArgs> for RecordFilter {
    fn from(f: FilterArgs) -> Self {
        RecordFilter {
            jurisdiction: f.jurisdiction,
            modality: f.modality,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List organization and classification codes
    Catalog,

    /// Show the draws of a single date
    Fetch {
        #[command(flatten)]
        query: QueryArgs,

        /// Draw date (dd/mm/yyyy or yyyy-mm-dd)
        #[arg(short, long)]
        date: DrawDate,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Frequency statistics over a date range
    Stats {
        #[command(flatten)]
        query: QueryArgs,

        /// First date (inclusive)
        #[arg(long)]
        from: DrawDate,

        /// Last date (inclusive)
        #[arg(long)]
        to: DrawDate,

        /// Length of the ranked lists
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Export draws to CSV
    Export {
        #[command(flatten)]
        query: QueryArgs,

        /// First date (inclusive)
        #[arg(long)]
        from: DrawDate,

        /// Last date (inclusive); defaults to `--from`
        #[arg(long)]
        to: Option<DrawDate>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output file; defaults to a name built from the query
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Ranked summary for the advisory generator, as JSON
    Summary {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(long)]
        from: DrawDate,

        #[arg(long)]
        to: DrawDate,
    },
}

type Retriever = BatchedRetriever<CachedFetcher<ExtractoClient>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("extracto v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Catalog => {
            display::print_catalog();
            Ok(())
        }
        Command::Fetch {
            query,
            date,
            filter,
        } => cmd_fetch(&build_retriever(&cli.source)?, query.into(), date, filter.into()).await,
        Command::Stats {
            query,
            from,
            to,
            top,
        } => cmd_stats(&build_retriever(&cli.source)?, query.into(), from, to, top).await,
        Command::Export {
            query,
            from,
            to,
            filter,
            out,
        } => {
            let ctx = ExportContext {
                query: query.into(),
                from,
                to,
                filter: filter.into(),
            };
            cmd_export(&build_retriever(&cli.source)?, ctx, out).await
        }
        Command::Summary { query, from, to } => {
            cmd_summary(&build_retriever(&cli.source)?, query.into(), from, to).await
        }
    }
}

fn build_retriever(source: &SourceArgs) -> Result<Retriever> {
    if source.token.is_none() {
        tracing::warn!("EXTRACTO_TOKEN is not set; requests will be unauthenticated");
    }
    let client = ExtractoClient::new(ClientConfig {
        base_url: source.base_url.clone(),
        token: source.token.clone(),
        timeout: Duration::from_secs(source.timeout_secs),
        ..ClientConfig::default()
    })
    .context("building HTTP client")?;

    let config = RetrieverConfig {
        batch_size: source.batch_size,
        inter_batch_delay: Duration::from_millis(source.delay_ms),
        max_in_flight: source.batch_size,
        deadline: source.deadline_secs.map(Duration::from_secs),
    };
    let fetcher = CachedFetcher::new(client, Duration::from_secs(source.cache_ttl_secs));
    Ok(BatchedRetriever::new(fetcher, config))
}

/// Retrieve `from..=to`, turning "nothing found" into `None` and "nothing
/// reachable" into an error.
async fn retrieve(
    retriever: &Retriever,
    query: DrawQuery,
    from: DrawDate,
    to: DrawDate,
) -> Result<Option<Retrieval>> {
    ensure_max_span(from, to, MAX_RANGE_DAYS)?;

    match retriever.retrieve_range(query, from, to).await {
        Ok(retrieval) => Ok(Some(retrieval)),
        Err(e) if e.is_unreachable() => {
            bail!("could not reach the extract service ({e}); try again later")
        }
        Err(RetrieveError::EmptyRange { .. }) => {
            display::print_no_data(query, from, to);
            Ok(None)
        }
        Err(e) => Err(e).context("retrieving draws"),
    }
}

async fn cmd_fetch(
    retriever: &Retriever,
    query: DrawQuery,
    date: DrawDate,
    filter: RecordFilter,
) -> Result<()> {
    let Some(retrieval) = retrieve(retriever, query, date, date).await? else {
        return Ok(());
    };
    let dataset = retrieval.dataset;

    display::print_labels(&dataset);
    let filtered = dataset.filter(&filter);
    if filtered.is_empty() {
        println!("No results for the selected filters.");
        return Ok(());
    }
    display::print_records(&filtered);
    Ok(())
}

async fn cmd_stats(
    retriever: &Retriever,
    query: DrawQuery,
    from: DrawDate,
    to: DrawDate,
    top: usize,
) -> Result<()> {
    let Some(retrieval) = retrieve(retriever, query, from, to).await? else {
        return Ok(());
    };
    display::print_report(&retrieval.report);

    let analyzer = FrequencyAnalyzer::new(&retrieval.dataset);
    display::print_header(query, from, to);
    display::print_global(&analyzer.global(), top);
    display::print_ranges(&analyzer.by_range());
    display::print_positions(&analyzer.by_position(), top);
    Ok(())
}

async fn cmd_export(retriever: &Retriever, ctx: ExportContext, out: Option<PathBuf>) -> Result<()> {
    let to = ctx.to.unwrap_or(ctx.from);
    let Some(retrieval) = retrieve(retriever, ctx.query, ctx.from, to).await? else {
        return Ok(());
    };

    let path = out.unwrap_or_else(|| PathBuf::from(export::default_file_name(&ctx)));
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let rows = export::write_csv(file, &retrieval.dataset, &ctx)?;
    println!("Wrote {rows} records to {}", path.display());
    Ok(())
}

async fn cmd_summary(
    retriever: &Retriever,
    query: DrawQuery,
    from: DrawDate,
    to: DrawDate,
) -> Result<()> {
    let Some(retrieval) = retrieve(retriever, query, from, to).await? else {
        return Ok(());
    };
    let summary = AdvisorySummary::build(&retrieval.dataset, from, to);
    println!("{}", summary.to_json_pretty()?);
    Ok(())
}
