use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Chunked health-metric fetcher")]
pub struct Cli {
    /// Path to the config file (ingestor.toml); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the metrics that can be fetched
    Metrics,

    /// Fetch the merged daily series and print it as JSON
    Series(RangeArgs),

    /// Fetch and print monthly and yearly means as JSON
    Summary(RangeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RangeArgs {
    /// Metric to fetch: steps, calories, distance, heartrate, sleep
    #[arg(short, long)]
    pub metric: String,

    /// First day (YYYY-MM-DD); defaults to one year before --end
    #[arg(long)]
    pub start: Option<String>,

    /// Last day (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub end: Option<String>,

    /// Largest range per request, e.g. "1y", "6m", "90d"
    #[arg(long)]
    pub chunk_span: Option<String>,

    /// Attempts per chunk, the first one included
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Base backoff delay in milliseconds, doubled after each failed attempt
    #[arg(long)]
    pub backoff_ms: Option<u64>,

    /// Stop starting new chunks after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}
