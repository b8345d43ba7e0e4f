pub mod load_config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use trend_digest_core::aggregate::TrendAggregator;

/// CLI for trend-digest: render AI/tech trend reports for LLM consumption.
#[derive(Parser)]
#[clap(
    name = "trend-digest",
    version,
    about = "Aggregate GitHub search and curated-list data into AI/tech trend reports"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trending repositories merged with the curated MCP list
    Trends {
        /// Focus area: all, mcp, agents or llm
        #[clap(long, default_value = "all")]
        focus: String,
        /// Recency window: daily (7 days) or weekly (30 days)
        #[clap(long, default_value = "daily")]
        timeframe: String,
    },
    /// Deep dive into one topic or framework
    Search {
        /// The keyword to search for (e.g. langchain, autogen, mcp)
        #[clap(long)]
        topic: String,
        /// Lookback period in days
        #[clap(long, default_value_t = 7)]
        days: u32,
    },
    /// Newly created projects within the window
    Releases {
        /// Look at projects created in the last N days
        #[clap(long, default_value_t = 7)]
        days: u32,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main().
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config::load_config()?;
    let aggregator = TrendAggregator::from_config(&config);

    let report = match cli.command {
        Commands::Trends { focus, timeframe } => aggregator.ai_trends(&focus, &timeframe).await?,
        Commands::Search { topic, days } => aggregator.search_topic(&topic, days).await?,
        Commands::Releases { days } => aggregator.new_releases(days).await?,
    };

    println!("{report}");
    Ok(())
}
