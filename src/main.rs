use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use sales_insight::{DateOrder, Error, SalesAssistant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
/// Answers natural-language questions about sales or profit.
///
/// Examples:
///
///   sales-insight "total sales last month in California"
///
///   sales-insight "profit by region this year"
///
///   sales-insight "top 3 categories by sales in 2017"
#[command(version, about, long_about)]
struct Args {
    #[arg(help = "Your question, e.g. 'profit by region this year'")]
    question: String,
    #[arg(long = "csv", default_value = "data/Sample - Superstore.csv")]
    /// Path to a Superstore-style sales CSV
    csv_path: PathBuf,
    #[arg(long, default_value_t = DateOrder::Auto)]
    /// How to read a/b/yyyy order dates: auto, day-first or month-first
    date_order: DateOrder,
    #[arg(long, default_value = "warn")]
    /// Log level used when RUST_LOG is not set
    log_level: String,
    #[arg(long)]
    /// Exit with status 2 when no data matches the question
    strict: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let assistant = SalesAssistant::from_csv(&args.csv_path, args.date_order)
        .with_context(|| "could not load sales data")?;
    info!(question = %args.question, "parsing your question");
    match assistant.ask(&args.question).into_result() {
        Ok(answer) => {
            println!("{answer}");
            Ok(ExitCode::SUCCESS)
        }
        Err(Error::EmptyResult(reply)) => {
            println!("{reply}");
            Ok(if args.strict {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            })
        }
        Err(e) => Err(e.into()),
    }
}
