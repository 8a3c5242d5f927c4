#![doc = include_str!("../README.md")]
pub mod answer;
pub mod assistant;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod intent;
pub mod states;
pub mod time;
pub mod usd;

use std::path::Path;

pub use answer::{Answer, NO_DATA};
pub use assistant::SalesAssistant;
pub use dataset::{DateOrder, Dataset, Record, Vocabulary};
pub use engine::{aggregate, Aggregation, TOTAL};
pub use error::{Error, Result};
pub use intent::{Dimension, Filters, Intent, IntentParser, Metric, TimeWindow};
pub use time::TimeRange;
pub use usd::Usd;

/// Loads the CSV file at `csv_path` and answers `question` about it.
///
/// An answer that matched nothing is returned as the "no data found" reply,
/// not as an error.
///
/// # Errors
///
/// Returns any errors from loading the dataset.
pub fn ask_question(question: &str, csv_path: impl AsRef<Path>) -> Result<String> {
    let assistant = SalesAssistant::from_csv(csv_path, DateOrder::Auto)?;
    Ok(assistant.ask(question).to_string())
}
