use tracing::debug;

use std::path::Path;

use crate::{
    answer::Answer,
    dataset::{DateOrder, Dataset},
    engine::aggregate,
    error::Result,
    intent::{Intent, IntentParser},
    time::TimeRange,
};

/// Answers questions about one loaded dataset.
///
/// To load sales data, use [`SalesAssistant::from_csv`], or wrap an existing
/// [`Dataset`] with [`SalesAssistant::new`].
///
/// To answer a question, use [`SalesAssistant::ask`] and print the returned
/// [`Answer`].
#[derive(Debug)]
pub struct SalesAssistant {
    dataset: Dataset,
    parser: IntentParser,
}

impl SalesAssistant {
    /// Creates an assistant for `dataset`.
    ///
    /// # Errors
    ///
    /// Returns any errors from building the [`IntentParser`] for the
    /// dataset's vocabulary.
    pub fn new(dataset: Dataset) -> Result<Self> {
        let parser = IntentParser::new(dataset.vocabulary())?;
        Ok(Self { dataset, parser })
    }

    /// Loads the CSV file at `path` and creates an assistant for it.
    ///
    /// # Errors
    ///
    /// Returns any errors from [`Dataset::from_path`].
    pub fn from_csv(path: impl AsRef<Path>, order: DateOrder) -> Result<Self> {
        Self::new(Dataset::from_path(path, order)?)
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn parse(&self, question: &str) -> Intent {
        self.parser.parse(question)
    }

    /// Resolves `intent`'s time window, taking the latest order date as today.
    #[must_use]
    pub fn resolve(&self, intent: &Intent) -> TimeRange {
        TimeRange::resolve(
            intent.time_window,
            self.dataset.min_date(),
            self.dataset.max_date(),
        )
    }

    /// Answers `question`.
    ///
    /// Never fails; an answer that matched nothing displays as "no data
    /// found" (see [`Answer::into_result`]).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use sales_insight::{DateOrder, SalesAssistant};
    /// let assistant = SalesAssistant::from_csv("data/Sample - Superstore.csv", DateOrder::Auto)?;
    /// println!("{}", assistant.ask("profit by region this year"));
    /// # Ok::<(), sales_insight::Error>(())
    /// ```
    #[must_use]
    pub fn ask(&self, question: &str) -> Answer {
        let intent = self.parse(question);
        let range = self.resolve(&intent);
        debug!(%range, "resolved time window");
        let result = aggregate(self.dataset.records(), &intent, &range);
        Answer::new(intent, range, result)
    }
}
