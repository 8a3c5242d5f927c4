use std::fmt::Display;

use crate::{
    engine::Aggregation,
    error::{Error, Result},
    intent::Intent,
    time::TimeRange,
};

/// Shown in place of amounts when nothing matched.
pub const NO_DATA: &str = "no data found";

/// A question's resolved intent and result, ready for display.
///
/// The [`Display`] implementation renders the one-line reply, for example:
///
/// ```txt
/// Profit (2016-01-01-2016-12-31) by Region — East: $250.00; West: $44.43.
/// Sales in California (2017-11-01-2017-11-30) — $300.50.
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    pub intent: Intent,
    pub range: TimeRange,
    pub result: Aggregation,
}

impl Answer {
    #[must_use]
    pub fn new(intent: Intent, range: TimeRange, result: Aggregation) -> Self {
        Self {
            intent,
            range,
            result,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// Returns the answer, or [`Error::EmptyResult`] if nothing matched.
    ///
    /// # Errors
    ///
    /// The error carries the rendered "no data found" reply.
    pub fn into_result(self) -> Result<Self> {
        if self.is_empty() {
            return Err(Error::EmptyResult(self.to_string()));
        }
        Ok(self)
    }
}

impl Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.intent.metric)?;
        for (i, value) in self.intent.filters.values().enumerate() {
            f.write_str(if i == 0 { " in " } else { ", " })?;
            f.write_str(value)?;
        }
        write!(f, " ({})", self.range)?;

        let rows = self.result.rows();
        if rows.is_empty() {
            return write!(f, ": {NO_DATA}.");
        }
        match self.intent.group_by {
            Some(dimension) => {
                write!(f, " by {dimension} — ")?;
                for (i, (label, amount)) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{label}: {amount}")?;
                }
                f.write_str(".")
            }
            None => write!(f, " — {}.", rows[0].1),
        }
    }
}
