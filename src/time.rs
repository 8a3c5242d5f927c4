use chrono::{Datelike, Months, NaiveDate};

use std::fmt::Display;

use crate::intent::TimeWindow;

/// An inclusive range of calendar dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Resolves `window` against a dataset spanning `min_date..=anchor`.
    ///
    /// `anchor` (the latest order date) stands in for "today". With no
    /// window the whole dataset range is returned. A window that overlaps
    /// the data is clamped to it, so "this year" ends at the anchor rather
    /// than on 31 December; a window entirely outside the data is returned
    /// as its plain calendar range and will match nothing. That covers
    /// future years, and also "last month" or "last year" when the data
    /// starts after that period.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chrono::NaiveDate;
    /// # use sales_insight::{TimeRange, TimeWindow};
    /// let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    /// let range = TimeRange::resolve(Some(TimeWindow::LastMonth), day(2014, 1, 3), day(2017, 12, 30));
    /// assert_eq!(range, TimeRange::new(day(2017, 11, 1), day(2017, 11, 30)));
    /// ```
    #[must_use]
    pub fn resolve(window: Option<TimeWindow>, min_date: NaiveDate, anchor: NaiveDate) -> Self {
        let data = Self::new(min_date.min(anchor), anchor);
        let Some(window) = window else {
            return data;
        };
        let calendar = match window {
            TimeWindow::LastMonth => {
                let this_month = anchor.with_day(1).unwrap_or(anchor);
                let start = this_month
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(this_month);
                let end = this_month.pred_opt().unwrap_or(this_month);
                Self::new(start, end)
            }
            TimeWindow::ThisYear => year_range(anchor.year()),
            TimeWindow::LastYear => year_range(anchor.year() - 1),
            TimeWindow::ExplicitYear(year) => year_range(year),
        };
        calendar.clamp_to(data)
    }

    /// Returns the part of `self` inside `bounds`, or `self` unchanged if
    /// the two don't overlap.
    fn clamp_to(self, bounds: Self) -> Self {
        if self.end < bounds.start || self.start > bounds.end {
            return self;
        }
        Self::new(self.start.max(bounds.start), self.end.min(bounds.end))
    }
}

fn year_range(year: i32) -> TimeRange {
    match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(start), Some(end)) => TimeRange::new(start, end),
        _ => TimeRange::new(NaiveDate::MAX, NaiveDate::MAX),
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
