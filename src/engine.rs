use tracing::debug;

use std::collections::BTreeMap;

use crate::{dataset::Record, intent::Intent, time::TimeRange, usd::Usd};

/// Label of the single row of an ungrouped aggregation.
pub const TOTAL: &str = "Total";

/// The answer to a question, as `(label, amount)` rows in presentation order.
///
/// Grouped results are sorted by amount, descending, with ties in label
/// order. An ungrouped result has one [`TOTAL`] row. Either is empty when no
/// record matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aggregation(Vec<(String, Usd)>);

impl Aggregation {
    #[must_use]
    pub fn rows(&self) -> &[(String, Usd)] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Computes `intent`'s metric over the `records` dated within `range`.
///
/// Filters are exact matches, ignoring case, and all must hold.
#[must_use]
pub fn aggregate(records: &[Record], intent: &Intent, range: &TimeRange) -> Aggregation {
    let filters: Vec<_> = intent
        .filters
        .iter()
        .map(|(dimension, value)| (*dimension, value.to_lowercase()))
        .collect();
    let matching = records.iter().filter(|r| {
        range.contains(r.order_date)
            && filters
                .iter()
                .all(|(dimension, value)| dimension.key(r).to_lowercase() == *value)
    });

    let Some(dimension) = intent.group_by else {
        let mut count = 0;
        let total: Usd = matching
            .inspect(|_| count += 1)
            .map(|r| intent.metric.of(r))
            .sum();
        debug!(rows = count, "aggregated total");
        if count == 0 {
            return Aggregation::default();
        }
        return Aggregation(vec![(TOTAL.to_string(), total)]);
    };

    let mut groups: BTreeMap<String, Usd> = BTreeMap::new();
    for r in matching {
        *groups.entry(dimension.key(r).into_owned()).or_default() += intent.metric.of(r);
    }
    debug!(groups = groups.len(), %dimension, "aggregated groups");
    let mut rows: Vec<_> = groups.into_iter().collect();
    rows.sort_by(|(_, a), (_, b)| b.cmp(a));
    if let Some(n) = intent.top_n {
        rows.truncate(n);
    }
    Aggregation(rows)
}
