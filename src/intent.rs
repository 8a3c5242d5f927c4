use regex::{Regex, RegexSet};
use tracing::debug;

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    ops::Range,
};

use crate::{dataset::Record, dataset::Vocabulary, error::Result, states::US_STATES, usd::Usd};

/// Region names recognised even when the dataset lacks some of them.
pub const REGIONS: [&str; 4] = ["Central", "East", "South", "West"];

/// The amount column a question asks about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    #[default]
    Sales,
    Profit,
}

impl Metric {
    #[must_use]
    pub fn of(self, record: &Record) -> Usd {
        match self {
            Self::Sales => record.sales,
            Self::Profit => record.profit,
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sales => "Sales",
            Self::Profit => "Profit",
        })
    }
}

/// A time phrase found in a question, before it is resolved to dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    LastMonth,
    ThisYear,
    LastYear,
    ExplicitYear(i32),
}

/// A categorical column usable for filtering or grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Region,
    State,
    Category,
    Product,
    Month,
    MonthName,
}

impl Dimension {
    /// Returns this dimension's value for `record`.
    #[must_use]
    pub fn key(self, record: &Record) -> Cow<'_, str> {
        match self {
            Self::Region => Cow::Borrowed(&record.region),
            Self::State => Cow::Borrowed(&record.state),
            Self::Category => Cow::Borrowed(&record.category),
            Self::Product => Cow::Borrowed(&record.product),
            Self::Month => Cow::Owned(record.month().to_string()),
            Self::MonthName => Cow::Borrowed(record.month_name()),
        }
    }

    /// Maps a word such as `regions` or `category` to a dimension.
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "region" | "regions" => Some(Self::Region),
            "state" | "states" => Some(Self::State),
            "category" | "categories" => Some(Self::Category),
            "product" | "products" => Some(Self::Product),
            "month" | "months" => Some(Self::Month),
            _ => None,
        }
    }

    /// Precedence among filter matches covering the same text; lower wins.
    fn specificity(self) -> u8 {
        match self {
            Self::Product => 0,
            Self::Category => 1,
            Self::Region => 2,
            Self::State => 3,
            Self::Month | Self::MonthName => 4,
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Region => "Region",
            Self::State => "State",
            Self::Category => "Category",
            Self::Product => "Product",
            Self::Month => "Month",
            Self::MonthName => "MonthName",
        })
    }
}

/// Exact-match filters, one value per dimension.
pub type Filters = BTreeMap<Dimension, String>;

/// The structured form of a question.
///
/// If `top_n` is set, `group_by` is set too.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Intent {
    pub metric: Metric,
    pub time_window: Option<TimeWindow>,
    pub filters: Filters,
    pub group_by: Option<Dimension>,
    pub top_n: Option<usize>,
}

/// A filter value and the pattern that finds it in a question.
#[derive(Debug)]
struct Phrase {
    dimension: Dimension,
    value: String,
    regex: Regex,
}

/// A filter value found in a question, with its byte span.
#[derive(Debug)]
struct Candidate<'a> {
    dimension: Dimension,
    value: &'a str,
    start: usize,
    end: usize,
}

impl Candidate<'_> {
    fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Turns free-text questions into [`Intent`]s.
///
/// Filter values are matched against the phrases known to the parser: the
/// products, categories and regions of a dataset's [`Vocabulary`], plus US
/// state names and postal codes.
#[derive(Debug)]
pub struct IntentParser {
    phrases: Vec<Phrase>,
    phrase_set: RegexSet,
    top_n: Regex,
    year: Regex,
    time_phrases: Vec<(Regex, TimeWindow)>,
    group_by: Regex,
    state_code: Regex,
}

impl IntentParser {
    /// Builds a parser for questions about data with vocabulary `vocab`.
    ///
    /// # Errors
    ///
    /// Returns any errors from compiling a phrase pattern with [`Regex::new`].
    pub fn new(vocab: &Vocabulary) -> Result<Self> {
        let mut parser = Self {
            phrases: Vec::new(),
            phrase_set: RegexSet::empty(),
            top_n: Regex::new(r"\btop\s+(\d+)(?:\s+([a-z]+))?")?,
            year: Regex::new(r"\b((?:19|20)\d{2})\b")?,
            time_phrases: vec![
                (Regex::new(r"\blast\s+year\b")?, TimeWindow::LastYear),
                (Regex::new(r"\b(?:this\s+year|ytd)\b")?, TimeWindow::ThisYear),
                (Regex::new(r"\blast\s+month\b")?, TimeWindow::LastMonth),
            ],
            group_by: Regex::new(
                r"\b(?:by|per)\s+([a-z]+)(\s+names?\b)?|\b(monthly|month-wise)\b",
            )?,
            state_code: Regex::new(r"\b(?:in|for|from|within|at)\s+([a-z]{2})\b")?,
        };
        let mut seen = BTreeSet::new();
        for product in &vocab.products {
            parser.add_phrase(Dimension::Product, product, &mut seen)?;
        }
        for category in &vocab.categories {
            parser.add_phrase(Dimension::Category, category, &mut seen)?;
        }
        for region in REGIONS.iter().copied().chain(vocab.regions.iter().map(String::as_str)) {
            parser.add_phrase(Dimension::Region, region, &mut seen)?;
        }
        for state in US_STATES
            .iter()
            .map(|(_, name)| *name)
            .chain(vocab.states.iter().map(String::as_str))
        {
            parser.add_phrase(Dimension::State, state, &mut seen)?;
        }
        parser.phrase_set = RegexSet::new(parser.phrases.iter().map(|p| p.regex.as_str()))?;
        Ok(parser)
    }

    /// Adds `value` as a recognisable filter phrase for `dimension`.
    ///
    /// The phrase matches the value's words in order, on word boundaries,
    /// ignoring case and the punctuation between words. Values already added
    /// for the same dimension (ignoring case), and values with no words, are
    /// skipped.
    fn add_phrase(
        &mut self,
        dimension: Dimension,
        value: &str,
        seen: &mut BTreeSet<(Dimension, String)>,
    ) -> Result<()> {
        let words: Vec<String> = value
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();
        if words.is_empty() || !seen.insert((dimension, words.join(" "))) {
            return Ok(());
        }
        self.phrases.push(Phrase {
            dimension,
            value: value.to_string(),
            regex: Regex::new(&format!(r"\b{}\b", words.join(r"\W+")))?,
        });
        Ok(())
    }

    /// Parses `question` into an [`Intent`].
    ///
    /// Never fails: anything unrecognised is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sales_insight::{Dimension, IntentParser, Metric, TimeWindow, Vocabulary};
    /// let parser = IntentParser::new(&Vocabulary::default()).unwrap();
    /// let intent = parser.parse("Profit by region last year");
    /// assert_eq!(intent.metric, Metric::Profit);
    /// assert_eq!(intent.group_by, Some(Dimension::Region));
    /// assert_eq!(intent.time_window, Some(TimeWindow::LastYear));
    /// ```
    #[must_use]
    pub fn parse(&self, question: &str) -> Intent {
        let q = question.to_lowercase();
        let metric = if q.contains("profit") {
            Metric::Profit
        } else {
            Metric::Sales
        };

        let mut top_n = None;
        let mut top_dimension = None;
        let mut top_span = None;
        if let Some(caps) = self.top_n.captures(&q) {
            if let Some(count) = caps.get(1) {
                top_span = Some(count.range());
                top_n = Some(count.as_str().parse::<usize>().unwrap_or(usize::MAX).max(1));
                top_dimension = caps.get(2).and_then(|w| Dimension::from_word(w.as_str()));
            }
        }

        let (filters, claimed) = self.filters(&q);
        let time_window = self
            .year
            .captures_iter(&q)
            .filter_map(|caps| caps.get(1))
            .find(|m| {
                top_span.as_ref() != Some(&m.range())
                    && !claimed
                        .iter()
                        .any(|span| span.start <= m.start() && m.end() <= span.end)
            })
            .and_then(|m| m.as_str().parse().ok())
            .map(TimeWindow::ExplicitYear)
            .or_else(|| {
                self.time_phrases
                    .iter()
                    .find(|(regex, _)| regex.is_match(&q))
                    .map(|(_, window)| *window)
            });

        let group_by = self.group_dimension(&q).or(top_dimension);
        if top_n.is_some() && group_by.is_none() {
            debug!("ignoring top-N with no dimension to rank");
            top_n = None;
        }

        let intent = Intent {
            metric,
            time_window,
            filters,
            group_by,
            top_n,
        };
        debug!(?intent, question, "parsed question");
        intent
    }

    /// Returns the last `by <dimension>` (or month shorthand) in `q`.
    fn group_dimension(&self, q: &str) -> Option<Dimension> {
        self.group_by
            .captures_iter(q)
            .filter_map(|caps| {
                if caps.get(3).is_some() {
                    return Some(Dimension::MonthName);
                }
                let dimension = Dimension::from_word(caps.get(1)?.as_str())?;
                if dimension == Dimension::Month && caps.get(2).is_some() {
                    Some(Dimension::MonthName)
                } else {
                    Some(dimension)
                }
            })
            .last()
    }

    /// Finds filter values in `q`, with the spans of text they claimed.
    ///
    /// Where matches overlap, the longer one wins; matches of equal extent
    /// resolve by Product, then Category, then Region, then State, then
    /// earliest position. Every occurrence of a phrase is a candidate.
    fn filters(&self, q: &str) -> (Filters, Vec<Range<usize>>) {
        let mut candidates: Vec<Candidate<'_>> = Vec::new();
        for i in self.phrase_set.matches(q).iter() {
            let p = &self.phrases[i];
            candidates.extend(p.regex.find_iter(q).map(|m| Candidate {
                dimension: p.dimension,
                value: &p.value,
                start: m.start(),
                end: m.end(),
            }));
        }
        for caps in self.state_code.captures_iter(q) {
            let Some(code) = caps.get(1) else { continue };
            if let Some(name) = crate::states::state_name(code.as_str()) {
                candidates.push(Candidate {
                    dimension: Dimension::State,
                    value: name,
                    start: code.start(),
                    end: code.end(),
                });
            }
        }
        candidates.sort_by(|a, b| {
            (b.end - b.start)
                .cmp(&(a.end - a.start))
                .then(a.dimension.specificity().cmp(&b.dimension.specificity()))
                .then(a.start.cmp(&b.start))
                .then(a.value.cmp(b.value))
        });

        let mut accepted: Vec<&Candidate<'_>> = Vec::new();
        let mut filters = Filters::new();
        for c in &candidates {
            if filters.contains_key(&c.dimension) || accepted.iter().any(|a| a.overlaps(c)) {
                continue;
            }
            filters.insert(c.dimension, c.value.to_string());
            accepted.push(c);
        }
        let claimed = accepted.iter().map(|c| c.start..c.end).collect();
        (filters, claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> IntentParser {
        let vocab = Vocabulary {
            regions: ["Central", "East", "South", "West"].map(String::from).into(),
            states: ["California", "New York", "West Virginia"].map(String::from).into(),
            categories: ["Furniture", "Office Supplies", "Technology"].map(String::from).into(),
            products: [
                "Apple iPhone 5",
                "Message Book, Wirebound",
                "Technology Furniture Kit",
                "Xerox 1967",
            ]
            .map(String::from)
            .into(),
        };
        IntentParser::new(&vocab).unwrap()
    }

    #[test]
    fn parse_fn_defaults_to_permissive_intent() {
        assert_eq!(parser().parse("xyz abc"), Intent::default());
    }

    #[test]
    fn parse_fn_detects_metric() {
        let p = parser();
        assert_eq!(p.parse("PROFIT please").metric, Metric::Profit);
        assert_eq!(p.parse("total revenue").metric, Metric::Sales);
        assert_eq!(p.parse("sales").metric, Metric::Sales);
    }

    #[test]
    fn parse_fn_reads_profit_by_region_last_year() {
        let intent = parser().parse("profit by region last year");
        assert_eq!(
            intent,
            Intent {
                metric: Metric::Profit,
                time_window: Some(TimeWindow::LastYear),
                group_by: Some(Dimension::Region),
                ..Intent::default()
            }
        );
    }

    #[test]
    fn parse_fn_reads_state_code_after_preposition() {
        let intent = parser().parse("total sales last month in CA");
        assert_eq!(intent.time_window, Some(TimeWindow::LastMonth));
        assert_eq!(intent.filters, Filters::from([(Dimension::State, "California".into())]));
        assert_eq!(intent.group_by, None);
    }

    #[test]
    fn parse_fn_does_not_read_common_words_as_state_codes() {
        // "in" is Indiana's code and "or" is Oregon's
        assert!(parser().parse("sales in total or in sum").filters.is_empty());
        assert_eq!(
            parser().parse("sales in or").filters,
            Filters::from([(Dimension::State, "Oregon".into())])
        );
    }

    #[test]
    fn parse_fn_reads_full_state_names_anywhere() {
        let intent = parser().parse("new york profit");
        assert_eq!(intent.filters, Filters::from([(Dimension::State, "New York".into())]));
    }

    #[test]
    fn parse_fn_forces_group_from_top_n() {
        let intent = parser().parse("top 3 categories by sales in 2017");
        assert_eq!(intent.top_n, Some(3));
        assert_eq!(intent.group_by, Some(Dimension::Category));
        assert_eq!(intent.time_window, Some(TimeWindow::ExplicitYear(2017)));
        assert!(intent.filters.is_empty());
    }

    #[test]
    fn parse_fn_prefers_explicit_group_over_top_n_word() {
        let intent = parser().parse("top 2 products by region");
        assert_eq!(intent.top_n, Some(2));
        assert_eq!(intent.group_by, Some(Dimension::Region));
    }

    #[test]
    fn parse_fn_clamps_top_n_to_at_least_one() {
        assert_eq!(parser().parse("top 0 states").top_n, Some(1));
    }

    #[test]
    fn parse_fn_drops_top_n_without_dimension() {
        let intent = parser().parse("top 5 sales");
        assert_eq!(intent.top_n, None);
        assert_eq!(intent.group_by, None);
    }

    #[test]
    fn parse_fn_uses_last_group_phrase() {
        assert_eq!(
            parser().parse("sales by region by state").group_by,
            Some(Dimension::State)
        );
        assert_eq!(parser().parse("sales by sales").group_by, None);
    }

    #[test]
    fn parse_fn_distinguishes_month_and_month_name() {
        let p = parser();
        assert_eq!(p.parse("sales by month").group_by, Some(Dimension::Month));
        assert_eq!(p.parse("sales by month name").group_by, Some(Dimension::MonthName));
        assert_eq!(p.parse("monthly profit").group_by, Some(Dimension::MonthName));
    }

    #[test]
    fn parse_fn_applies_time_precedence() {
        let p = parser();
        assert_eq!(
            p.parse("last year vs 2015").time_window,
            Some(TimeWindow::ExplicitYear(2015))
        );
        assert_eq!(
            p.parse("last month and last year").time_window,
            Some(TimeWindow::LastYear)
        );
        assert_eq!(
            p.parse("this year or last month").time_window,
            Some(TimeWindow::ThisYear)
        );
        assert_eq!(p.parse("profit ytd").time_window, Some(TimeWindow::ThisYear));
    }

    #[test]
    fn parse_fn_does_not_read_top_n_count_as_year() {
        let intent = parser().parse("top 2000 products");
        assert_eq!(intent.top_n, Some(2000));
        assert_eq!(intent.time_window, None);
    }

    #[test]
    fn parse_fn_prefers_longer_filter_match() {
        let intent = parser().parse("sales in west virginia");
        assert_eq!(
            intent.filters,
            Filters::from([(Dimension::State, "West Virginia".into())])
        );
        let intent = parser().parse("sales of technology furniture kit");
        assert_eq!(
            intent.filters,
            Filters::from([(Dimension::Product, "Technology Furniture Kit".into())])
        );
    }

    #[test]
    fn parse_fn_combines_non_overlapping_filters() {
        let intent = parser().parse("furniture sales in the west for new york");
        assert_eq!(
            intent.filters,
            Filters::from([
                (Dimension::Region, "West".into()),
                (Dimension::State, "New York".into()),
                (Dimension::Category, "Furniture".into()),
            ])
        );
    }

    #[test]
    fn parse_fn_ignores_punctuation_inside_phrases() {
        let intent = parser().parse("profit for message book wirebound");
        assert_eq!(
            intent.filters,
            Filters::from([(Dimension::Product, "Message Book, Wirebound".into())])
        );
    }

    #[test]
    fn parse_fn_does_not_read_product_number_as_year() {
        let intent = parser().parse("sales of xerox 1967");
        assert_eq!(intent.time_window, None);
        assert_eq!(
            intent.filters,
            Filters::from([(Dimension::Product, "Xerox 1967".into())])
        );
        let intent = parser().parse("sales of xerox 1967 in 2016");
        assert_eq!(intent.time_window, Some(TimeWindow::ExplicitYear(2016)));
    }

    #[test]
    fn parse_fn_considers_later_occurrences_of_a_phrase() {
        let intent = parser().parse("sales in west virginia vs west");
        assert_eq!(
            intent.filters,
            Filters::from([
                (Dimension::Region, "West".into()),
                (Dimension::State, "West Virginia".into()),
            ])
        );
    }

    #[test]
    fn parse_fn_matches_whole_words_only() {
        // "least" contains "east"
        assert!(parser().parse("at least some sales").filters.is_empty());
    }
}
