use chrono::{Datelike, NaiveDate};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use serde::Deserialize;
use tracing::{debug, info, warn};

use std::{borrow::Cow, collections::BTreeSet, fmt::Display, path::Path, str::FromStr};

use crate::{
    error::{Error, Result},
    usd::Usd,
};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// How to read ambiguous `a/b/yyyy` order dates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateOrder {
    /// Pick the order from the column's values, preferring day-first.
    #[default]
    Auto,
    DayFirst,
    MonthFirst,
}

impl FromStr for DateOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "day-first" => Ok(Self::DayFirst),
            "month-first" => Ok(Self::MonthFirst),
            _ => Err(format!(
                "unknown date order {s:?} (expected auto, day-first or month-first)"
            )),
        }
    }
}

impl Display for DateOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::DayFirst => "day-first",
            Self::MonthFirst => "month-first",
        })
    }
}

impl DateOrder {
    /// Chooses day-first or month-first for a column of raw date strings.
    ///
    /// A middle component above 12 can only be a day, so the column is
    /// month-first; otherwise it is day-first.
    fn detect<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut month_first = false;
        let mut day_first = false;
        for value in values {
            if let Some((a, b, _)) = split_dmy(value) {
                month_first |= b > 12;
                day_first |= a > 12;
            }
        }
        if month_first && !day_first {
            Self::MonthFirst
        } else {
            if month_first && day_first {
                warn!("order dates mix day-first and month-first layouts");
            }
            Self::DayFirst
        }
    }

    fn other(self) -> Self {
        match self {
            Self::MonthFirst => Self::DayFirst,
            _ => Self::MonthFirst,
        }
    }
}

/// Splits a non-ISO date into its two leading components and a 4-digit year.
fn split_dmy(raw: &str) -> Option<(u32, u32, i32)> {
    let date = date_part(raw);
    let mut parts = date.split(['/', '-', '.']);
    let a = parts.next()?;
    let b = parts.next()?;
    let year = parts.next()?;
    if parts.next().is_some() || year.len() != 4 || a.len() > 2 || b.len() > 2 {
        return None;
    }
    Some((a.parse().ok()?, b.parse().ok()?, year.parse().ok()?))
}

/// Drops any time-of-day suffix.
fn date_part(raw: &str) -> &str {
    let raw = raw.trim();
    let end = raw.find([' ', 'T']).unwrap_or(raw.len());
    &raw[..end]
}

/// Parses an order date, accepting ISO `yyyy-mm-dd` and `a/b/yyyy` layouts.
fn parse_date(raw: &str, order: DateOrder) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(date_part(raw), "%Y-%m-%d") {
        return Some(date);
    }
    let (a, b, year) = split_dmy(raw)?;
    let (day, month) = match order {
        DateOrder::MonthFirst => (b, a),
        DateOrder::DayFirst | DateOrder::Auto => (a, b),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// One sales transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub order_date: NaiveDate,
    pub region: String,
    pub state: String,
    pub category: String,
    pub product: String,
    pub sales: Usd,
    pub profit: Usd,
}

impl Record {
    #[must_use]
    pub fn year(&self) -> i32 {
        self.order_date.year()
    }

    /// Month number, 1 to 12.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.order_date.month()
    }

    /// Three-letter English month name, such as `Jan`.
    #[must_use]
    pub fn month_name(&self) -> &'static str {
        MONTH_ABBREVIATIONS[self.order_date.month0() as usize]
    }
}

/// Defines the CSV columns read from a Superstore-style export.
///
/// Headers are matched after trimming; other columns are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Order Date", alias = "OrderDate")]
    order_date: String,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Product Name", alias = "Product", default)]
    product: Option<String>,
    #[serde(rename = "Sub-Category", default)]
    sub_category: Option<String>,
    #[serde(rename = "Sales", deserialize_with = "csv::invalid_option")]
    sales: Option<Usd>,
    #[serde(rename = "Profit", deserialize_with = "csv::invalid_option")]
    profit: Option<Usd>,
}

/// Distinct dimension values present in a dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vocabulary {
    pub regions: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub products: BTreeSet<String>,
}

impl Vocabulary {
    fn from_records(records: &[Record]) -> Self {
        let mut vocab = Self::default();
        for r in records {
            for (set, value) in [
                (&mut vocab.regions, &r.region),
                (&mut vocab.states, &r.state),
                (&mut vocab.categories, &r.category),
                (&mut vocab.products, &r.product),
            ] {
                if !value.is_empty() && !set.contains(value) {
                    set.insert(value.clone());
                }
            }
        }
        vocab
    }
}

/// An in-memory, read-only table of sales records.
///
/// Load one with [`Dataset::from_path`], or build one from records with
/// [`Dataset::new`].
#[derive(Clone, Debug)]
pub struct Dataset {
    records: Vec<Record>,
    vocabulary: Vocabulary,
    min_date: NaiveDate,
    max_date: NaiveDate,
}

impl Dataset {
    /// Creates a dataset from already-typed records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] if `records` is empty.
    pub fn new(records: Vec<Record>) -> Result<Self> {
        let (Some(min_date), Some(max_date)) = (
            records.iter().map(|r| r.order_date).min(),
            records.iter().map(|r| r.order_date).max(),
        ) else {
            return Err(Error::EmptyDataset("dataset".into()));
        };
        let vocabulary = Vocabulary::from_records(&records);
        Ok(Self {
            records,
            vocabulary,
            min_date,
            max_date,
        })
    }

    /// Reads sales data from the CSV file at `path`.
    ///
    /// The file may be UTF-8 (with or without a byte-order mark) or
    /// Windows-1252. Rows whose order date cannot be parsed are dropped.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The file cannot be read
    /// * The CSV is malformed or lacks a required column
    /// * No row survives cleaning
    pub fn from_path(path: impl AsRef<Path>, order: DateOrder) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        let (text, encoding) = decode(&bytes);
        debug!(encoding = encoding.name(), "decoded {}", path.display());
        let records = read_records(&text, order).map_err(|source| Error::Csv {
            path: path.display().to_string(),
            source,
        })?;
        if records.is_empty() {
            return Err(Error::EmptyDataset(path.display().to_string()));
        }
        Self::new(records)
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Earliest order date.
    #[must_use]
    pub fn min_date(&self) -> NaiveDate {
        self.min_date
    }

    /// Latest order date. This is the anchor for relative time phrases.
    #[must_use]
    pub fn max_date(&self) -> NaiveDate {
        self.max_date
    }
}

fn decode(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    let (text, malformed) = UTF_8.decode_with_bom_removal(bytes);
    if !malformed {
        return (text, UTF_8);
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (text, WINDOWS_1252)
}

fn read_records(text: &str, order: DateOrder) -> std::result::Result<Vec<Record>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let mut raw = Vec::new();
    for result in rdr.deserialize() {
        let record: RawRecord = result?;
        raw.push(record);
    }
    let (order, fallback) = match order {
        DateOrder::Auto => {
            let detected = DateOrder::detect(raw.iter().map(|r| r.order_date.as_str()));
            (detected, Some(detected.other()))
        }
        fixed => (fixed, None),
    };
    debug!(%order, "reading order dates");

    let total = raw.len();
    let mut missing_amounts = 0;
    let mut records = Vec::with_capacity(total);
    for r in raw {
        let date = parse_date(&r.order_date, order)
            .or_else(|| fallback.and_then(|o| parse_date(&r.order_date, o)));
        let Some(order_date) = date else {
            debug!(value = %r.order_date, "dropping row with unparsable order date");
            continue;
        };
        if r.sales.is_none() || r.profit.is_none() {
            missing_amounts += 1;
        }
        records.push(Record {
            order_date,
            region: r.region.trim().to_string(),
            state: r.state.trim().to_string(),
            category: r.category.trim().to_string(),
            product: r
                .product
                .or(r.sub_category)
                .map(|p| p.trim().to_string())
                .unwrap_or_default(),
            sales: r.sales.unwrap_or_default(),
            profit: r.profit.unwrap_or_default(),
        });
    }
    let dropped = total - records.len();
    if dropped > 0 {
        warn!(dropped, "dropped rows with unparsable order dates");
    }
    if missing_amounts > 0 {
        warn!(rows = missing_amounts, "treating unparsable amounts as zero");
    }
    info!(rows = records.len(), "loaded sales data");
    Ok(records)
}
