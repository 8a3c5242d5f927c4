//! End-to-end questions against the sample Superstore extract in `testdata/`.

use chrono::NaiveDate;
use sales_insight::{
    ask_question, DateOrder, Dimension, Filters, Metric, SalesAssistant, TimeRange, TimeWindow,
};

fn assistant() -> SalesAssistant {
    SalesAssistant::from_csv("testdata/superstore.csv", DateOrder::Auto).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn profit_by_region_last_year() {
    let assistant = assistant();
    let answer = assistant.ask("profit by region last year");
    assert_eq!(answer.intent.metric, Metric::Profit);
    assert_eq!(answer.intent.group_by, Some(Dimension::Region));
    assert_eq!(answer.range, TimeRange::new(day(2016, 1, 1), day(2016, 12, 31)));
    let amounts: Vec<_> = answer.result.rows().iter().map(|(_, a)| *a).collect();
    assert!(amounts.windows(2).all(|w| w[0] >= w[1]), "{amounts:?}");
    assert_eq!(
        answer.to_string(),
        "Profit (2016-01-01-2016-12-31) by Region — East: $250.00; Central: $120.00; West: $44.43; South: $-383.03."
    );
}

#[test]
fn total_sales_last_month_in_state_code() {
    let answer = assistant().ask("total sales last month in CA");
    assert_eq!(answer.range, TimeRange::new(day(2017, 11, 1), day(2017, 11, 30)));
    assert_eq!(
        answer.intent.filters,
        Filters::from([(Dimension::State, "California".into())])
    );
    assert_eq!(answer.intent.group_by, None);
    assert_eq!(
        answer.to_string(),
        "Sales in California (2017-11-01-2017-11-30) — $300.50."
    );
}

#[test]
fn top_categories_in_explicit_year() {
    let answer = assistant().ask("top 3 categories by sales in 2017");
    assert!(answer.intent.filters.is_empty());
    assert_eq!(answer.intent.group_by, Some(Dimension::Category));
    assert_eq!(answer.intent.time_window, Some(TimeWindow::ExplicitYear(2017)));
    assert_eq!(answer.result.len(), 3);
    assert_eq!(
        answer.to_string(),
        "Sales (2017-01-01-2017-12-30) by Category — Technology: $3,700.50; Furniture: $350.00; Office Supplies: $110.00."
    );
}

#[test]
fn top_n_returns_at_most_n_groups() {
    let answer = assistant().ask("top 2 categories by sales in 2017");
    let labels: Vec<_> = answer.result.rows().iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, ["Technology", "Furniture"]);
}

#[test]
fn unrecognised_question_totals_everything() {
    let answer = assistant().ask("xyz abc");
    assert_eq!(answer.intent.metric, Metric::Sales);
    assert_eq!(answer.range, TimeRange::new(day(2014, 1, 3), day(2017, 12, 30)));
    assert_eq!(
        answer.to_string(),
        "Sales (2014-01-03-2017-12-30) — $7,650.79."
    );
}

#[test]
fn this_year_ends_at_latest_order() {
    let answer = assistant().ask("profit this year by month name");
    assert_eq!(answer.range, TimeRange::new(day(2017, 1, 1), day(2017, 12, 30)));
    assert_eq!(
        answer.to_string(),
        "Profit (2017-01-01-2017-12-30) by MonthName — Feb: $900.00; Nov: $130.10; Dec: $6.00."
    );
}

#[test]
fn product_filter_matches_dataset_names() {
    let answer = assistant().ask("sales of apple iphone 5 by state");
    assert_eq!(
        answer.intent.filters,
        Filters::from([(Dimension::Product, "Apple iPhone 5".into())])
    );
    assert_eq!(
        answer.to_string(),
        "Sales in Apple iPhone 5 (2014-01-03-2017-12-30) by State — New York: $1,000.00; Illinois: $500.00; California: $200.50."
    );
}

#[test]
fn no_matching_rows_reports_no_data() {
    let answer = assistant().ask("sales in ohio last year");
    assert!(answer.is_empty());
    assert_eq!(
        answer.to_string(),
        "Sales in Ohio (2016-01-01-2016-12-31): no data found."
    );
}

#[test]
fn ask_question_fn_loads_and_answers() {
    assert_eq!(
        ask_question("furniture profit in 2015", "testdata/superstore.csv").unwrap(),
        "Profit in Furniture (2015-01-01-2015-12-31) — $222.58."
    );
    assert!(ask_question("sales", "testdata/bogus.csv").is_err());
}

#[test]
fn product_name_number_is_not_a_year() {
    let answer = assistant().ask("sales of xerox 1967");
    assert_eq!(answer.intent.time_window, None);
    assert_eq!(
        answer.to_string(),
        "Sales in Xerox 1967 (2014-01-03-2017-12-30) — $100.00."
    );
}
