//! Turning one raw report page into figures

pub mod html;
pub mod locator;
pub mod snapshot;

pub use html::{page_text, parse_rows, ParsedCell, ParsedRow};
pub use locator::{locate, Dialect, LocatedRow};
pub use snapshot::{band_inconsistencies, build_snapshot};

use chrono::NaiveDate;
use regex::Regex;

use crate::error::ExtractError;
use crate::schema::{AggregateRow, NormalizedData};
use crate::text::{normalize_date, yyyymmdd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub date: String,
    pub row: LocatedRow,
    pub aggregate: AggregateRow,
    pub data: NormalizedData,
}

/// Report date from the page's `日期：` line, or `today`.
pub fn report_date(text: &str, today: NaiveDate) -> String {
    let Ok(re) = Regex::new(r"日期\s*[:：]\s*([0-9]{2,4}/[0-9]{2}/[0-9]{2})") else {
        return yyyymmdd(today);
    };
    match re.captures(text) {
        Some(caps) => normalize_date(&caps[1], today),
        None => yyyymmdd(today),
    }
}

pub fn parse_report(
    html: &str,
    label: &str,
    no_data_marker: &str,
    today: NaiveDate,
) -> Result<ParsedReport, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::EmptyResponse);
    }
    if !no_data_marker.is_empty() && html.contains(no_data_marker) && !html.contains(label) {
        return Err(ExtractError::NoData);
    }

    let rows = parse_rows(html);
    let row = locate(&rows, label)?;
    let aggregate = row.aggregate()?;
    let data = build_snapshot(&aggregate);
    let date = report_date(&page_text(html), today);

    Ok(ParsedReport {
        date,
        row,
        aggregate,
        data,
    })
}
