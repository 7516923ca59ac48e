use chrono::{FixedOffset, NaiveDate, Utc};
use regex::Regex;

/// Offset between the ROC calendar used on exchange pages and Gregorian years.
pub const ROC_YEAR_OFFSET: i32 = 1911;

pub fn yyyymmdd(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Calendar date at the exchange, `offset_hours` east of UTC.
pub fn today_in_offset(offset_hours: i32) -> NaiveDate {
    match FixedOffset::east_opt(offset_hours * 3600) {
        Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
        None => Utc::now().date_naive(),
    }
}

/// Canonical `YYYYMMDD` for the first date found in `text`.
///
/// `YYYY/MM/DD` wins over the ROC form `NNN/MM/DD`. Anything else yields
/// `today`: a date field never blocks snapshot production.
pub fn normalize_date(text: &str, today: NaiveDate) -> String {
    let text = text.trim();

    if let Ok(re) = Regex::new(r"(\d{4})/(\d{2})/(\d{2})") {
        if let Some(caps) = re.captures(text) {
            return format!("{}{}{}", &caps[1], &caps[2], &caps[3]);
        }
    }

    if let Ok(re) = Regex::new(r"(?:^|\D)(\d{2,3})/(\d{2})/(\d{2})") {
        if let Some(caps) = re.captures(text) {
            if let Ok(roc_year) = caps[1].parse::<i32>() {
                return format!("{}{}{}", roc_year + ROC_YEAR_OFFSET, &caps[2], &caps[3]);
            }
        }
    }

    yyyymmdd(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_gregorian() {
        assert_eq!(normalize_date("2024/01/09", today()), "20240109");
        assert_eq!(normalize_date("日期：2024/01/09", today()), "20240109");
    }

    #[test]
    fn test_roc_calendar() {
        assert_eq!(normalize_date("113/01/09", today()), "20240109");
        assert_eq!(normalize_date("日期 99/12/31", today()), "20101231");
    }

    #[test]
    fn test_unparsable_falls_back_to_today() {
        let out = normalize_date("no date here", today());
        assert_eq!(out, "20250314");
        assert_eq!(out.len(), 8);
        assert_eq!(normalize_date("2024-01-09", today()), "20250314");
    }

    #[test]
    fn test_today_in_offset_is_a_real_date() {
        let taipei = today_in_offset(8);
        let utc = Utc::now().date_naive();
        assert!((taipei - utc).num_days().abs() <= 1);
    }
}
