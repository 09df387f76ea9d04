use chrono::{Datelike, NaiveDate, Weekday};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` form value.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

#[inline]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Count of Mon-Fri days in `[start, end]`, 0 when `end < start`.
pub fn business_days_inclusive(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }

    let total = (end - start).num_days() + 1;
    let full_weeks = total / 7;
    let mut days = full_weeks * 5;

    let mut date = start + chrono::Duration::days(full_weeks * 7);
    while date <= end {
        if !is_weekend(date) {
            days += 1;
        }
        date += chrono::Duration::days(1);
    }

    days as u32
}

pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}
