//! Calendar and leave-type rule checks for a leave filing.
//!
//! [`validate`] is pure: it reads no ledger state and takes `today` as an
//! argument. Balance sufficiency is the workflow's job.
use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EligibilityError;
use crate::model::{leave_request::LeaveRequest, leave_type::LeaveType};
use crate::utils::date_utils::{business_days_inclusive, is_weekend, parse_date, year_bounds};

/// A request that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub start_date: NaiveDate,
    /// As filed.
    pub end_date: NaiveDate,
    /// `end_date`, clamped to today for backdated leave types.
    pub adjusted_end_date: NaiveDate,
    pub duration_days: u32,
}

/// Checks run in order and the first failure wins.
pub fn validate(
    request: &LeaveRequest,
    leave_type: &LeaveType,
    today: NaiveDate,
) -> Result<Eligibility, EligibilityError> {
    // 1. presence
    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(EligibilityError::MissingFields(missing));
    }

    // 2. parseable, ordered dates
    let (start, end) = parse_span(request)?;

    // 3. weekend boundaries
    for date in [start, end] {
        if is_weekend(date) {
            return Err(EligibilityError::WeekendBoundary(date));
        }
    }

    // 4. use-it-or-lose-it types stay inside the current year
    if !leave_type.is_carried_over {
        let (jan_1, dec_31) = year_bounds(today.year())
            .ok_or_else(|| EligibilityError::InvalidDate(format!("year {}", today.year())))?;
        if start < jan_1 || end > dec_31 {
            return Err(EligibilityError::OutOfYearRange(today.year()));
        }
    }

    // 5. notice window
    let adjusted_end = check_notice(leave_type, start, end, today)?;

    // 6. trivial span
    if start == end && !leave_type.is_same_day_only() {
        return Err(EligibilityError::ZeroLengthLeave);
    }

    // 7. business days
    let duration_days = business_days_inclusive(start, adjusted_end);

    // 8. per-request cap
    if leave_type.base_value > Decimal::ZERO && Decimal::from(duration_days) > leave_type.base_value
    {
        return Err(EligibilityError::ExceedsMaxDuration {
            requested: duration_days,
            max: leave_type.base_value,
        });
    }

    Ok(Eligibility {
        start_date: start,
        end_date: end,
        adjusted_end_date: adjusted_end,
        duration_days,
    })
}

fn parse_span(request: &LeaveRequest) -> Result<(NaiveDate, NaiveDate), EligibilityError> {
    let parse = |field: &str, value: &Option<String>| {
        let raw = value.as_deref().unwrap_or_default();
        parse_date(raw)
            .ok_or_else(|| EligibilityError::InvalidDate(format!("{field} '{raw}' is not YYYY-MM-DD")))
    };

    let start = parse("start_date", &request.start_date)?;
    let end = parse("end_date", &request.end_date)?;

    if end < start {
        return Err(EligibilityError::InvalidDate(format!(
            "end_date {end} is before start_date {start}"
        )));
    }

    Ok((start, end))
}

/// Returns the end date to charge, clamped for backdated leave.
fn check_notice(
    leave_type: &LeaveType,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, EligibilityError> {
    let days_until_start = (start - today).num_days();

    match leave_type.notice_day {
        required if required > 0 => {
            if days_until_start < i64::from(required) {
                return Err(EligibilityError::InsufficientNotice {
                    required,
                    actual: days_until_start,
                });
            }
            Ok(end)
        }
        0 if leave_type.is_same_day_only() => {
            if start != today || end != today {
                return Err(EligibilityError::SameDayOnly);
            }
            Ok(end)
        }
        0 => {
            if days_until_start < 0 {
                return Err(EligibilityError::PastDate);
            }
            Ok(end)
        }
        backdate => {
            let window = backdate.unsigned_abs();
            // a window reaching past the calendar range is unbounded
            let earliest = today
                .checked_sub_days(Days::new(u64::from(window)))
                .unwrap_or(NaiveDate::MIN);

            if start < earliest || start > today || end < earliest {
                return Err(EligibilityError::BackdateWindow(window));
            }
            Ok(end.min(today))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_type::GrantType;

    // 2026-03-04 is a Wednesday
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
    }

    fn leave_type(notice_day: i32, rule_id: i32) -> LeaveType {
        LeaveType {
            id: 1,
            name: "Vacation".into(),
            is_carried_over: true,
            notice_day,
            rule_id,
            base_value: Decimal::from(15),
            grant_type: GrantType::Default,
        }
    }

    fn request(start: &str, end: &str) -> LeaveRequest {
        LeaveRequest {
            employee_id: Some(10),
            leave_type_id: Some(1),
            start_date: Some(start.into()),
            end_date: Some(end.into()),
            reason: Some("family trip".into()),
        }
    }

    #[test]
    fn missing_fields_win_over_everything() {
        let mut req = request("2026-03-07", "not-a-date");
        req.reason = None;

        let err = validate(&req, &leave_type(3, 1), today()).unwrap_err();
        assert_eq!(err, EligibilityError::MissingFields(vec!["reason"]));
    }

    #[test]
    fn malformed_or_reversed_dates() {
        let err = validate(&request("2026-13-01", "2026-03-20"), &leave_type(0, 1), today());
        assert!(matches!(err, Err(EligibilityError::InvalidDate(_))));

        let err = validate(&request("2026-03-20", "2026-03-16"), &leave_type(0, 1), today());
        assert!(matches!(err, Err(EligibilityError::InvalidDate(_))));
    }

    #[test]
    fn saturday_start_is_a_weekend_boundary() {
        let err = validate(&request("2026-03-07", "2026-03-09"), &leave_type(0, 1), today());
        assert_eq!(
            err,
            Err(EligibilityError::WeekendBoundary(
                NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
            ))
        );

        let err = validate(&request("2026-03-06", "2026-03-08"), &leave_type(0, 1), today());
        assert!(matches!(err, Err(EligibilityError::WeekendBoundary(_))));
    }

    #[test]
    fn non_carry_over_types_stay_in_current_year() {
        let mut lt = leave_type(0, 1);
        lt.is_carried_over = false;

        let err = validate(&request("2026-12-30", "2027-01-04"), &lt, today());
        assert_eq!(err, Err(EligibilityError::OutOfYearRange(2026)));

        // starts in the previous year
        let err = validate(&request("2025-12-29", "2026-01-02"), &lt, today());
        assert_eq!(err, Err(EligibilityError::OutOfYearRange(2026)));

        lt.is_carried_over = true;
        assert!(validate(&request("2026-12-30", "2027-01-04"), &lt, today()).is_ok());
    }

    #[test]
    fn notice_window_boundary() {
        let lt = leave_type(3, 1);
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        // two days ahead
        let err = validate(&request("2026-03-04", "2026-03-06"), &lt, monday);
        assert_eq!(
            err,
            Err(EligibilityError::InsufficientNotice {
                required: 3,
                actual: 2
            })
        );

        // three days ahead
        let ok = validate(&request("2026-03-05", "2026-03-06"), &lt, monday).unwrap();
        assert_eq!(ok.duration_days, 2);
    }

    #[test]
    fn same_day_only_rule() {
        let lt = leave_type(0, 3);

        let ok = validate(&request("2026-03-04", "2026-03-04"), &lt, today()).unwrap();
        assert_eq!(ok.duration_days, 1);
        assert_eq!(ok.adjusted_end_date, today());

        let err = validate(&request("2026-03-05", "2026-03-05"), &lt, today());
        assert_eq!(err, Err(EligibilityError::SameDayOnly));

        let err = validate(&request("2026-03-04", "2026-03-05"), &lt, today());
        assert_eq!(err, Err(EligibilityError::SameDayOnly));
    }

    #[test]
    fn zero_notice_rejects_past_dates() {
        let lt = leave_type(0, 1);

        let err = validate(&request("2026-03-03", "2026-03-05"), &lt, today());
        assert_eq!(err, Err(EligibilityError::PastDate));

        assert!(validate(&request("2026-03-04", "2026-03-05"), &lt, today()).is_ok());
    }

    #[test]
    fn backdate_window_and_clamp() {
        let lt = leave_type(-5, 1);

        // inside the window
        let ok = validate(&request("2026-02-27", "2026-03-03"), &lt, today()).unwrap();
        assert_eq!(ok.adjusted_end_date, ok.end_date);
        assert_eq!(ok.duration_days, 3);

        // older than five days
        let err = validate(&request("2026-02-26", "2026-03-03"), &lt, today());
        assert_eq!(err, Err(EligibilityError::BackdateWindow(5)));

        // future start
        let err = validate(&request("2026-03-05", "2026-03-06"), &lt, today());
        assert_eq!(err, Err(EligibilityError::BackdateWindow(5)));

        // end after today is clamped
        let ok = validate(&request("2026-03-02", "2026-03-10"), &lt, today()).unwrap();
        assert_eq!(ok.end_date, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(ok.adjusted_end_date, today());
        assert_eq!(ok.duration_days, 3);
    }

    #[test]
    fn backdate_window_beyond_calendar_range_is_unbounded() {
        let lt = leave_type(i32::MIN, 1);

        let ok = validate(&request("2026-03-02", "2026-03-03"), &lt, today()).unwrap();
        assert_eq!(ok.duration_days, 2);

        let err = validate(&request("2026-03-05", "2026-03-06"), &lt, today());
        assert_eq!(
            err,
            Err(EligibilityError::BackdateWindow(i32::MIN.unsigned_abs()))
        );
    }

    #[test]
    fn single_day_span_is_rejected() {
        let err = validate(&request("2026-03-10", "2026-03-10"), &leave_type(0, 1), today());
        assert_eq!(err, Err(EligibilityError::ZeroLengthLeave));
    }

    #[test]
    fn monday_to_friday_is_five_days() {
        let ok = validate(&request("2026-03-09", "2026-03-13"), &leave_type(0, 1), today()).unwrap();
        assert_eq!(ok.duration_days, 5);
    }

    #[test]
    fn duration_capped_by_base_value() {
        let mut lt = leave_type(0, 1);
        lt.base_value = Decimal::from(3);

        let err = validate(&request("2026-03-09", "2026-03-13"), &lt, today());
        assert_eq!(
            err,
            Err(EligibilityError::ExceedsMaxDuration {
                requested: 5,
                max: Decimal::from(3)
            })
        );

        // zero base value means uncapped
        lt.base_value = Decimal::ZERO;
        assert!(validate(&request("2026-03-09", "2026-03-13"), &lt, today()).is_ok());
    }
}
