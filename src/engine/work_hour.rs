//! Attendance to credit conversion.
//!
//! A work-hour deviation is the difference between hours worked and the
//! 8 hour baseline, expressed as a fraction of a 24 hour day and rounded to
//! three decimals. Overtime earns 1.5x credit, undertime costs 1x.
use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::utils::date_utils::is_weekend;

pub const BASELINE_HOURS: i64 = 8;
/// 0.33 of a day, credited for any weekend presence that would not earn otherwise.
pub const MIN_WEEKEND_CREDIT: Decimal = Decimal::from_parts(33, 0, 0, false, 2);
/// 1.5x for overtime.
pub const OVERTIME_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

const HOURS_PER_DAY: i64 = 24;
const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditConversion {
    pub deviation: Decimal,
    pub earned: Decimal,
    pub deducted: Decimal,
    pub new_balance: Decimal,
}

/// Signed fraction-of-day deviation for one clock-in/clock-out pair.
pub fn normalize_work_hour(time_in: NaiveDateTime, time_out: NaiveDateTime) -> Decimal {
    let seconds = (time_out - time_in).num_seconds();
    if seconds <= 0 {
        return Decimal::ZERO;
    }

    let worked_hours = Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR);
    let deviation = ((worked_hours - Decimal::from(BASELINE_HOURS)) / Decimal::from(HOURS_PER_DAY))
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero);

    if is_weekend(time_in.date()) && deviation <= Decimal::ZERO {
        if deviation.is_zero() {
            return MIN_WEEKEND_CREDIT;
        }
        return deviation.abs();
    }

    deviation
}

pub fn convert_to_credit(deviation: Decimal, current_balance: Decimal) -> CreditConversion {
    let mut conversion = CreditConversion {
        deviation,
        earned: Decimal::ZERO,
        deducted: Decimal::ZERO,
        new_balance: current_balance,
    };

    if deviation > Decimal::ZERO {
        conversion.earned = deviation * OVERTIME_MULTIPLIER;
        conversion.new_balance = current_balance + conversion.earned;
    } else if deviation < Decimal::ZERO {
        conversion.deducted = deviation.abs();
        conversion.new_balance = current_balance - conversion.deducted;
    }

    conversion
}

/// Preview of what a clock-out would do to a balance.
pub fn convert_attendance(
    time_in: NaiveDateTime,
    time_out: NaiveDateTime,
    current_balance: Decimal,
) -> CreditConversion {
    convert_to_credit(normalize_work_hour(time_in, time_out), current_balance)
}
