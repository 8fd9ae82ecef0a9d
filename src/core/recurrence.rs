//! Recurrence date computation.
//!
//! One pure function shared by the income and payment stores. Works on the
//! stored calendar date only; no timezone conversion.

use crate::entities::Frequency;
use chrono::{Days, Months, NaiveDate};

/// Computes the next occurrence of `date` under `frequency`.
///
/// Returns `None` for `once`. Month-based frequencies land on the same
/// day-of-month and clamp to the last day when the target month is shorter
/// (Jan 31 + monthly → Feb 28/29); `annual` clamps Feb 29 to Feb 28 in
/// non-leap years. The clamping comes from chrono's month arithmetic.
#[must_use]
pub fn next_occurrence(date: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    match frequency {
        Frequency::Once => None,
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Biweekly => date.checked_add_days(Days::new(14)),
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
        Frequency::Quarterly => date.checked_add_months(Months::new(3)),
        Frequency::Annual => date.checked_add_months(Months::new(12)),
    }
}
