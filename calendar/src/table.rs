use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::CalendarError;

/// Maximum span `trading_days_in_range`/`holidays_in_range` will walk.
pub const MAX_RANGE_DAYS: i64 = 365;

/// An immutable snapshot of the holiday table. All lookups are O(log N)
/// tree operations, no I/O.
#[derive(Debug, Clone, Default)]
pub struct CalendarTable {
    holidays: BTreeSet<NaiveDate>,
}

impl CalendarTable {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !Self::is_weekend(date) && !self.is_holiday(date)
    }

    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut d = date + Duration::days(1);
        while !self.is_trading_day(d) {
            d += Duration::days(1);
        }
        d
    }

    pub fn previous_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut d = date - Duration::days(1);
        while !self.is_trading_day(d) {
            d -= Duration::days(1);
        }
        d
    }

    fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), CalendarError> {
        if end < start {
            return Err(CalendarError::Validation(format!(
                "range end {end} precedes start {start}"
            )));
        }
        if (end - start).num_days() > MAX_RANGE_DAYS {
            return Err(CalendarError::Validation(format!(
                "range {start}..{end} exceeds {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(())
    }

    pub fn holidays_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, CalendarError> {
        Self::check_range(start, end)?;
        Ok(self.holidays.range(start..=end).copied().collect())
    }

    pub fn trading_days_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, CalendarError> {
        Self::check_range(start, end)?;
        let mut out = Vec::new();
        let mut d = start;
        while d <= end {
            if self.is_trading_day(d) {
                out.push(d);
            }
            d += Duration::days(1);
        }
        Ok(out)
    }
}
