//! Month calendar: the ordered window of month-start dates the
//! simulator walks.

use crate::{
    config::CalendarConfig,
    error::{GenError, GenResult},
};
use chrono::{Datelike, Months, NaiveDate};

/// Canonical month format in the exported table.
pub const MONTH_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCalendar {
    months: Vec<NaiveDate>,
}

impl MonthCalendar {
    /// `periods` month-start dates ending at (and including) the month of
    /// `config.end`, oldest first.
    pub fn from_config(config: &CalendarConfig) -> GenResult<Self> {
        if config.periods == 0 {
            return Err(GenError::invalid_config("calendar.periods", "must be > 0"));
        }
        let end = config.end.with_day(1).ok_or_else(|| {
            GenError::invalid_config("calendar.end", format!("{} has no first day", config.end))
        })?;
        let first = end
            .checked_sub_months(Months::new(config.periods - 1))
            .ok_or_else(|| GenError::invalid_config("calendar", "window starts before year 1"))?;

        let months = (0..config.periods)
            .map(|i| {
                first.checked_add_months(Months::new(i)).ok_or_else(|| {
                    GenError::invalid_config("calendar", "window runs past the supported range")
                })
            })
            .collect::<GenResult<Vec<_>>>()?;
        Ok(Self { months })
    }

    pub fn months(&self) -> &[NaiveDate] {
        &self.months
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

pub fn format_month(month: NaiveDate) -> String {
    month.format(MONTH_FORMAT).to_string()
}
