//! Partitions a reporting month into Monday–Sunday weeks.

use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::WeekDescriptor;

pub struct WeekBucketer;

impl WeekBucketer {
    /// Weeks covering `[month_start, month_end]`. Natural boundaries may spill into the
    /// adjacent months; the clamped boundaries never do.
    pub fn build_weeks(month_start: NaiveDate, month_end: NaiveDate) -> Vec<WeekDescriptor> {
        let mut weeks = Vec::new();
        if month_end < month_start {
            return weeks;
        }
        let mut start = Self::week_start(month_start);
        let mut sequence_number = 1;
        while start <= month_end {
            let end = start + Duration::days(6);
            weeks.push(WeekDescriptor {
                sequence_number,
                iso_week: Self::iso_week_number(start),
                start_date: start,
                end_date: end,
                start_boundary: start.max(month_start),
                end_boundary: end.min(month_end),
            });
            start += Duration::days(7);
            sequence_number += 1;
        }
        weeks
    }

    /// Sequence number of the week whose clamped range holds `date`.
    pub fn assign(weeks: &[WeekDescriptor], date: NaiveDate) -> Option<u32> {
        weeks
            .iter()
            .find(|week| week.contains(date))
            .map(|week| week.sequence_number)
    }

    /// Monday on or before `date`.
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(date.weekday().num_days_from_monday() as i64)
    }

    /// ISO week-of-year: the week belongs to the year holding its Thursday.
    pub fn iso_week_number(date: NaiveDate) -> u32 {
        let thursday = Self::week_start(date) + Duration::days(3);
        thursday.ordinal0() / 7 + 1
    }
}
