// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use chrono::NaiveDate;

/// Lazily yields `count` back-to-back `(start, end)` ranges of
/// `months_per_period` calendar months each, both ends inclusive.
///
/// Cloning (or rebuilding with the same arguments) restarts the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodBoundaries {
    year: i32,
    month0: u32,
    months_per_period: u32,
    remaining: usize,
}

impl PeriodBoundaries {
    pub fn new(
        start_year: i32,
        start_month: u32,
        months_per_period: u32,
        count: usize,
    ) -> Result<Self> {
        if !(1..=12).contains(&start_month) {
            return Err(Error::InvalidMonth(start_month));
        }
        if months_per_period == 0 {
            return Err(Error::MalformedPeriods(
                "a period must span at least one month".into(),
            ));
        }
        let out_of_range = || {
            Error::MalformedPeriods(format!(
                "{count} periods of {months_per_period} months from \
                 {start_year}-{start_month:02} leave the supported date range"
            ))
        };
        let month0 = start_month - 1;
        let span = u64::from(months_per_period)
            .checked_mul(count as u64)
            .ok_or_else(out_of_range)?;
        // intermediate boundaries lie between these two
        let (last_year, last_month0) =
            shift(start_year, month0, span).ok_or_else(out_of_range)?;
        if first_day(start_year, month0).is_none() || first_day(last_year, last_month0).is_none() {
            return Err(out_of_range());
        }
        Ok(Self {
            year: start_year,
            month0,
            months_per_period,
            remaining: count,
        })
    }

    fn advance(&mut self) -> Option<()> {
        let (year, month0) = shift(self.year, self.month0, u64::from(self.months_per_period))?;
        self.year = year;
        self.month0 = month0;
        Some(())
    }
}

fn first_day(year: i32, month0: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
}

/// `(year, month0)` moved forward by `months`, or `None` past `i32` years.
fn shift(year: i32, month0: u32, months: u64) -> Option<(i32, u32)> {
    let total = months.checked_add(u64::from(month0))?;
    let years = i32::try_from(total / 12).ok()?;
    Some((year.checked_add(years)?, (total % 12) as u32))
}

impl Iterator for PeriodBoundaries {
    type Item = (NaiveDate, NaiveDate);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let start = first_day(self.year, self.month0)?;
        self.advance()?;
        // last day of the period is the day before the next one begins
        let end = first_day(self.year, self.month0)?.pred_opt()?;
        self.remaining -= 1;
        Some((start, end))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for PeriodBoundaries {}

/// Three-month periods starting at `start_month` of `start_year`.
pub fn quarters(start_year: i32, start_month: u32, count: usize) -> Result<PeriodBoundaries> {
    PeriodBoundaries::new(start_year, start_month, 3, count)
}

/// Twelve-month periods starting at `start_month` of `start_year`.
pub fn years(start_year: i32, start_month: u32, count: usize) -> Result<PeriodBoundaries> {
    PeriodBoundaries::new(start_year, start_month, 12, count)
}
