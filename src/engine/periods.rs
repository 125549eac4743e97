// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bucketing of transaction legs into fixed calendar periods.
//!
//! A period list is built once, then mutated in place by [`aggregate`] as
//! many times as needed; sums only ever accumulate, so feeding several
//! accounts into the same list merges them. The list itself is not
//! synchronised: concurrent callers must each own their list and merge
//! afterwards with [`merge_into`].

use crate::engine::decimal;
use crate::engine::path;
use crate::error::{Error, Result};
use crate::models::{Account, Split};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub debit: Decimal,
    pub credit: Decimal,
    pub total: Decimal,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `2024-Q2` for a calendar quarter, `2024` for a calendar year,
    /// otherwise the explicit range.
    pub fn label(&self) -> String {
        let next = self.end.succ_opt();
        let aligned = self.start.day() == 1 && next.is_some_and(|n| n.day() == 1);
        if aligned && next.is_some_and(|n| months_between(self.start, n) == 3) {
            if (self.start.month() - 1) % 3 == 0 {
                return format!("{}-Q{}", self.start.year(), (self.start.month() - 1) / 3 + 1);
            }
        } else if aligned
            && self.start.month() == 1
            && next.is_some_and(|n| months_between(self.start, n) == 12)
        {
            return self.start.year().to_string();
        }
        format!("{}..{}", self.start, self.end)
    }

    fn add(&mut self, amount: Decimal) -> Result<()> {
        let (start, end) = (self.start, self.end);
        let overflow = move || Error::Overflow(format!("period {start}..={end}"));
        if amount < Decimal::ZERO {
            self.credit = self.credit.checked_add(amount).ok_or_else(overflow)?;
        } else {
            self.debit = self.debit.checked_add(amount).ok_or_else(overflow)?;
        }
        self.total = self.total.checked_add(amount).ok_or_else(overflow)?;
        Ok(())
    }
}

fn months_between(a: NaiveDate, b: NaiveDate) -> i32 {
    (b.year() - a.year()) * 12 + b.month() as i32 - a.month() as i32
}

/// Builds zeroed periods from `(start, end)` pairs, rejecting any list that
/// is not strictly ordered and non-overlapping.
pub fn periods_from<I>(boundaries: I) -> Result<Vec<Period>>
where
    I: IntoIterator<Item = (NaiveDate, NaiveDate)>,
{
    let mut out: Vec<Period> = Vec::new();
    for (start, end) in boundaries {
        if start > end {
            return Err(Error::MalformedPeriods(format!(
                "period starts {start} after it ends {end}"
            )));
        }
        if let Some(prev) = out.last() {
            if prev.end >= start {
                return Err(Error::MalformedPeriods(format!(
                    "period {start}..={end} overlaps or precedes {}..={}",
                    prev.start, prev.end
                )));
            }
        }
        out.push(Period::new(start, end));
    }
    Ok(out)
}

pub fn period_starts(periods: &[Period]) -> Vec<NaiveDate> {
    periods.iter().map(|p| p.start).collect()
}

/// Index of the latest start `<= date`, if any.
pub fn locate(sorted_starts: &[NaiveDate], date: NaiveDate) -> Option<usize> {
    sorted_starts.partition_point(|s| *s <= date).checked_sub(1)
}

/// Adds each split to the period containing its transaction date.
///
/// Splits dated before the first period or after the last one are skipped.
/// A split that lands in a gap between two periods is an
/// [`Error::InvariantViolation`]. On any error `periods` is left as it was.
pub fn aggregate_splits<'a, I>(
    splits: I,
    sorted_starts: &[NaiveDate],
    periods: &mut [Period],
) -> Result<()>
where
    I: IntoIterator<Item = &'a Split>,
{
    if sorted_starts.len() != periods.len() {
        return Err(Error::MalformedPeriods(format!(
            "{} period starts for {} periods",
            sorted_starts.len(),
            periods.len()
        )));
    }
    let Some(last_end) = periods.last().map(|p| p.end) else {
        return Ok(());
    };

    let mut staged = periods.to_vec();
    for split in splits {
        let date = split.date();
        let idx = match locate(sorted_starts, date) {
            Some(i) if date <= last_end => i,
            _ => {
                debug!(%date, txn = split.txn.id, "split outside reporting window");
                continue;
            }
        };
        let period = &mut staged[idx];
        if !period.contains(date) {
            return Err(Error::InvariantViolation {
                date,
                start: period.start,
                end: period.end,
            });
        }
        let amount = decimal::convert(split.amount)?;
        trace!(%date, %amount, period = idx, "bucketed split");
        period.add(amount)?;
    }
    periods.clone_from_slice(&staged);
    Ok(())
}

/// [`aggregate_splits`] over the splits posted directly to `account`.
pub fn aggregate(
    account: &Account,
    sorted_starts: &[NaiveDate],
    periods: &mut [Period],
) -> Result<()> {
    aggregate_splits(account.splits(), sorted_starts, periods)
}

/// [`aggregate`] over `account` and every descendant, one account at a time,
/// merged into the same `periods`. An error in any account leaves `periods`
/// as it was.
pub fn aggregate_subtree(
    account: &Account,
    sorted_starts: &[NaiveDate],
    periods: &mut [Period],
) -> Result<()> {
    let mut staged = periods.to_vec();
    for node in account.subtree() {
        aggregate(node, sorted_starts, &mut staged)?;
    }
    periods.clone_from_slice(&staged);
    Ok(())
}

/// Adds the sums of `from` into `into`; both lists must share boundaries.
pub fn merge_into(into: &mut [Period], from: &[Period]) -> Result<()> {
    if into.len() != from.len() {
        return Err(Error::MalformedPeriods(format!(
            "cannot merge {} periods into {}",
            from.len(),
            into.len()
        )));
    }
    for (dst, src) in into.iter_mut().zip(from) {
        if dst.start != src.start || dst.end != src.end {
            return Err(Error::MalformedPeriods(format!(
                "boundary mismatch {}..={} vs {}..={}",
                dst.start, dst.end, src.start, src.end
            )));
        }
        let (start, end) = (dst.start, dst.end);
        let overflow = move || Error::Overflow(format!("period {start}..={end}"));
        dst.debit = dst.debit.checked_add(src.debit).ok_or_else(overflow)?;
        dst.credit = dst.credit.checked_add(src.credit).ok_or_else(overflow)?;
        dst.total = dst.total.checked_add(src.total).ok_or_else(overflow)?;
    }
    Ok(())
}

/// Flow figures for one resolved account subtree, ready for a report sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReport {
    pub account: String,
    pub periods: Vec<Period>,
}

/// Resolves `account_path` under `root` and rolls its subtree up into fresh
/// periods built from `boundaries`.
pub fn flow_report<S, I>(root: &Account, account_path: &[S], boundaries: I) -> Result<FlowReport>
where
    S: AsRef<str>,
    I: IntoIterator<Item = (NaiveDate, NaiveDate)>,
{
    let account = path::resolve(root, account_path)?;
    let mut periods = periods_from(boundaries)?;
    let starts = period_starts(&periods);
    aggregate_subtree(account, &starts, &mut periods)?;
    Ok(FlowReport {
        account: path::label_for(account, account_path),
        periods,
    })
}
