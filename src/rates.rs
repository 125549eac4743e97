// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::CurrencyConverter;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use tracing::debug;

/// Conversion backed by the `fx_rates` table, closest on-or-before rate.
///
/// Rates are stored base->quote. A pair is tried directly, then as a
/// reciprocal, then triangulated through `hub` (the book's base currency).
pub struct SqliteRates<'a> {
    conn: &'a Connection,
    hub: String,
}

impl<'a> SqliteRates<'a> {
    pub fn new(conn: &'a Connection, hub: impl Into<String>) -> Self {
        Self {
            conn,
            hub: hub.into(),
        }
    }

    pub fn find_rate(&self, date: NaiveDate, base: &str, quote: &str) -> Result<Option<Decimal>> {
        let mut stmt = self.conn.prepare(
            "SELECT rate FROM fx_rates
             WHERE base=?1 AND quote=?2 AND date<=?3
             ORDER BY date DESC LIMIT 1",
        )?;
        let r: Option<String> = stmt
            .query_row(params![base, quote, date.to_string()], |r| r.get(0))
            .optional()?;
        match r {
            Some(s) => {
                let d = s.parse::<Decimal>().map_err(|_| Error::Conversion {
                    value: s.clone(),
                    reason: "stored fx rate is not a decimal",
                })?;
                // a zero rate is unusable in either direction
                Ok((!d.is_zero()).then_some(d))
            }
            None => Ok(None),
        }
    }

    fn direct(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Option<Decimal>> {
        let overflow = || Error::Overflow(format!("{amount} {from} in {to}"));
        if let Some(r) = self.find_rate(date, from, to)? {
            return amount.checked_mul(r).ok_or_else(overflow).map(Some);
        }
        if let Some(r) = self.find_rate(date, to, from)? {
            return amount.checked_div(r).ok_or_else(overflow).map(Some);
        }
        Ok(None)
    }
}

impl CurrencyConverter for SqliteRates<'_> {
    fn convert(&self, amount: Decimal, from: &str, to: &str, date: NaiveDate) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }
        if let Some(v) = self.direct(amount, from, to, date)? {
            return Ok(v);
        }
        if from != self.hub && to != self.hub {
            if let Some(via_hub) = self.direct(amount, from, &self.hub, date)? {
                if let Some(v) = self.direct(via_hub, &self.hub, to, date)? {
                    debug!(from, to, hub = %self.hub, %date, "triangulated fx conversion");
                    return Ok(v);
                }
            }
        }
        Err(Error::MissingRate {
            from: from.to_string(),
            to: to.to_string(),
            date,
        })
    }
}
