// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::get_base_currency;
use crate::engine::{CurrencyConverter, decimal};
use crate::error::Error;
use crate::models::Rational;
use crate::rates::SqliteRates;
use crate::utils::pretty_table;
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = check(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// `[issue, detail]` pairs for everything that would make a report fail.
pub fn check(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Amounts the engine cannot convert, and transactions whose legs do not net to zero
    let mut stmt = conn.prepare(
        "SELECT s.tx_id, t.date, s.value_num, s.value_denom FROM splits s
         JOIN transactions t ON s.tx_id=t.id ORDER BY s.tx_id, s.id",
    )?;
    let mut cur = stmt.query([])?;
    let mut sums: BTreeMap<i64, (String, Option<Decimal>)> = BTreeMap::new();
    while let Some(r) = cur.next()? {
        let tx_id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let amount = Rational::new(r.get(2)?, r.get(3)?);
        let entry = sums.entry(tx_id).or_insert((date, Some(Decimal::ZERO)));
        match decimal::convert(amount) {
            Ok(v) => entry.1 = entry.1.and_then(|s| s.checked_add(v)),
            Err(e) => {
                rows.push(vec!["bad_amount".into(), format!("tx {}: {}", tx_id, e)]);
                entry.1 = None;
            }
        }
    }
    for (tx_id, (date, sum)) in sums {
        if let Some(s) = sum {
            if !s.is_zero() {
                rows.push(vec![
                    "unbalanced_tx".into(),
                    format!("tx {} on {} nets to {}", tx_id, date, s),
                ]);
            }
        }
    }

    // 2) FX coverage gaps: accounts in another currency with no usable rate to base
    let base = get_base_currency(conn)?;
    let rates = SqliteRates::new(conn, &base);
    let mut stmt2 = conn.prepare(
        "SELECT a.commodity, MIN(t.date) FROM splits s
         JOIN accounts a ON s.account_id=a.id
         JOIN transactions t ON s.tx_id=t.id
         WHERE a.commodity != ?1
         GROUP BY a.commodity ORDER BY a.commodity",
    )?;
    let mut cur2 = stmt2.query([&base])?;
    while let Some(r) = cur2.next()? {
        let ccy: String = r.get(0)?;
        let first: NaiveDate = r.get(1)?;
        match rates.convert(Decimal::ONE, &ccy, &base, first) {
            Ok(_) => {}
            Err(Error::MissingRate { .. }) => {
                rows.push(vec![
                    "missing_fx".into(),
                    format!("{}->{} on or before {}", ccy, base, first),
                ]);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(rows)
}
