// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{get_base_currency, set_base_currency};
use crate::engine::CurrencyConverter;
use crate::rates::SqliteRates;
use crate::utils::{parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-base", sub)) => {
            let ccy = sub.get_one::<String>("currency").unwrap().to_uppercase();
            set_base_currency(conn, &ccy)?;
            println!("Base currency set to {}", ccy);
        }
        Some(("set", sub)) => {
            let date = parse_date(sub.get_one::<String>("date").unwrap())?;
            let base = sub.get_one::<String>("base").unwrap().to_uppercase();
            let quote = sub.get_one::<String>("quote").unwrap().to_uppercase();
            let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
            set_rate(conn, date, &base, &quote, rate)?;
            println!("{} 1 {} = {} {}", date, base, rate, quote);
        }
        Some(("list", _)) => list_rates(conn)?,
        Some(("convert", sub)) => convert_amount(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn set_rate(
    conn: &Connection,
    date: NaiveDate,
    base: &str,
    quote: &str,
    rate: Decimal,
) -> Result<()> {
    if rate <= Decimal::ZERO {
        anyhow::bail!("Rate must be positive, got {}", rate);
    }
    conn.execute(
        "INSERT INTO fx_rates(date, base, quote, rate) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(date, base, quote) DO UPDATE SET rate=excluded.rate",
        params![date.to_string(), base, quote, rate.to_string()],
    )?;
    Ok(())
}

fn list_rates(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT date, base, quote, rate FROM fx_rates ORDER BY date DESC, base, quote LIMIT 50",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (d, b, q, r) = row?;
        data.push(vec![d, b, q, r]);
    }
    println!("{}", pretty_table(&["Date", "Base", "Quote", "Rate"], data));
    Ok(())
}

fn convert_amount(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let from = sub.get_one::<String>("from").unwrap().to_uppercase();
    let to = sub.get_one::<String>("to").unwrap().to_uppercase();
    let rates = SqliteRates::new(conn, get_base_currency(conn)?);
    let res = rates.convert(amount, &from, &to, date)?;
    println!("{} {} -> {:.4} {}", amount, from, res, to);
    Ok(())
}
