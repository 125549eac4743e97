// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::ExactDecimal;
use crate::models::Rational;
use crate::utils::{
    account_paths, id_for_account_path, maybe_print_json, parse_date, parse_split_arg,
    pretty_table,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let date = parse_date(sub.get_one::<String>("date").unwrap())?;
            let desc = sub.get_one::<String>("desc").unwrap();
            let legs = sub
                .get_many::<String>("split")
                .unwrap()
                .map(|s| parse_split_arg(s))
                .collect::<Result<Vec<_>>>()?;
            let id = add(conn, date, desc, &legs)?;
            println!("Recorded tx {} on {} '{}' ({} splits)", id, date, desc, legs.len());
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Records a balanced transaction. Legs are `(account path, amount)` and must
/// sum to exactly zero.
pub fn add(
    conn: &mut Connection,
    date: NaiveDate,
    description: &str,
    legs: &[(String, Decimal)],
) -> Result<i64> {
    if legs.len() < 2 {
        anyhow::bail!("A transaction needs at least two splits");
    }
    let mut sum = Decimal::ZERO;
    let mut stored = Vec::with_capacity(legs.len());
    for (path, amount) in legs {
        sum = sum
            .checked_add(*amount)
            .with_context(|| format!("Splits overflow when summed at {}={}", path, amount))?;
        let r = Rational::from_decimal(*amount)
            .with_context(|| format!("Amount {} is out of range for the ledger", amount))?;
        stored.push((path, r));
    }
    if !sum.is_zero() {
        anyhow::bail!("Transaction does not balance: splits sum to {}", sum);
    }

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO transactions(date, description) VALUES (?1, ?2)",
        params![date.to_string(), description],
    )?;
    let tx_id = tx.last_insert_rowid();
    for (path, r) in stored {
        let account_id = id_for_account_path(&tx, path)?;
        tx.execute(
            "INSERT INTO splits(tx_id, account_id, value_num, value_denom) VALUES (?1, ?2, ?3, ?4)",
            params![tx_id, account_id, r.num, r.denom],
        )?;
    }
    tx.commit()?;
    Ok(tx_id)
}

#[derive(Serialize)]
pub struct SplitRow {
    pub tx_id: i64,
    pub date: String,
    pub description: String,
    pub account: String,
    pub amount: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(
        conn,
        sub.get_one::<String>("account").map(String::as_str),
        sub.get_one::<usize>("limit").copied(),
    )?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.tx_id.to_string(),
                    r.date.clone(),
                    r.description.clone(),
                    r.account.clone(),
                    r.amount.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Tx", "Date", "Description", "Account", "Amount"], rows)
        );
    }
    Ok(())
}

pub fn query_rows(
    conn: &Connection,
    account: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<SplitRow>> {
    let paths = account_paths(conn)?;
    let account_id = account.map(|a| id_for_account_path(conn, a)).transpose()?;

    let mut stmt = conn.prepare(
        "SELECT t.id, t.date, t.description, s.account_id, s.value_num, s.value_denom
         FROM splits s JOIN transactions t ON s.tx_id=t.id
         WHERE ?1 IS NULL OR s.account_id=?1
         ORDER BY t.date DESC, t.id DESC, s.id",
    )?;
    let mut rows = stmt.query(params![account_id])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        if limit.is_some_and(|l| data.len() >= l) {
            break;
        }
        let tx_id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let description: String = r.get(2)?;
        let acct: i64 = r.get(3)?;
        let amount = Rational::new(r.get(4)?, r.get(5)?);
        data.push(SplitRow {
            tx_id,
            date,
            description,
            account: paths.get(&acct).cloned().unwrap_or_default(),
            amount: match ExactDecimal::from_rational(amount) {
                Ok(d) => d.to_string(),
                Err(_) => format!("{}/{}", amount.num, amount.denom),
            },
        });
    }
    Ok(data)
}
