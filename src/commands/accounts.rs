// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::get_base_currency;
use crate::db::load_book;
use crate::engine::path::display_path;
use crate::utils::{id_for_account_path, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let parent = sub.get_one::<String>("parent");
            let ccy = sub.get_one::<String>("currency").unwrap().to_uppercase();
            add(conn, parent.map(String::as_str), name, &ccy)?;
            match parent {
                Some(p) => println!("Added account '{}:{}' ({})", p, name, ccy),
                None => println!("Added account '{}' ({})", name, ccy),
            }
        }
        Some(("list", _)) => list(conn)?,
        _ => {}
    }
    Ok(())
}

/// Inserts `name` under the account at `parent` (top level when `None`).
pub fn add(conn: &Connection, parent: Option<&str>, name: &str, commodity: &str) -> Result<i64> {
    if name.is_empty() || name.contains(crate::engine::path::SEPARATOR) {
        anyhow::bail!("Invalid account name '{}'", name);
    }
    let parent_id = parent.map(|p| id_for_account_path(conn, p)).transpose()?;
    // UNIQUE(parent_id, name) does not hold for top-level rows where parent_id is NULL
    let exists: Option<i64> = conn
        .query_row(
            "SELECT id FROM accounts WHERE parent_id IS ?1 AND name=?2",
            params![parent_id, name],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_some() {
        anyhow::bail!("Account '{}' already exists", name);
    }
    conn.execute(
        "INSERT INTO accounts(parent_id, name, commodity) VALUES (?1, ?2, ?3)",
        params![parent_id, name, commodity],
    )?;
    Ok(conn.last_insert_rowid())
}

fn list(conn: &Connection) -> Result<()> {
    let base = get_base_currency(conn)?;
    let root = load_book(conn, &base)?;
    let mut data = Vec::new();
    let mut stack: Vec<(Vec<&str>, &crate::models::Account)> = root
        .children()
        .rev()
        .map(|a| (vec![a.name()], a))
        .collect();
    while let Some((path, acct)) = stack.pop() {
        data.push(vec![
            display_path(&path),
            acct.commodity().to_string(),
            acct.splits().len().to_string(),
        ]);
        for child in acct.children().rev() {
            let mut p = path.clone();
            p.push(child.name());
            stack.push((p, child));
        }
    }
    println!("{}", pretty_table(&["Account", "Commodity", "Splits"], data));
    Ok(())
}
