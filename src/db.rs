// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Account, Rational, Split, TxnHeader};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Quarterbook", "quarterbook"));

pub const DB_ENV: &str = "QUARTERBOOK_DB";
pub const ROOT_NAME: &str = "Root Account";

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        if !p.is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("quarterbook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        parent_id INTEGER,
        name TEXT NOT NULL,
        commodity TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(parent_id, name),
        FOREIGN KEY(parent_id) REFERENCES accounts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        description TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    -- amounts are value_num / value_denom, value_denom a power of ten
    CREATE TABLE IF NOT EXISTS splits(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tx_id INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        value_num INTEGER NOT NULL,
        value_denom INTEGER NOT NULL,
        memo TEXT,
        FOREIGN KEY(tx_id) REFERENCES transactions(id) ON DELETE CASCADE,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_splits_account ON splits(account_id);

    -- FX rates: store base->quote rate (1 base = rate quote) per day
    CREATE TABLE IF NOT EXISTS fx_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        base TEXT NOT NULL,
        quote TEXT NOT NULL,
        rate TEXT NOT NULL,
        UNIQUE(date, base, quote)
    );
    "#,
    )?;
    Ok(())
}

struct AccountRow {
    parent: Option<i64>,
    node: Account,
}

/// Reads the whole account tree with its splits into an owned snapshot,
/// rooted at a synthetic account held in `base_currency`.
pub fn load_book(conn: &Connection, base_currency: &str) -> Result<Account> {
    let mut stmt = conn.prepare("SELECT id, parent_id, name, commodity FROM accounts")?;
    let mut cur = stmt.query([])?;
    let mut rows: HashMap<i64, AccountRow> = HashMap::new();
    let mut children_of: HashMap<Option<i64>, Vec<i64>> = HashMap::new();
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let parent: Option<i64> = r.get(1)?;
        let name: String = r.get(2)?;
        let commodity: String = r.get(3)?;
        rows.insert(
            id,
            AccountRow {
                parent,
                node: Account::new(name, commodity),
            },
        );
        children_of.entry(parent).or_default().push(id);
    }

    let mut sstmt = conn.prepare(
        "SELECT s.account_id, t.id, t.date, t.description, s.value_num, s.value_denom
         FROM splits s JOIN transactions t ON s.tx_id=t.id
         ORDER BY t.date, t.id, s.id",
    )?;
    let mut scur = sstmt.query([])?;
    let mut headers: HashMap<i64, Arc<TxnHeader>> = HashMap::new();
    while let Some(r) = scur.next()? {
        let account_id: i64 = r.get(0)?;
        let tx_id: i64 = r.get(1)?;
        let date: NaiveDate = r.get(2)?;
        let description: String = r.get(3)?;
        let amount = Rational::new(r.get(4)?, r.get(5)?);
        let txn = headers
            .entry(tx_id)
            .or_insert_with(|| {
                Arc::new(TxnHeader {
                    id: tx_id,
                    date,
                    description,
                })
            })
            .clone();
        let row = rows.get_mut(&account_id).with_context(|| {
            format!(
                "Split on tx {} references unknown account {}",
                tx_id, account_id
            )
        })?;
        row.node.push_split(Split::new(txn, amount));
    }

    // breadth-first order from the top level; children always follow parents
    let mut order = Vec::with_capacity(rows.len());
    let mut queue: VecDeque<i64> = children_of.get(&None).cloned().unwrap_or_default().into();
    while let Some(id) = queue.pop_front() {
        order.push(id);
        if let Some(kids) = children_of.get(&Some(id)) {
            queue.extend(kids.iter().copied());
        }
    }
    if order.len() != rows.len() {
        warn!(
            unreachable = rows.len() - order.len(),
            "accounts not reachable from the top level were skipped"
        );
    }

    let mut root = Account::new(ROOT_NAME, base_currency);
    for id in order.into_iter().rev() {
        let Some(row) = rows.remove(&id) else { continue };
        match row.parent {
            Some(pid) => {
                let parent = rows
                    .get_mut(&pid)
                    .with_context(|| format!("Account {} has missing parent {}", id, pid))?;
                parent.node.add_child(row.node);
            }
            None => {
                root.add_child(row.node);
            }
        }
    }
    Ok(root)
}
