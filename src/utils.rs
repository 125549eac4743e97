// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::engine::path::{display_path, parse_path};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the fmt subscriber once; `QUARTERBOOK_LOG` overrides the filter.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_env("QUARTERBOOK_LOG")
            .unwrap_or_else(|_| EnvFilter::new("quarterbook=info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// `PATH=AMOUNT`, as given to `tx add --split`.
pub fn parse_split_arg(s: &str) -> Result<(String, Decimal)> {
    let (path, amount) = s
        .rsplit_once('=')
        .with_context(|| format!("Invalid split '{}', expected PATH=AMOUNT", s))?;
    Ok((path.trim().to_string(), parse_decimal(amount.trim())?))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

/// Store id of the account at `path` (`Assets:Checking`), walking one level
/// at a time from the top.
pub fn id_for_account_path(conn: &Connection, path: &str) -> Result<i64> {
    let segments = parse_path(path);
    if segments.is_empty() {
        anyhow::bail!("Empty account path");
    }
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE parent_id IS ?1 AND name=?2")?;
    let mut parent: Option<i64> = None;
    for seg in &segments {
        let id: Option<i64> = stmt
            .query_row(params![parent, seg], |r| r.get(0))
            .optional()?;
        parent = Some(id.with_context(|| format!("Account '{}' not found", path))?);
    }
    parent.with_context(|| format!("Account '{}' not found", path))
}

/// Full `:`-joined path of every account, keyed by store id.
pub fn account_paths(conn: &Connection) -> Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, parent_id, name FROM accounts")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, Option<i64>>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut nodes: HashMap<i64, (Option<i64>, String)> = HashMap::new();
    for row in rows {
        let (id, parent, name) = row?;
        nodes.insert(id, (parent, name));
    }
    let mut out = HashMap::with_capacity(nodes.len());
    for (&id, (parent, name)) in &nodes {
        let mut segments = vec![name.as_str()];
        let mut cur = *parent;
        // at most nodes.len() hops, even through a corrupt parent cycle
        for _ in 0..nodes.len() {
            let Some(pid) = cur else { break };
            let Some((pp, pname)) = nodes.get(&pid) else { break };
            segments.push(pname.as_str());
            cur = *pp;
        }
        segments.reverse();
        out.insert(id, display_path(&segments));
    }
    Ok(out)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
