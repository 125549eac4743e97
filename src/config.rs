// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BASE_CURRENCY: &str = "USD";
pub const DEFAULT_FISCAL_START_MONTH: u32 = 1;
pub const DEFAULT_QUARTERS: usize = 4;

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

// Base currency settings
pub fn get_base_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "base_currency")?.unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string()))
}

pub fn set_base_currency(conn: &Connection, ccy: &str) -> Result<()> {
    set_setting(conn, "base_currency", ccy)
}

/// Stored report defaults; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub base_currency: String,
    pub fiscal_start_month: u32,
    pub quarters: usize,
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        let fiscal_start_month = match get_setting(conn, "fiscal_start_month")? {
            Some(s) => s
                .parse()
                .with_context(|| format!("Invalid fiscal_start_month '{}'", s))?,
            None => DEFAULT_FISCAL_START_MONTH,
        };
        if !(1..=12).contains(&fiscal_start_month) {
            anyhow::bail!("fiscal_start_month must be 1-12, got {}", fiscal_start_month);
        }
        let quarters = match get_setting(conn, "quarters")? {
            Some(s) => s
                .parse()
                .with_context(|| format!("Invalid quarters '{}'", s))?,
            None => DEFAULT_QUARTERS,
        };
        Ok(Self {
            base_currency: get_base_currency(conn)?,
            fiscal_start_month,
            quarters,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Flow,
    Balance,
}

/// One row group of a report: which account subtree, and how to sum it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub label: String,
    pub path: String,
    pub kind: SectionKind,
    #[serde(default)]
    pub currency: Option<String>,
    /// Flip signs for display, e.g. income accounts that carry credits.
    #[serde(default)]
    pub negate: bool,
}

/// Report layout file, e.g.
///
/// ```json
/// { "sections": [ { "label": "Groceries", "path": "Expenses:Groceries", "kind": "flow" } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub start_month: Option<u32>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub annual: bool,
    pub sections: Vec<Section>,
}

impl Layout {
    pub fn from_path(p: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(p)
            .with_context(|| format!("Read layout {}", p.display()))?;
        Self::from_json(&s).with_context(|| format!("Parse layout {}", p.display()))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
