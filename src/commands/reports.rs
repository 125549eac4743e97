// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{Layout, SectionKind, Settings};
use crate::db::load_book;
use crate::engine::{self, PeriodBoundaries, path::parse_path};
use crate::rates::SqliteRates;
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("flow", sub)) => flow(conn, sub)?,
        Some(("balance", sub)) => balance(conn, sub)?,
        Some(("run", sub)) => run(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Period window chosen on the command line, falling back to the layout and
/// then to stored settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub year: i32,
    pub month: u32,
    pub count: usize,
    pub annual: bool,
}

impl Window {
    pub fn resolve(sub: &clap::ArgMatches, layout: Option<&Layout>, settings: &Settings) -> Self {
        let annual = sub.get_flag("annual") || layout.is_some_and(|l| l.annual);
        let year = sub
            .get_one::<i32>("year")
            .copied()
            .or(layout.and_then(|l| l.start_year))
            .unwrap_or_else(|| Utc::now().date_naive().year());
        let month = sub
            .get_one::<u32>("month")
            .copied()
            .or(layout.and_then(|l| l.start_month))
            .unwrap_or(settings.fiscal_start_month);
        let count = sub
            .get_one::<usize>("count")
            .copied()
            .or(layout.and_then(|l| l.count))
            .unwrap_or(if annual { 1 } else { settings.quarters });
        Self {
            year,
            month,
            count,
            annual,
        }
    }

    pub fn boundaries(&self) -> crate::error::Result<PeriodBoundaries> {
        if self.annual {
            engine::years(self.year, self.month, self.count)
        } else {
            engine::quarters(self.year, self.month, self.count)
        }
    }
}

fn flow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let settings = Settings::load(conn)?;
    let window = Window::resolve(sub, None, &settings);
    let path = sub.get_one::<String>("path").unwrap();

    let root = load_book(conn, &settings.base_currency)?;
    let report = engine::flow_report(&root, &parse_path(path), window.boundaries()?)?;

    if !maybe_print_json(json_flag, jsonl_flag, &report)? {
        let data = report
            .periods
            .iter()
            .map(|p| {
                vec![
                    p.label(),
                    p.start.to_string(),
                    p.end.to_string(),
                    format!("{:.2}", p.debit),
                    format!("{:.2}", p.credit),
                    format!("{:.2}", p.total),
                ]
            })
            .collect();
        println!("{}", report.account);
        println!(
            "{}",
            pretty_table(&["Period", "Start", "End", "Debit", "Credit", "Total"], data)
        );
    }
    Ok(())
}

fn balance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let settings = Settings::load(conn)?;
    let path = sub.get_one::<String>("path").unwrap();
    let as_of = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Utc::now().date_naive(),
    };
    let ccy = sub
        .get_one::<String>("currency")
        .map(|s| s.to_uppercase())
        .unwrap_or_else(|| settings.base_currency.clone());

    let root = load_book(conn, &settings.base_currency)?;
    let rates = SqliteRates::new(conn, &settings.base_currency);
    let report = engine::balance_report(&root, &parse_path(path), as_of, &ccy, &rates)?;

    if !maybe_print_json(json_flag, jsonl_flag, &report)? {
        let data = vec![vec![
            report.account.clone(),
            report.as_of.to_string(),
            fmt_money(&report.balance, &report.currency),
        ]];
        println!(
            "{}",
            pretty_table(&["Account", "As of (end of day)", "Balance"], data)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub label: String,
    pub path: String,
    pub kind: SectionKind,
    /// One value per period for flow rows; a single balance otherwise.
    pub values: Vec<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    pub periods: Vec<String>,
    pub as_of: NaiveDate,
    pub rows: Vec<ReportRow>,
}

/// Evaluates every section of `layout` against one loaded book.
///
/// Balance sections are taken at the end of `as_of`, which defaults to the
/// last day of the final period.
pub fn run_layout(
    conn: &Connection,
    layout: &Layout,
    window: Window,
    as_of: Option<NaiveDate>,
) -> Result<LayoutReport> {
    let settings = Settings::load(conn)?;
    let root = load_book(conn, &settings.base_currency)?;
    let rates = SqliteRates::new(conn, &settings.base_currency);
    let boundaries: Vec<(NaiveDate, NaiveDate)> = window.boundaries()?.collect();
    let as_of = match (as_of, boundaries.last()) {
        (Some(d), _) => d,
        (None, Some((_, end))) => *end,
        (None, None) => Utc::now().date_naive(),
    };

    let mut rows = Vec::with_capacity(layout.sections.len());
    for section in &layout.sections {
        let path = parse_path(&section.path);
        let sign = if section.negate {
            Decimal::NEGATIVE_ONE
        } else {
            Decimal::ONE
        };
        let values = match section.kind {
            SectionKind::Flow => engine::flow_report(&root, &path, boundaries.iter().copied())
                .with_context(|| format!("Section '{}'", section.label))?
                .periods
                .iter()
                .map(|p| p.total * sign)
                .collect(),
            SectionKind::Balance => {
                let ccy = section
                    .currency
                    .as_deref()
                    .unwrap_or(&settings.base_currency);
                let r = engine::balance_report(&root, &path, as_of, ccy, &rates)
                    .with_context(|| format!("Section '{}'", section.label))?;
                vec![r.balance * sign]
            }
        };
        rows.push(ReportRow {
            label: section.label.clone(),
            path: section.path.clone(),
            kind: section.kind,
            values,
        });
    }

    let periods = boundaries
        .iter()
        .map(|(s, e)| engine::Period::new(*s, *e).label())
        .collect();
    Ok(LayoutReport {
        periods,
        as_of,
        rows,
    })
}

/// Loads a layout and the window/as-of flags shared by `report run` and
/// `export report`.
pub fn layout_from_args(conn: &Connection, sub: &clap::ArgMatches) -> Result<LayoutReport> {
    let layout = Layout::from_path(Path::new(sub.get_one::<String>("layout").unwrap()))?;
    let settings = Settings::load(conn)?;
    let window = Window::resolve(sub, Some(&layout), &settings);
    let as_of = sub
        .get_one::<String>("as-of")
        .map(|s| parse_date(s))
        .transpose()?;
    run_layout(conn, &layout, window, as_of)
}

fn run(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let report = layout_from_args(conn, sub)?;
    if maybe_print_json(json_flag, jsonl_flag, &report)? {
        return Ok(());
    }

    let mut headers: Vec<String> = vec!["Section".into(), "Kind".into()];
    headers.extend(report.periods.iter().cloned());
    headers.push(format!("Balance @ {}", report.as_of));
    let width = report.periods.len();
    let data = report
        .rows
        .iter()
        .map(|r| {
            let mut row = vec![
                r.label.clone(),
                match r.kind {
                    SectionKind::Flow => "flow".to_string(),
                    SectionKind::Balance => "balance".to_string(),
                },
            ];
            match r.kind {
                SectionKind::Flow => {
                    row.extend(r.values.iter().map(|v| format!("{:.2}", v)));
                    row.push(String::new());
                }
                SectionKind::Balance => {
                    row.extend(std::iter::repeat_n(String::new(), width));
                    row.extend(r.values.iter().map(|v| format!("{:.2}", v)));
                }
            }
            row
        })
        .collect();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    println!("{}", pretty_table(&header_refs, data));
    Ok(())
}
