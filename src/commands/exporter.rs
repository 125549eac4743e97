// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reports::{LayoutReport, layout_from_args};
use crate::config::SectionKind;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("report", sub)) => export_report(conn, sub),
        _ => Ok(()),
    }
}

fn export_report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let report = layout_from_args(conn, sub)?;
    match fmt.as_str() {
        "csv" => write_csv(&report, Path::new(out))?,
        "json" => std::fs::write(out, serde_json::to_string_pretty(&report)?)?,
        _ => anyhow::bail!("Unknown format: {} (use csv|json)", fmt),
    }
    println!("Exported {} sections to {}", report.rows.len(), out);
    Ok(())
}

/// One line per section: label, path, kind, then one column per period and
/// a final as-of balance column. Cells that do not apply are left empty.
pub fn write_csv(report: &LayoutReport, out: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(out)?;
    let mut header = vec!["section".to_string(), "path".into(), "kind".into()];
    header.extend(report.periods.iter().cloned());
    header.push(format!("balance@{}", report.as_of));
    wtr.write_record(&header)?;

    let width = report.periods.len();
    for row in &report.rows {
        let mut rec = vec![row.label.clone(), row.path.clone()];
        match row.kind {
            SectionKind::Flow => {
                rec.push("flow".into());
                rec.extend(row.values.iter().map(|v| v.to_string()));
                rec.push(String::new());
            }
            SectionKind::Balance => {
                rec.push("balance".into());
                rec.extend(std::iter::repeat_n(String::new(), width));
                rec.extend(row.values.iter().map(|v| v.to_string()));
            }
        }
        wtr.write_record(&rec)?;
    }
    wtr.flush()?;
    Ok(())
}
