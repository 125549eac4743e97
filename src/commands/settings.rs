// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{Settings, set_setting};
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let s = Settings::load(conn)?;
            let data = vec![
                vec!["base_currency".to_string(), s.base_currency],
                vec!["fiscal_start_month".to_string(), s.fiscal_start_month.to_string()],
                vec!["quarters".to_string(), s.quarters.to_string()],
            ];
            println!("{}", pretty_table(&["Key", "Value"], data));
        }
        Some(("set", sub)) => {
            if let Some(m) = sub.get_one::<u32>("fiscal-start-month") {
                set_setting(conn, "fiscal_start_month", &m.to_string())?;
                println!("fiscal_start_month = {}", m);
            }
            if let Some(q) = sub.get_one::<usize>("quarters") {
                set_setting(conn, "quarters", &q.to_string())?;
                println!("quarters = {}", q);
            }
        }
        _ => {}
    }
    Ok(())
}
