// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn window_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("year")
            .long("year")
            .value_parser(value_parser!(i32))
            .help("First year of the window (default: current year)"),
    )
    .arg(
        Arg::new("month")
            .long("month")
            .value_parser(value_parser!(u32).range(1..=12))
            .help("First month of the window (default: fiscal_start_month)"),
    )
    .arg(
        Arg::new("count")
            .long("count")
            .value_parser(value_parser!(usize))
            .help("Number of periods (default: quarters setting)"),
    )
    .arg(
        Arg::new("annual")
            .long("annual")
            .action(ArgAction::SetTrue)
            .help("Twelve-month periods instead of quarters"),
    )
}

pub fn build_cli() -> Command {
    Command::new("quarterbook")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Quarterly and annual roll-ups of a household double-entry ledger")
        .subcommand(Command::new("init").about("Create the ledger database"))
        .subcommand(
            Command::new("account")
                .about("Manage the account tree")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("parent")
                                .long("parent")
                                .help("Parent path, e.g. Expenses:Food"),
                        )
                        .arg(Arg::new("currency").long("currency").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("desc").long("desc").required(true))
                        .arg(
                            Arg::new("split")
                                .long("split")
                                .required(true)
                                .action(ArgAction::Append)
                                .help("PATH=AMOUNT, repeat for each leg; legs must sum to zero"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(Arg::new("account").long("account"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("fx")
                .about("Exchange rates used for balance conversion")
                .subcommand(
                    Command::new("set-base").arg(Arg::new("currency").required(true)),
                )
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("base").long("base").required(true))
                        .arg(Arg::new("quote").long("quote").required(true))
                        .arg(Arg::new("rate").long("rate").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("convert")
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Stored report defaults")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(
                            Arg::new("fiscal-start-month")
                                .long("fiscal-start-month")
                                .value_parser(value_parser!(u32).range(1..=12)),
                        )
                        .arg(
                            Arg::new("quarters")
                                .long("quarters")
                                .value_parser(value_parser!(usize)),
                        ),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Period and point-in-time reports")
                .subcommand(json_flags(window_args(
                    Command::new("flow")
                        .about("Debit/credit/total per period for an account subtree")
                        .arg(Arg::new("path").long("path").required(true)),
                )))
                .subcommand(json_flags(
                    Command::new("balance")
                        .about("Subtree balance at the end of a date")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .help("Inclusive as-of date (default: today)"),
                        )
                        .arg(Arg::new("currency").long("currency")),
                ))
                .subcommand(json_flags(window_args(
                    Command::new("run")
                        .about("Every section of a layout file")
                        .arg(Arg::new("layout").long("layout").required(true))
                        .arg(Arg::new("as-of").long("as-of")),
                ))),
        )
        .subcommand(
            Command::new("export")
                .about("Write a layout report to a file")
                .subcommand(window_args(
                    Command::new("report")
                        .arg(Arg::new("layout").long("layout").required(true))
                        .arg(Arg::new("as-of").long("as-of"))
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .value_parser(["csv", "json"]),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                )),
        )
        .subcommand(Command::new("doctor").about("Check ledger data the reports rely on"))
}
