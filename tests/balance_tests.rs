// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use quarterbook::engine::balance::native_balance;
use quarterbook::engine::{CurrencyConverter, balance_as_of, balance_report};
use quarterbook::error::{Error, Result};
use quarterbook::models::{Account, Rational, Split, TxnHeader};
use quarterbook::rates::SqliteRates;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::cell::Cell;
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn split(id: i64, date: NaiveDate, cents: i64) -> Split {
    let txn = Arc::new(TxnHeader {
        id,
        date,
        description: String::new(),
    });
    Split::new(txn, Rational::new(cents, 100))
}

fn assets() -> Account {
    Account::new("Assets", "USD")
        .with_child(
            Account::new("Checking", "USD")
                .with_split(split(1, d(2024, 1, 10), 100000))
                .with_split(split(2, d(2024, 3, 31), -25000)),
        )
        .with_child(
            Account::new("Savings EU", "EUR")
                .with_split(split(3, d(2024, 2, 1), 50000))
                .with_split(split(4, d(2024, 4, 1), 10000)),
        )
}

#[test]
fn as_of_includes_the_whole_day() {
    let a = assets();
    let checking = a.child("Checking").unwrap();
    assert_eq!(native_balance(checking, d(2024, 3, 30)).unwrap(), Decimal::new(100000, 2));
    assert_eq!(native_balance(checking, d(2024, 3, 31)).unwrap(), Decimal::new(75000, 2));
    assert_eq!(native_balance(checking, d(2024, 1, 9)).unwrap(), Decimal::ZERO);
}

#[test]
fn converts_only_foreign_accounts() {
    let a = assets();
    let calls = Cell::new(0);
    let conv = |amount: Decimal, from: &str, to: &str, _date: NaiveDate| -> Result<Decimal> {
        calls.set(calls.get() + 1);
        assert_eq!((from, to), ("EUR", "USD"));
        Ok(amount * Decimal::new(11, 1))
    };

    // 750.00 USD + 500.00 EUR * 1.1
    let bal = balance_as_of(&a, d(2024, 3, 31), "USD", &conv).unwrap();
    assert_eq!(bal, Decimal::new(130000, 2));
    assert_eq!(calls.get(), 1);

    // 600.00 EUR after the April deposit
    let bal = balance_as_of(&a, d(2024, 4, 1), "USD", &conv).unwrap();
    assert_eq!(bal, Decimal::new(141000, 2));
}

#[test]
fn same_currency_subtree_needs_no_converter() {
    let a = assets();
    let never = |_: Decimal, _: &str, _: &str, _: NaiveDate| -> Result<Decimal> {
        panic!("no conversion expected")
    };
    let checking = a.child("Checking").unwrap();
    assert_eq!(
        balance_as_of(checking, d(2024, 12, 31), "USD", &never).unwrap(),
        Decimal::new(75000, 2)
    );
}

#[test]
fn converter_errors_propagate() {
    let a = assets();
    let missing = |_: Decimal, from: &str, to: &str, date: NaiveDate| -> Result<Decimal> {
        Err(Error::MissingRate {
            from: from.into(),
            to: to.into(),
            date,
        })
    };
    let err = balance_as_of(&a, d(2024, 6, 30), "USD", &missing).unwrap_err();
    assert!(matches!(err, Error::MissingRate { .. }));
}

#[test]
fn report_resolves_path_first() {
    let root = Account::new("Root Account", "USD").with_child(assets());
    let conv = |amount: Decimal, _: &str, _: &str, _: NaiveDate| -> Result<Decimal> { Ok(amount) };
    let r = balance_report(&root, &["Assets", "Checking"], d(2024, 3, 31), "USD", &conv).unwrap();
    assert_eq!(r.account, "Assets:Checking");
    assert_eq!(r.balance, Decimal::new(75000, 2));

    let err = balance_report(&root, &["Assets", "Brokerage"], d(2024, 3, 31), "USD", &conv);
    assert!(matches!(err, Err(Error::PathNotFound { .. })));

    let empty: [&str; 0] = [];
    let whole = balance_report(&root, &empty, d(2024, 3, 31), "USD", &conv).unwrap();
    assert_eq!(whole.account, "Root Account");
    assert_eq!(whole.balance, Decimal::new(75000, 2));
}

fn rates_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE fx_rates(
            date TEXT NOT NULL,
            base TEXT NOT NULL,
            quote TEXT NOT NULL,
            rate TEXT NOT NULL,
            UNIQUE(date, base, quote)
        );
    "#,
    )
    .unwrap();
    for (date, base, quote, rate) in [
        ("2025-08-01", "USD", "INR", "83"),
        ("2025-08-01", "USD", "EUR", "0.90"),
        ("2025-09-01", "USD", "EUR", "0.80"),
    ] {
        conn.execute(
            "INSERT INTO fx_rates(date,base,quote,rate) VALUES (?1,?2,?3,?4)",
            params![date, base, quote, rate],
        )
        .unwrap();
    }
    conn
}

#[test]
fn sqlite_rates_triangulate_and_invert() {
    let conn = rates_conn();
    let rates = SqliteRates::new(&conn, "USD");
    let on = d(2025, 8, 15);

    // 90 EUR -> 100 USD -> 8300 INR
    let res = rates.convert(Decimal::new(9000, 2), "EUR", "INR", on).unwrap();
    assert_eq!(format!("{:.2}", res.round_dp(2)), "8300.00");

    let res = rates.convert(Decimal::new(16600, 2), "INR", "USD", on).unwrap();
    assert_eq!(format!("{:.2}", res.round_dp(2)), "2.00");

    let res = rates.convert(Decimal::new(100, 0), "USD", "EUR", on).unwrap();
    assert_eq!(res, Decimal::new(90, 0));
}

#[test]
fn sqlite_rates_use_the_closest_earlier_rate() {
    let conn = rates_conn();
    let rates = SqliteRates::new(&conn, "USD");
    let before = rates.convert(Decimal::ONE_HUNDRED, "USD", "EUR", d(2025, 8, 31)).unwrap();
    let after = rates.convert(Decimal::ONE_HUNDRED, "USD", "EUR", d(2025, 9, 1)).unwrap();
    assert_eq!(before, Decimal::new(90, 0));
    assert_eq!(after, Decimal::new(80, 0));

    let err = rates
        .convert(Decimal::ONE, "USD", "EUR", d(2025, 7, 31))
        .unwrap_err();
    assert!(matches!(err, Error::MissingRate { .. }));
    let err = rates.convert(Decimal::ONE, "GBP", "USD", d(2025, 8, 15)).unwrap_err();
    assert!(matches!(err, Error::MissingRate { .. }));
}

#[test]
fn balance_with_store_rates() {
    let conn = rates_conn();
    let rates = SqliteRates::new(&conn, "USD");
    let acct = Account::new("Savings EU", "EUR").with_split(split(1, d(2025, 8, 2), 9000));
    let bal = balance_as_of(&acct, d(2025, 8, 15), "USD", &rates).unwrap();
    assert_eq!(bal.round_dp(2), Decimal::new(10000, 2));
}
