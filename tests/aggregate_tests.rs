// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use quarterbook::engine::periods::{
    aggregate_splits, locate, merge_into, period_starts, periods_from,
};
use quarterbook::engine::{Period, aggregate, aggregate_subtree, flow_report, quarters};
use quarterbook::error::Error;
use quarterbook::models::{Account, Rational, Split, TxnHeader};
use rust_decimal::Decimal;
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn split(id: i64, date: NaiveDate, cents: i64) -> Split {
    let txn = Arc::new(TxnHeader {
        id,
        date,
        description: format!("tx {}", id),
    });
    Split::new(txn, Rational::new(cents, 100))
}

fn h1_2024() -> Vec<Period> {
    periods_from([
        (d(2024, 1, 1), d(2024, 3, 31)),
        (d(2024, 4, 1), d(2024, 6, 30)),
    ])
    .unwrap()
}

#[test]
fn credit_on_last_day_of_quarter_stays_in_that_quarter() {
    let mut periods = h1_2024();
    let starts = period_starts(&periods);
    let acct = Account::new("Dining", "USD").with_split(split(1, d(2024, 3, 31), -15000));

    aggregate(&acct, &starts, &mut periods).unwrap();

    assert_eq!(periods[0].credit, Decimal::new(-15000, 2));
    assert_eq!(periods[0].total, Decimal::new(-15000, 2));
    assert_eq!(periods[0].debit, Decimal::ZERO);
    assert_eq!(periods[1], Period::new(d(2024, 4, 1), d(2024, 6, 30)));
}

#[test]
fn debits_and_credits_are_split_by_sign() {
    let mut periods = h1_2024();
    let starts = period_starts(&periods);
    let acct = Account::new("Checking", "USD")
        .with_split(split(1, d(2024, 4, 1), 2500))
        .with_split(split(2, d(2024, 5, 15), -1000))
        .with_split(split(3, d(2024, 6, 30), 0));

    aggregate(&acct, &starts, &mut periods).unwrap();

    assert_eq!(periods[1].debit, Decimal::new(2500, 2));
    assert_eq!(periods[1].credit, Decimal::new(-1000, 2));
    assert_eq!(periods[1].total, Decimal::new(1500, 2));
}

#[test]
fn splits_outside_the_window_are_ignored() {
    let mut periods = h1_2024();
    let starts = period_starts(&periods);
    let acct = Account::new("Dining", "USD")
        .with_split(split(1, d(2023, 12, 31), -999))
        .with_split(split(2, d(2024, 7, 1), -999))
        .with_split(split(3, d(2024, 1, 1), -100));

    aggregate(&acct, &starts, &mut periods).unwrap();

    assert_eq!(periods[0].total, Decimal::new(-100, 2));
    assert_eq!(periods[1].total, Decimal::ZERO);
}

#[test]
fn locate_is_rightmost_start_not_after_date() {
    let starts = [d(2024, 1, 1), d(2024, 4, 1), d(2024, 7, 1)];
    assert_eq!(locate(&starts, d(2023, 12, 31)), None);
    assert_eq!(locate(&starts, d(2024, 1, 1)), Some(0));
    assert_eq!(locate(&starts, d(2024, 3, 31)), Some(0));
    assert_eq!(locate(&starts, d(2024, 4, 1)), Some(1));
    assert_eq!(locate(&starts, d(2030, 1, 1)), Some(2));
    assert_eq!(locate(&[], d(2024, 1, 1)), None);
}

#[test]
fn gap_between_periods_is_an_invariant_violation() {
    let mut periods = periods_from([
        (d(2024, 1, 1), d(2024, 1, 31)),
        (d(2024, 3, 1), d(2024, 3, 31)),
    ])
    .unwrap();
    let starts = period_starts(&periods);
    let acct = Account::new("Dining", "USD").with_split(split(1, d(2024, 2, 15), -100));

    let err = aggregate(&acct, &starts, &mut periods).unwrap_err();
    assert!(matches!(
        err,
        Error::InvariantViolation { date, .. } if date == d(2024, 2, 15)
    ));
}

#[test]
fn failed_aggregation_leaves_periods_untouched() {
    let boundaries = [
        (d(2024, 1, 1), d(2024, 1, 31)),
        (d(2024, 3, 1), d(2024, 3, 31)),
    ];
    let mut periods = periods_from(boundaries).unwrap();
    let starts = period_starts(&periods);
    let acct = Account::new("Dining", "USD")
        .with_split(split(1, d(2024, 1, 5), -100))
        .with_split(split(2, d(2024, 2, 15), -100));

    assert!(aggregate(&acct, &starts, &mut periods).is_err());
    assert_eq!(periods, periods_from(boundaries).unwrap());

    let root = Account::new("Expenses", "USD")
        .with_split(split(3, d(2024, 3, 2), 500))
        .with_child(acct);
    assert!(aggregate_subtree(&root, &starts, &mut periods).is_err());
    assert_eq!(periods, periods_from(boundaries).unwrap());
}

#[test]
fn overlapping_or_reversed_boundaries_are_rejected() {
    assert!(periods_from([(d(2024, 2, 1), d(2024, 1, 1))]).is_err());
    assert!(
        periods_from([
            (d(2024, 1, 1), d(2024, 3, 31)),
            (d(2024, 3, 31), d(2024, 6, 30)),
        ])
        .is_err()
    );
}

#[test]
fn empty_period_list_is_a_no_op() {
    let mut periods: Vec<Period> = Vec::new();
    let acct = Account::new("Dining", "USD").with_split(split(1, d(2024, 1, 1), -100));
    aggregate(&acct, &[], &mut periods).unwrap();
    assert!(periods.is_empty());
}

#[test]
fn account_without_splits_leaves_zeroes() {
    let mut periods = h1_2024();
    let starts = period_starts(&periods);
    aggregate(&Account::new("Empty", "USD"), &starts, &mut periods).unwrap();
    assert_eq!(periods, h1_2024());
}

#[test]
fn mismatched_start_list_is_rejected() {
    let mut periods = h1_2024();
    let err = aggregate(&Account::new("x", "USD"), &[d(2024, 1, 1)], &mut periods).unwrap_err();
    assert!(matches!(err, Error::MalformedPeriods(_)));
}

#[test]
fn bad_denominator_aborts_aggregation() {
    let mut periods = h1_2024();
    let starts = period_starts(&periods);
    let txn = Arc::new(TxnHeader {
        id: 1,
        date: d(2024, 2, 1),
        description: String::new(),
    });
    let acct = Account::new("Dining", "USD").with_split(Split::new(txn, Rational::new(1, 3)));
    let err = aggregate(&acct, &starts, &mut periods).unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }));
}

fn permutations(items: &[Split]) -> Vec<Vec<Split>> {
    // Heap's algorithm, iterative
    let mut a = items.to_vec();
    let n = a.len();
    let mut c = vec![0usize; n];
    let mut out = vec![a.clone()];
    let mut i = 1;
    while i < n {
        if c[i] < i {
            if i % 2 == 0 {
                a.swap(0, i);
            } else {
                a.swap(c[i], i);
            }
            out.push(a.clone());
            c[i] += 1;
            i = 1;
        } else {
            c[i] = 0;
            i += 1;
        }
    }
    out
}

#[test]
fn result_does_not_depend_on_split_order() {
    let splits = vec![
        split(1, d(2024, 1, 5), -1234),
        split(2, d(2024, 3, 31), 5000),
        split(3, d(2024, 4, 1), -1),
        split(4, d(2023, 6, 1), 77777),
        split(5, d(2024, 6, 30), -33333),
    ];
    let base = h1_2024();
    let starts = period_starts(&base);

    let mut expected = base.clone();
    aggregate_splits(&splits, &starts, &mut expected).unwrap();

    let perms = permutations(&splits);
    assert_eq!(perms.len(), 120);
    for perm in perms {
        let mut got = base.clone();
        aggregate_splits(&perm, &starts, &mut got).unwrap();
        assert_eq!(got, expected);
    }
}

fn household() -> Account {
    Account::new("Root Account", "USD").with_child(
        Account::new("Expenses", "USD")
            .with_split(split(10, d(2024, 2, 1), 100))
            .with_child(
                Account::new("Food", "USD")
                    .with_split(split(11, d(2024, 2, 2), 2000))
                    .with_child(
                        Account::new("Dining", "USD")
                            .with_split(split(12, d(2024, 5, 3), 4550))
                            .with_split(split(13, d(2024, 5, 4), -550)),
                    ),
            )
            .with_child(
                Account::new("Utilities", "USD").with_split(split(14, d(2024, 3, 31), 9900)),
            ),
    )
}

#[test]
fn subtree_rolls_up_every_descendant() {
    let root = household();
    let expenses = root.child("Expenses").unwrap();
    let mut periods = h1_2024();
    let starts = period_starts(&periods);

    aggregate_subtree(expenses, &starts, &mut periods).unwrap();

    assert_eq!(periods[0].total, Decimal::new(12000, 2));
    assert_eq!(periods[1].debit, Decimal::new(4550, 2));
    assert_eq!(periods[1].credit, Decimal::new(-550, 2));
    assert_eq!(periods[1].total, Decimal::new(4000, 2));
}

#[test]
fn repeated_calls_accumulate_into_the_same_list() {
    let root = household();
    let food = root.child("Expenses").unwrap().child("Food").unwrap();
    let utilities = root.child("Expenses").unwrap().child("Utilities").unwrap();
    let mut periods = h1_2024();
    let starts = period_starts(&periods);

    aggregate_subtree(food, &starts, &mut periods).unwrap();
    aggregate_subtree(utilities, &starts, &mut periods).unwrap();

    assert_eq!(periods[0].total, Decimal::new(11900, 2));
    assert_eq!(periods[1].total, Decimal::new(4000, 2));
}

#[test]
fn flow_report_labels_the_resolved_account() {
    let root = household();
    let empty: [&str; 0] = [];
    let whole = flow_report(&root, &empty, quarters(2024, 1, 2).unwrap()).unwrap();
    assert_eq!(whole.account, "Root Account");
    assert_eq!(whole.periods[0].total, Decimal::new(12000, 2));

    let report = flow_report(&root, &["Expenses", "Food"], quarters(2024, 1, 2).unwrap()).unwrap();
    assert_eq!(report.account, "Expenses:Food");
    assert_eq!(report.periods[0].label(), "2024-Q1");
    assert_eq!(report.periods[1].label(), "2024-Q2");
    assert_eq!(report.periods[0].total, Decimal::new(2000, 2));
    assert_eq!(report.periods[1].total, Decimal::new(4000, 2));

    let missing = flow_report(&root, &["Expenses", "Travel"], quarters(2024, 1, 2).unwrap());
    assert!(matches!(missing, Err(Error::PathNotFound { .. })));
}

#[test]
fn period_labels() {
    assert_eq!(Period::new(d(2024, 10, 1), d(2024, 12, 31)).label(), "2024-Q4");
    assert_eq!(Period::new(d(2024, 1, 1), d(2024, 12, 31)).label(), "2024");
    assert_eq!(
        Period::new(d(2023, 11, 1), d(2024, 1, 31)).label(),
        "2023-11-01..2024-01-31"
    );
}

#[test]
fn per_worker_lists_merge_to_the_single_threaded_result() {
    let root = household();
    let expenses = root.child("Expenses").unwrap();
    let base = h1_2024();
    let starts = period_starts(&base);

    let mut expected = base.clone();
    aggregate_subtree(expenses, &starts, &mut expected).unwrap();

    let parts: Vec<Vec<Period>> = std::thread::scope(|s| {
        let handles: Vec<_> = expenses
            .subtree()
            .map(|acct| {
                let starts = &starts;
                let mut own = base.clone();
                s.spawn(move || {
                    aggregate(acct, starts, &mut own).unwrap();
                    own
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut merged = base.clone();
    for part in &parts {
        merge_into(&mut merged, part).unwrap();
    }
    assert_eq!(merged, expected);
}
