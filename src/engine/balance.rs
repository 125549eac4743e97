// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Point-in-time balances over an account subtree.
//!
//! "As of D" means at the end of day D: a transaction dated D is included.
//! Each account is converted to the target currency on its own and the
//! converted figures are summed, so a multi-currency subtree may differ in
//! the last digits from converting one consolidated sum.

use crate::engine::{decimal, path};
use crate::error::{Error, Result};
use crate::models::Account;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// The ledger's currency conversion capability.
pub trait CurrencyConverter {
    /// `amount` in `from` expressed in `to`, using rates valid on `date`.
    fn convert(&self, amount: Decimal, from: &str, to: &str, date: NaiveDate) -> Result<Decimal>;
}

impl<F> CurrencyConverter for F
where
    F: Fn(Decimal, &str, &str, NaiveDate) -> Result<Decimal>,
{
    fn convert(&self, amount: Decimal, from: &str, to: &str, date: NaiveDate) -> Result<Decimal> {
        self(amount, from, to, date)
    }
}

/// Sum of the splits posted directly to `account` up to and including `date`,
/// in the account's own commodity.
pub fn native_balance(account: &Account, date: NaiveDate) -> Result<Decimal> {
    let mut sum = Decimal::ZERO;
    for split in account.splits().iter().filter(|s| s.date() <= date) {
        sum = sum
            .checked_add(decimal::convert(split.amount)?)
            .ok_or_else(|| Error::Overflow(format!("balance of {}", account.name())))?;
    }
    Ok(sum)
}

/// Net balance of `account` and all its descendants at the end of `date`,
/// in `target_currency`.
pub fn balance_as_of<C>(
    account: &Account,
    date: NaiveDate,
    target_currency: &str,
    converter: &C,
) -> Result<Decimal>
where
    C: CurrencyConverter + ?Sized,
{
    let mut total = Decimal::ZERO;
    for node in account.subtree() {
        let native = native_balance(node, date)?;
        if native.is_zero() {
            continue;
        }
        let converted = if node.commodity() == target_currency {
            native
        } else {
            let v = converter.convert(native, node.commodity(), target_currency, date)?;
            debug!(
                account = node.name(),
                %native,
                from = node.commodity(),
                to = target_currency,
                converted = %v,
                "converted balance"
            );
            v
        };
        total = total
            .checked_add(converted)
            .ok_or_else(|| Error::Overflow(format!("balance of {}", account.name())))?;
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub account: String,
    pub as_of: NaiveDate,
    pub currency: String,
    pub balance: Decimal,
}

/// Resolves `account_path` under `root` and computes its subtree balance.
pub fn balance_report<S, C>(
    root: &Account,
    account_path: &[S],
    as_of: NaiveDate,
    target_currency: &str,
    converter: &C,
) -> Result<BalanceReport>
where
    S: AsRef<str>,
    C: CurrencyConverter + ?Sized,
{
    let account = path::resolve(root, account_path)?;
    let balance = balance_as_of(account, as_of, target_currency, converter)?;
    Ok(BalanceReport {
        account: path::label_for(account, account_path),
        as_of,
        currency: target_currency.to_string(),
        balance,
    })
}
