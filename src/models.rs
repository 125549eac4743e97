// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, btree_map::Entry};
use std::sync::Arc;

/// Amount as the ledger stores it: `num / denom`, denom a power of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: i64,
    pub denom: i64,
}

impl Rational {
    pub fn new(num: i64, denom: i64) -> Self {
        Self { num, denom }
    }

    /// Storage form of a parsed amount, e.g. `-150.00` -> `-15000/100`.
    pub fn from_decimal(d: Decimal) -> Option<Self> {
        let num = i64::try_from(d.mantissa()).ok()?;
        let denom = 10i64.checked_pow(d.scale())?;
        Some(Self { num, denom })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnHeader {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
}

/// One leg of a transaction, posted against the account that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub txn: Arc<TxnHeader>,
    pub amount: Rational,
}

impl Split {
    pub fn new(txn: Arc<TxnHeader>, amount: Rational) -> Self {
        Self { txn, amount }
    }

    /// The owning transaction's date; splits carry no date of their own.
    pub fn date(&self) -> NaiveDate {
        self.txn.date
    }
}

/// Read-only snapshot of one node of the account tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    name: String,
    commodity: String,
    children: BTreeMap<String, Account>,
    splits: Vec<Split>,
}

impl Account {
    pub fn new(name: impl Into<String>, commodity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commodity: commodity.into(),
            children: BTreeMap::new(),
            splits: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commodity(&self) -> &str {
        &self.commodity
    }

    pub fn child(&self, name: &str) -> Option<&Account> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = &Account> {
        self.children.values()
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// Attaches `child`, replacing any existing child of the same name.
    pub fn add_child(&mut self, child: Account) -> &mut Account {
        match self.children.entry(child.name.clone()) {
            Entry::Occupied(mut e) => {
                e.insert(child);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(child),
        }
    }

    pub fn push_split(&mut self, split: Split) {
        self.splits.push(split);
    }

    /// Builder form of [`Account::add_child`].
    pub fn with_child(mut self, child: Account) -> Self {
        self.add_child(child);
        self
    }

    /// Builder form of [`Account::push_split`].
    pub fn with_split(mut self, split: Split) -> Self {
        self.push_split(split);
        self
    }

    /// Every transitive descendant in pre-order, not including `self`.
    /// Computed lazily with an explicit stack.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.values().rev().collect(),
        }
    }

    /// `self` followed by [`Account::descendants`].
    pub fn subtree(&self) -> impl Iterator<Item = &Account> {
        std::iter::once(self).chain(self.descendants())
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Account>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Account;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.values().rev());
        Some(node)
    }
}
