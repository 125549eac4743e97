// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the aggregation engine and the ledger adapter feeding it.
///
/// None of these are retried: each one means the ledger data or the caller's
/// inputs are malformed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Account path '{}' not found", .path.join(":"))]
    PathNotFound { path: Vec<String> },

    #[error("Cannot convert {value} to an exact decimal: {reason}")]
    Conversion { value: String, reason: &'static str },

    #[error("Transaction dated {date} lies outside period {start}..={end}")]
    InvariantViolation {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Period list is inconsistent: {0}")]
    MalformedPeriods(String),

    #[error("Invalid month {0}, expected 1-12")]
    InvalidMonth(u32),

    #[error("No {from}->{to} rate on or before {date}")]
    MissingRate {
        from: String,
        to: String,
        date: NaiveDate,
    },

    #[error("Decimal overflow while summing {0}")]
    Overflow(String),

    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
