// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Period aggregation and exact balance computation over an in-memory
//! account tree. Nothing in here touches the store.

pub mod balance;
pub mod decimal;
pub mod path;
pub mod periods;
pub mod quarters;

pub use balance::{BalanceReport, CurrencyConverter, balance_as_of, balance_report};
pub use decimal::ExactDecimal;
pub use path::resolve;
pub use periods::{FlowReport, Period, aggregate, aggregate_subtree, flow_report};
pub use quarters::{PeriodBoundaries, quarters, years};
