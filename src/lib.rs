// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod rates;
pub mod utils;
pub mod commands;
