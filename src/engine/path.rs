// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use crate::models::Account;

pub const SEPARATOR: char = ':';

/// Splits `Expenses:Food:Dining` into its segments. Empty segments are kept
/// so that a malformed path fails resolution instead of matching something.
pub fn parse_path(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(SEPARATOR).map(str::to_string).collect()
}

pub fn display_path<S: AsRef<str>>(path: &[S]) -> String {
    let mut out = String::new();
    for (i, seg) in path.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(seg.as_ref());
    }
    out
}

/// Report label for the account `path` resolved to: the joined path, or the
/// account's own name for the empty path.
pub fn label_for<S: AsRef<str>>(account: &Account, path: &[S]) -> String {
    if path.is_empty() {
        account.name().to_string()
    } else {
        display_path(path)
    }
}

/// Walks `path` one direct child at a time, exact and case-sensitive.
/// An empty path resolves to `root` itself.
pub fn resolve<'a, S: AsRef<str>>(root: &'a Account, path: &[S]) -> Result<&'a Account> {
    let mut node = root;
    for segment in path {
        node = node
            .child(segment.as_ref())
            .ok_or_else(|| Error::PathNotFound {
                path: path.iter().map(|s| s.as_ref().to_string()).collect(),
            })?;
    }
    Ok(node)
}

/// Convenience over [`resolve`] for a `:`-separated path string.
pub fn resolve_str<'a>(root: &'a Account, path: &str) -> Result<&'a Account> {
    resolve(root, &parse_path(path))
}
