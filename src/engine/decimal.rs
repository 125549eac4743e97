// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Exact conversion of ledger rationals into base-10 values.
//!
//! The ledger stores every amount as `num / denom` with `denom` a power of
//! ten. This is the only place such values enter the decimal domain.

use crate::error::{Error, Result};
use crate::models::Rational;
use rust_decimal::Decimal;
use std::fmt;

/// `(-1)^negative * digits * 10^exponent`, held exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactDecimal {
    negative: bool,
    digits: Vec<u8>,
    exponent: i32,
}

impl ExactDecimal {
    /// Fails unless `r.denom` is exactly `10^k` for some `k >= 0`.
    pub fn from_rational(r: Rational) -> Result<Self> {
        let value = || format!("{}/{}", r.num, r.denom);
        if r.denom <= 0 {
            return Err(Error::Conversion {
                value: value(),
                reason: "denominator must be positive",
            });
        }
        let k = r.denom.ilog10();
        if 10i64.checked_pow(k) != Some(r.denom) {
            return Err(Error::Conversion {
                value: value(),
                reason: "denominator is not a power of ten",
            });
        }

        let digits = r
            .num
            .unsigned_abs()
            .to_string()
            .bytes()
            .map(|b| b - b'0')
            .collect();
        Ok(Self {
            negative: r.num < 0,
            digits,
            exponent: -(k as i32),
        })
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Most significant digit first; zero is `[0]`.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    fn mantissa(&self) -> Option<i128> {
        let mut m: i128 = 0;
        for d in &self.digits {
            m = m.checked_mul(10)?.checked_add(i128::from(*d))?;
        }
        Some(if self.negative { -m } else { m })
    }

    /// Re-expresses the value as `(numerator, 10^-exponent)`, or
    /// `(numerator * 10^exponent, 1)` for a non-negative exponent.
    pub fn to_rational(&self) -> Option<(i128, i128)> {
        let m = self.mantissa()?;
        let p = 10i128.checked_pow(self.exponent.unsigned_abs())?;
        if self.exponent >= 0 {
            Some((m.checked_mul(p)?, 1))
        } else {
            Some((m, p))
        }
    }

    pub fn to_decimal(&self) -> Result<Decimal> {
        let err = |reason| Error::Conversion {
            value: self.to_string(),
            reason,
        };
        let m = self.mantissa().ok_or_else(|| err("mantissa too large"))?;
        if self.exponent >= 0 {
            let p = 10i128
                .checked_pow(self.exponent as u32)
                .ok_or_else(|| err("exponent too large"))?;
            let m = m.checked_mul(p).ok_or_else(|| err("mantissa too large"))?;
            Decimal::try_from_i128_with_scale(m, 0).map_err(|_| err("exceeds decimal range"))
        } else {
            Decimal::try_from_i128_with_scale(m, self.exponent.unsigned_abs())
                .map_err(|_| err("exceeds decimal range"))
        }
    }
}

impl fmt::Display for ExactDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s: String = self.digits.iter().map(|d| char::from(b'0' + d)).collect();
        if self.exponent > 0 {
            s.extend(std::iter::repeat_n('0', self.exponent as usize));
        } else if self.exponent < 0 {
            let scale = self.exponent.unsigned_abs() as usize;
            if s.len() <= scale {
                let pad = "0".repeat(scale + 1 - s.len());
                s.insert_str(0, &pad);
            }
            s.insert(s.len() - scale, '.');
        }
        if self.negative {
            s.insert(0, '-');
        }
        f.write_str(&s)
    }
}

/// Ledger amount straight to a `Decimal`, the form every sum uses.
pub fn convert(r: Rational) -> Result<Decimal> {
    ExactDecimal::from_rational(r)?.to_decimal()
}
