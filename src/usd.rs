use anyhow::{bail, ensure};
use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

/// Sub-units per dollar.
const SCALE: i64 = 10_000;

/// Represents an amount of money in USD currency.
///
/// The amount is stored internally as an integer number of hundredths of a
/// cent, so that sums of source values with up to four decimal places are
/// exact. The [`Display`] implementation rounds half-up (away from zero) to
/// whole cents and formats the result as `$1,234.56`.
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Usd(i64);

impl Usd {
    /// Creates an amount from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(cents * (SCALE / 100))
    }

    /// Returns the amount rounded half-up to whole cents.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::str::FromStr;
    /// # use sales_insight::Usd;
    /// assert_eq!(Usd::from_str("0.125").unwrap().cents(), 13);
    /// assert_eq!(Usd::from_str("-0.125").unwrap().cents(), -13);
    /// assert_eq!(Usd::from_str("0.1249").unwrap().cents(), 12);
    /// ```
    #[must_use]
    pub fn cents(self) -> i64 {
        let per_cent = SCALE / 100;
        let rounded = (self.0.abs() + per_cent / 2) / per_cent;
        if self.0 < 0 {
            -rounded
        } else {
            rounded
        }
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self.cents() < 0
    }
}

impl Debug for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cents = self.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.unsigned_abs();
        let dollars = group_thousands(cents / 100);
        f.pad(&format!("${sign}{dollars}.{:02}", cents % 100))
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl FromStr for Usd {
    type Err = anyhow::Error;

    /// Parses amounts such as `261.96`, `-383.031`, `$1,234.5` or `$-12`.
    ///
    /// Digits beyond the fourth decimal place are rounded half-up.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut rest = s.trim();
        let mut negative = false;
        if let Some(r) = rest.strip_prefix('-') {
            negative = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('+') {
            rest = r;
        }
        rest = rest.strip_prefix('$').unwrap_or(rest);
        if !negative {
            if let Some(r) = rest.strip_prefix('-') {
                negative = true;
                rest = r;
            }
        }
        let digits = rest.replace(',', "");
        let (whole, frac) = digits.split_once('.').unwrap_or((&digits, ""));
        ensure!(
            !(whole.is_empty() && frac.is_empty()),
            "empty amount: {s:?}"
        );
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            bail!("invalid amount: {s:?}");
        }
        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse()? };
        let mut units: i64 = 0;
        let mut place = SCALE / 10;
        let mut frac_digits = frac.bytes();
        for b in frac_digits.by_ref().take(4) {
            units += i64::from(b - b'0') * place;
            place /= 10;
        }
        if frac_digits.next().is_some_and(|b| b >= b'5') {
            units += 1;
        }
        let value = whole
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(units))
            .ok_or_else(|| anyhow::anyhow!("amount out of range: {s:?}"))?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Add for Usd {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
