//! Fixed-point participation percentages.
//!
//! A [`Percentage`] is stored as integer hundredths of a percent, so `33.33%`
//! is `3333` and `100%` is `10_000`. Sums are exact; the only rounding happens
//! once, when a value enters from a form or a float.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(u32);

impl Percentage {
  pub const ZERO: Self = Self(0);
  pub const FULL: Self = Self(10_000);

  /// Build from hundredths of a percent (`2550` is `25.50%`).
  pub fn from_hundredths(hundredths: u32) -> Result<Self> {
    if hundredths > Self::FULL.0 {
      return Err(Error::InvalidPercentage(format_hundredths(hundredths.into())));
    }
    Ok(Self(hundredths))
  }

  /// Round a float to two decimals, half-up on its shortest decimal form,
  /// so `1.005` is `1.01` even though the nearest `f64` sits just below it.
  pub fn from_f64(value: f64) -> Result<Self> {
    if !value.is_finite() || value < 0.0 {
      return Err(Error::InvalidPercentage(value.to_string()));
    }
    if value == 0.0 {
      return Ok(Self::ZERO);
    }
    // `Display` for f64 never uses exponent notation.
    Self::parse(&value.to_string())
  }

  /// Parse decimal text. Accepts `,` as the decimal separator and an optional
  /// trailing `%`; digits past the second decimal are rounded half-up.
  pub fn parse(raw: &str) -> Result<Self> {
    let invalid = || Error::InvalidPercentage(raw.to_owned());

    let text = raw.trim().trim_end_matches('%').trim_end().replace(',', ".");
    let (int_part, frac_part) = match text.split_once('.') {
      Some((i, f)) => (i, f),
      None => (text.as_str(), ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
      || !all_digits(int_part)
      || !all_digits(frac_part)
    {
      return Err(invalid());
    }

    let whole: u64 = if int_part.is_empty() {
      0
    } else {
      int_part.parse().map_err(|_| invalid())?
    };

    let mut frac = frac_part.bytes().map(|b| u64::from(b - b'0'));
    let tenths = frac.next().unwrap_or(0);
    let hundredths = frac.next().unwrap_or(0);
    let round_up = frac.next().is_some_and(|d| d >= 5);

    let total = whole
      .checked_mul(100)
      .map(|w| w + tenths * 10 + hundredths + u64::from(round_up))
      .ok_or_else(invalid)?;

    u32::try_from(total)
      .ok()
      .filter(|h| *h <= Self::FULL.0)
      .map(Self)
      .ok_or_else(invalid)
  }

  pub const fn hundredths(self) -> u32 { self.0 }

  pub fn to_f64(self) -> f64 { f64::from(self.0) / 100.0 }
}

/// Render a hundredths count as `"99.99"`.
pub fn format_hundredths(hundredths: u64) -> String {
  format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

impl fmt::Display for Percentage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&format_hundredths(self.0.into()))
  }
}

impl FromStr for Percentage {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl Serialize for Percentage {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.to_f64())
  }
}

impl<'de> Deserialize<'de> for Percentage {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Number(f64),
      Text(String),
    }

    let parsed = match Raw::deserialize(deserializer)? {
      Raw::Number(n) => Self::from_f64(n),
      Raw::Text(s) => Self::parse(&s),
    };
    parsed.map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_decimal_text() {
    assert_eq!(Percentage::parse("40").unwrap().hundredths(), 4000);
    assert_eq!(Percentage::parse("24.99").unwrap().hundredths(), 2499);
    assert_eq!(Percentage::parse("33,33").unwrap().hundredths(), 3333);
    assert_eq!(Percentage::parse(" 12.5% ").unwrap().hundredths(), 1250);
    assert_eq!(Percentage::parse(".5").unwrap().hundredths(), 50);
    assert_eq!(Percentage::parse("100.00").unwrap(), Percentage::FULL);
  }

  #[test]
  fn third_decimal_rounds_half_up() {
    assert_eq!(Percentage::parse("33.335").unwrap().hundredths(), 3334);
    assert_eq!(Percentage::parse("33.334").unwrap().hundredths(), 3333);
    assert_eq!(Percentage::parse("0.005").unwrap().hundredths(), 1);
  }

  #[test]
  fn rejects_out_of_range_and_garbage() {
    for bad in ["", "-1", "100.01", "abc", "1.2.3", "1e2", "."] {
      assert!(
        matches!(Percentage::parse(bad), Err(Error::InvalidPercentage(_))),
        "accepted {bad:?}"
      );
    }
    assert!(Percentage::from_f64(-0.01).is_err());
    assert!(Percentage::from_f64(f64::NAN).is_err());
    assert!(Percentage::from_hundredths(10_001).is_err());
  }

  #[test]
  fn floats_round_to_two_decimals() {
    assert_eq!(Percentage::from_f64(24.99).unwrap().hundredths(), 2499);
    assert_eq!(Percentage::from_f64(33.333).unwrap().hundredths(), 3333);
    assert_eq!(Percentage::from_f64(0.125).unwrap().hundredths(), 13);
    assert_eq!(Percentage::from_f64(1.005).unwrap().hundredths(), 101);
    assert_eq!(Percentage::from_f64(2.675).unwrap().hundredths(), 268);
    assert_eq!(Percentage::from_f64(0.0000001).unwrap(), Percentage::ZERO);
    assert_eq!(Percentage::from_f64(-0.0).unwrap(), Percentage::ZERO);
    assert!(Percentage::from_f64(100.005).is_err());
  }

  #[test]
  fn displays_with_two_decimals() {
    assert_eq!(Percentage::parse("7").unwrap().to_string(), "7.00");
    assert_eq!(Percentage::parse("99.9").unwrap().to_string(), "99.90");
  }

  #[test]
  fn serde_accepts_numbers_and_strings() {
    let n: Percentage = serde_json::from_str("45").unwrap();
    let s: Percentage = serde_json::from_str("\"45,5\"").unwrap();
    assert_eq!(n.hundredths(), 4500);
    assert_eq!(s.hundredths(), 4550);
    assert_eq!(serde_json::to_string(&s).unwrap(), "45.5");
    assert!(serde_json::from_str::<Percentage>("101").is_err());
  }
}
