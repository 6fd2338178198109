//! The reconciliation rule: a company's partner roster must total exactly
//! 100%.
//!
//! Validation is batch-scoped. [`validate_roster`] runs once over the whole
//! submission before any row is written; single-link upserts never re-check
//! the total.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{
  Error, Result,
  partner::PartnerEntry,
  percentage::{Percentage, format_hundredths},
};

/// The exact-sum check failed. The message is shown to users verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the total of partner participations must be exactly 100%")]
pub struct ReconciliationError {
  total: ParticipationTotal,
}

impl ReconciliationError {
  /// The sum that was actually submitted.
  pub fn total(&self) -> ParticipationTotal { self.total }
}

/// A sum of percentages. Unlike [`Percentage`] it may exceed 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ParticipationTotal(u64);

impl ParticipationTotal {
  pub const fn hundredths(self) -> u64 { self.0 }

  pub fn is_full(self) -> bool {
    self.0 == u64::from(Percentage::FULL.hundredths())
  }
}

impl fmt::Display for ParticipationTotal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&format_hundredths(self.0))
  }
}

impl Serialize for ParticipationTotal {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(self.0 as f64 / 100.0)
  }
}

impl<'de> Deserialize<'de> for ParticipationTotal {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
      return Err(serde::de::Error::custom(format!("invalid total {value}")));
    }
    Ok(Self((value * 100.0).round() as u64))
  }
}

impl FromIterator<Percentage> for ParticipationTotal {
  fn from_iter<I: IntoIterator<Item = Percentage>>(iter: I) -> Self {
    Self(iter.into_iter().map(|p| u64::from(p.hundredths())).sum())
  }
}

/// Sum `shares` and require exactly 100.00.
///
/// Each share is already rounded to two decimals, so the integer sum is the
/// rounded sum.
pub fn reconcile<I>(shares: I) -> Result<ParticipationTotal, ReconciliationError>
where
  I: IntoIterator<Item = Percentage>,
{
  let total: ParticipationTotal = shares.into_iter().collect();
  if total.is_full() {
    Ok(total)
  } else {
    Err(ReconciliationError { total })
  }
}

/// Gate a roster submission.
///
/// An empty roster means "partners unchanged" and passes without reaching
/// the sum check. Otherwise every national ID must appear once and the
/// percentages must reconcile.
pub fn validate_roster(entries: &[PartnerEntry]) -> Result<()> {
  if entries.is_empty() {
    return Ok(());
  }

  let mut seen = HashSet::with_capacity(entries.len());
  for entry in entries {
    if !seen.insert(&entry.partner.national_id) {
      return Err(Error::DuplicatePartner(entry.partner.national_id.clone()));
    }
  }

  reconcile(entries.iter().map(|e| e.percentage))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ids::NationalId, partner::NewPartner};

  fn pct(s: &str) -> Percentage { Percentage::parse(s).unwrap() }

  fn entry(national_id: &str, percentage: &str) -> PartnerEntry {
    PartnerEntry {
      partner:    NewPartner::new(NationalId::parse(national_id).unwrap(), "Sócio"),
      percentage: pct(percentage),
    }
  }

  #[test]
  fn exact_hundred_is_approved() {
    let total = reconcile([pct("40"), pct("35"), pct("25")]).unwrap();
    assert!(total.is_full());
    assert_eq!(total.to_string(), "100.00");
  }

  #[test]
  fn short_total_carries_the_sum() {
    let err = reconcile([pct("40"), pct("35"), pct("24.99")]).unwrap_err();
    assert_eq!(err.total().to_string(), "99.99");
    assert_eq!(
      err.to_string(),
      "the total of partner participations must be exactly 100%"
    );
  }

  #[test]
  fn thirds_do_not_round_up_to_hundred() {
    let err = reconcile([pct("33.33"); 3]).unwrap_err();
    assert_eq!(err.total().hundredths(), 9999);
  }

  #[test]
  fn over_hundred_is_rejected() {
    let err = reconcile([pct("60"), pct("50")]).unwrap_err();
    assert_eq!(err.total().to_string(), "110.00");
  }

  #[test]
  fn many_small_shares_do_not_drift() {
    // Summed as f64 these come to 99.9999999999986.
    let shares = std::iter::repeat_n(pct("0.1"), 1000);
    assert!(reconcile(shares).is_ok());
  }

  #[test]
  fn empty_roster_skips_the_sum_check() {
    assert!(validate_roster(&[]).is_ok());
    // The sum check alone would reject an empty set.
    assert!(reconcile(std::iter::empty()).is_err());
  }

  #[test]
  fn roster_sum_is_enforced() {
    let ok = [entry("11111111111", "60"), entry("22222222222", "40")];
    assert!(validate_roster(&ok).is_ok());

    let short = [entry("11111111111", "60"), entry("22222222222", "39.99")];
    assert!(matches!(
      validate_roster(&short),
      Err(Error::Reconciliation(e)) if e.total().hundredths() == 9999
    ));
  }

  #[test]
  fn duplicate_national_ids_reject_the_batch() {
    let dup = [entry("111.111.111-11", "50"), entry("11111111111", "50")];
    assert!(matches!(
      validate_roster(&dup),
      Err(Error::DuplicatePartner(id)) if id.as_str() == "11111111111"
    ));
  }
}
