//! Government identifiers in their canonical digits-only form.
//!
//! Forms arrive with punctuation (`123.456.789-09`, `12.345.678/0001-90`);
//! both identifiers strip everything but ASCII digits before checking the
//! length, so the stored value is always comparable byte for byte.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn digits_only(raw: &str) -> String {
  raw.chars().filter(char::is_ascii_digit).collect()
}

// ─── NationalId ──────────────────────────────────────────────────────────────

/// A natural person's national tax ID (CPF): exactly 11 digits.
///
/// This is the identity key of the partner directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationalId(String);

impl NationalId {
  pub const LEN: usize = 11;

  pub fn parse(raw: &str) -> Result<Self> {
    let digits = digits_only(raw);
    if digits.len() != Self::LEN {
      return Err(Error::InvalidNationalId(raw.to_owned()));
    }
    Ok(Self(digits))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for NationalId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for NationalId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<NationalId> for String {
  fn from(id: NationalId) -> Self { id.0 }
}

impl fmt::Display for NationalId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── TaxId ───────────────────────────────────────────────────────────────────

/// A company's tax ID: 14 digits (CNPJ), or 11 digits for employers
/// registered under an individual's CPF.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId(String);

impl TaxId {
  pub fn parse(raw: &str) -> Result<Self> {
    let digits = digits_only(raw);
    match digits.len() {
      11 | 14 => Ok(Self(digits)),
      _ => Err(Error::InvalidTaxId(raw.to_owned())),
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for TaxId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl TryFrom<String> for TaxId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::parse(&s) }
}

impl From<TaxId> for String {
  fn from(id: TaxId) -> Self { id.0 }
}

impl fmt::Display for TaxId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn national_id_strips_punctuation() {
    let id = NationalId::parse("123.456.789-09").unwrap();
    assert_eq!(id.as_str(), "12345678909");
  }

  #[test]
  fn national_id_rejects_wrong_length() {
    assert!(matches!(
      NationalId::parse("1234567890"),
      Err(Error::InvalidNationalId(_))
    ));
    assert!(NationalId::parse("").is_err());
    assert!(NationalId::parse("123456789012").is_err());
  }

  #[test]
  fn tax_id_accepts_cnpj_and_cpf_lengths() {
    assert_eq!(
      TaxId::parse("12.345.678/0001-90").unwrap().as_str(),
      "12345678000190"
    );
    assert_eq!(TaxId::parse("11111111111").unwrap().as_str(), "11111111111");
    assert!(matches!(TaxId::parse("1234"), Err(Error::InvalidTaxId(_))));
  }

  #[test]
  fn national_id_deserialises_through_normalisation() {
    let id: NationalId = serde_json::from_str("\"111.111.111-11\"").unwrap();
    assert_eq!(id.as_str(), "11111111111");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"11111111111\"");

    let bad: std::result::Result<NationalId, _> = serde_json::from_str("\"12\"");
    assert!(bad.is_err());
  }
}
