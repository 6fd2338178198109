//! Client companies and the rule that freezes their identifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, ids::TaxId, partner::Address};

/// A client legal entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
  pub company_id:    Uuid,
  /// Internal code used by the firm; unique.
  pub code:          String,
  pub legal_name:    String,
  pub trade_name:    Option<String>,
  pub tax_id:        TaxId,
  pub address:       Address,
  /// Share capital in centavos.
  pub capital_cents: i64,
  pub is_branch:     bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to a company upsert.
///
/// With `company_id` set this is an edit of that company. Without it the
/// store matches on `code`, then on `tax_id`, and creates the company if
/// neither is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
  #[serde(default)]
  pub company_id:    Option<Uuid>,
  pub code:          String,
  pub legal_name:    String,
  #[serde(default)]
  pub trade_name:    Option<String>,
  pub tax_id:        TaxId,
  #[serde(default)]
  pub address:       Address,
  #[serde(default)]
  pub capital_cents: i64,
  #[serde(default)]
  pub is_branch:     bool,
}

impl NewCompany {
  pub fn new(
    code: impl Into<String>,
    legal_name: impl Into<String>,
    tax_id: TaxId,
  ) -> Self {
    Self {
      company_id: None,
      code: code.into(),
      legal_name: legal_name.into(),
      trade_name: None,
      tax_id,
      address: Address::default(),
      capital_cents: 0,
      is_branch: false,
    }
  }

  /// Trim the free-text identifiers and reject blanks.
  pub fn normalized(mut self) -> Result<Self> {
    self.code = self.code.trim().to_owned();
    self.legal_name = self.legal_name.trim().to_owned();
    if self.code.is_empty() {
      return Err(Error::MissingField("company code"));
    }
    if self.legal_name.is_empty() {
      return Err(Error::MissingField("legal name"));
    }
    if self.capital_cents < 0 {
      return Err(Error::NegativeCapital(self.capital_cents));
    }
    Ok(self)
  }
}

// ─── Immutability ────────────────────────────────────────────────────────────

/// Fields that freeze once a company has operational records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImmutableField {
  Code,
  TaxId,
}

impl fmt::Display for ImmutableField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Code => "company code",
      Self::TaxId => "company tax ID",
    })
  }
}

/// Kinds of operational records that lock a company's identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
  Employee,
  Admission,
  Transfer,
  UserAssignment,
}

impl RecordKind {
  pub const ALL: [Self; 4] = [
    Self::Employee,
    Self::Admission,
    Self::Transfer,
    Self::UserAssignment,
  ];
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalized_trims_and_requires_code() {
    let tax = TaxId::parse("12345678000190").unwrap();
    let c = NewCompany::new("  10 ", " Acme Ltda ", tax.clone())
      .normalized()
      .unwrap();
    assert_eq!(c.code, "10");
    assert_eq!(c.legal_name, "Acme Ltda");

    let err = NewCompany::new("  ", "Acme", tax).normalized().unwrap_err();
    assert!(matches!(err, Error::MissingField("company code")));
  }

  #[test]
  fn immutable_field_names_the_field() {
    assert_eq!(ImmutableField::Code.to_string(), "company code");
    assert_eq!(ImmutableField::TaxId.to_string(), "company tax ID");
  }
}
