//! Partners (sócios) and their links to companies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, ids::NationalId, percentage::Percentage};

// ─── Address ─────────────────────────────────────────────────────────────────

/// A Brazilian postal address as captured by the registration forms. Shared
/// by partners and companies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
  pub postal_code:  Option<String>,
  /// Street type, e.g. "Rua", "Avenida".
  pub kind:         Option<String>,
  pub street:       Option<String>,
  pub number:       Option<String>,
  pub complement:   Option<String>,
  pub neighborhood: Option<String>,
  pub city:         Option<String>,
  /// Two-letter state code.
  pub state:        Option<String>,
}

// ─── Partner ─────────────────────────────────────────────────────────────────

/// A natural person who may hold equity in one or more companies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
  pub partner_id:  Uuid,
  pub national_id: NationalId,
  pub name:        String,
  pub birth_date:  Option<NaiveDate>,
  /// General registry number (RG).
  pub registry_id: Option<String>,
  /// Driver's licence number (CNH).
  pub license_id:  Option<String>,
  pub address:     Address,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to a partner upsert. Every field overwrites the stored value,
/// including `None`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPartner {
  pub national_id: NationalId,
  pub name:        String,
  #[serde(default)]
  pub birth_date:  Option<NaiveDate>,
  #[serde(default)]
  pub registry_id: Option<String>,
  #[serde(default)]
  pub license_id:  Option<String>,
  #[serde(default)]
  pub address:     Address,
}

impl NewPartner {
  /// Convenience constructor with every optional field empty.
  pub fn new(national_id: NationalId, name: impl Into<String>) -> Self {
    Self {
      national_id,
      name: name.into(),
      birth_date: None,
      registry_id: None,
      license_id: None,
      address: Address::default(),
    }
  }

  /// Trim the name and reject a blank one.
  pub fn normalized(mut self) -> Result<Self> {
    self.name = self.name.trim().to_owned();
    if self.name.is_empty() {
      return Err(Error::MissingField("partner name"));
    }
    Ok(self)
  }
}

/// One line of a roster submission: who, and how much of the company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerEntry {
  #[serde(flatten)]
  pub partner:    NewPartner,
  pub percentage: Percentage,
}

// ─── Links ───────────────────────────────────────────────────────────────────

/// One partner's stake in one company. Unique per (company, partner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerLink {
  pub link_id:    Uuid,
  pub company_id: Uuid,
  pub partner_id: Uuid,
  pub percentage: Percentage,
  /// Cleared by the disengage action; the row itself is never deleted.
  pub active:     bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A link joined with the partner it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedPartner {
  pub partner: Partner,
  pub link:    PartnerLink,
}
