//! Append-only history of company and partner writes.
//!
//! Every accepted write produces exactly one snapshot, whether or not any
//! field changed. Snapshots are never updated or deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  company::Company,
  ids::{NationalId, TaxId},
  partner::{Address, Partner},
  percentage::Percentage,
};

/// Source tag for writes coming from the company edit form.
pub const SOURCE_COMPANY_FORM: &str = "company_form";
/// Source tag for rows written by a bulk company import.
pub const SOURCE_COMPANY_IMPORT: &str = "company_import";
/// Source tag for a partner saved on its own, outside a roster.
pub const SOURCE_PARTNER_FORM: &str = "partner_form";

/// Full copy of a company at the moment of a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySnapshot {
  pub snapshot_id:   Uuid,
  pub company_id:    Uuid,
  pub code:          String,
  pub legal_name:    String,
  pub trade_name:    Option<String>,
  pub tax_id:        TaxId,
  pub address:       Address,
  pub capital_cents: i64,
  pub is_branch:     bool,
  pub source:        String,
  pub snapshot_at:   DateTime<Utc>,
}

impl CompanySnapshot {
  pub fn capture(company: &Company, source: &str, at: DateTime<Utc>) -> Self {
    Self {
      snapshot_id:   Uuid::new_v4(),
      company_id:    company.company_id,
      code:          company.code.clone(),
      legal_name:    company.legal_name.clone(),
      trade_name:    company.trade_name.clone(),
      tax_id:        company.tax_id.clone(),
      address:       company.address.clone(),
      capital_cents: company.capital_cents,
      is_branch:     company.is_branch,
      source:        source.to_owned(),
      snapshot_at:   at,
    }
  }
}

/// Full copy of a partner at the moment of a write, plus the roster context
/// (company and percentage) when the write came from a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerSnapshot {
  pub snapshot_id: Uuid,
  pub partner_id:  Uuid,
  pub national_id: NationalId,
  pub name:        String,
  pub birth_date:  Option<NaiveDate>,
  pub registry_id: Option<String>,
  pub license_id:  Option<String>,
  pub address:     Address,
  pub company_id:  Option<Uuid>,
  pub percentage:  Option<Percentage>,
  pub source:      String,
  pub snapshot_at: DateTime<Utc>,
}

impl PartnerSnapshot {
  pub fn capture(
    partner: &Partner,
    roster: Option<(Uuid, Percentage)>,
    source: &str,
    at: DateTime<Utc>,
  ) -> Self {
    Self {
      snapshot_id: Uuid::new_v4(),
      partner_id:  partner.partner_id,
      national_id: partner.national_id.clone(),
      name:        partner.name.clone(),
      birth_date:  partner.birth_date,
      registry_id: partner.registry_id.clone(),
      license_id:  partner.license_id.clone(),
      address:     partner.address.clone(),
      company_id:  roster.map(|(company_id, _)| company_id),
      percentage:  roster.map(|(_, percentage)| percentage),
      source:      source.to_owned(),
      snapshot_at: at,
    }
  }
}
