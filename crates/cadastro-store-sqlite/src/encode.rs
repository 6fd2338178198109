//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings, and percentages are integer hundredths.
//! Row readers take a column offset so the same reader works on a plain
//! `SELECT` and on a join.

use cadastro_core::{
  NationalId, Percentage, TaxId,
  company::Company,
  history::{CompanySnapshot, PartnerSnapshot},
  partner::{Address, Partner, PartnerLink},
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const COMPANY_COLUMNS: &str = "company_id, code, legal_name, trade_name, \
  tax_id, postal_code, address_kind, street, number, complement, \
  neighborhood, city, state, capital_cents, is_branch, created_at, updated_at";

pub const PARTNER_COLUMNS: &str = "partner_id, national_id, name, birth_date, \
  registry_id, license_id, postal_code, address_kind, street, number, \
  complement, neighborhood, city, state, created_at, updated_at";

pub const LINK_COLUMNS: &str = "link_id, company_id, partner_id, percentage, \
  active, created_at, updated_at";

pub const LINK_COLUMN_COUNT: usize = 7;

pub const COMPANY_SNAPSHOT_COLUMNS: &str = "snapshot_id, company_id, code, \
  legal_name, trade_name, tax_id, postal_code, address_kind, street, number, \
  complement, neighborhood, city, state, capital_cents, is_branch, source, \
  snapshot_at";

pub const PARTNER_SNAPSHOT_COLUMNS: &str = "snapshot_id, partner_id, \
  national_id, name, birth_date, registry_id, license_id, postal_code, \
  address_kind, street, number, complement, neighborhood, city, state, \
  company_id, percentage, source, snapshot_at";

/// Qualify every column in `columns` with a table alias, for joins.
pub fn qualified(alias: &str, columns: &str) -> String {
  columns
    .split(',')
    .map(|c| format!("{alias}.{}", c.trim()))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Address ─────────────────────────────────────────────────────────────────

/// Read the eight address columns starting at `at`.
fn read_address(row: &Row<'_>, at: usize) -> rusqlite::Result<Address> {
  Ok(Address {
    postal_code:  row.get(at)?,
    kind:         row.get(at + 1)?,
    street:       row.get(at + 2)?,
    number:       row.get(at + 3)?,
    complement:   row.get(at + 4)?,
    neighborhood: row.get(at + 5)?,
    city:         row.get(at + 6)?,
    state:        row.get(at + 7)?,
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `companies` row.
pub struct RawCompany {
  pub company_id:    String,
  pub code:          String,
  pub legal_name:    String,
  pub trade_name:    Option<String>,
  pub tax_id:        String,
  pub address:       Address,
  pub capital_cents: i64,
  pub is_branch:     bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawCompany {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      company_id:    row.get(0)?,
      code:          row.get(1)?,
      legal_name:    row.get(2)?,
      trade_name:    row.get(3)?,
      tax_id:        row.get(4)?,
      address:       read_address(row, 5)?,
      capital_cents: row.get(13)?,
      is_branch:     row.get(14)?,
      created_at:    row.get(15)?,
      updated_at:    row.get(16)?,
    })
  }

  pub fn into_company(self) -> Result<Company> {
    Ok(Company {
      company_id:    decode_uuid(&self.company_id)?,
      code:          self.code,
      legal_name:    self.legal_name,
      trade_name:    self.trade_name,
      tax_id:        TaxId::parse(&self.tax_id)?,
      address:       self.address,
      capital_cents: self.capital_cents,
      is_branch:     self.is_branch,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `partners` row.
pub struct RawPartner {
  pub partner_id:  String,
  pub national_id: String,
  pub name:        String,
  pub birth_date:  Option<String>,
  pub registry_id: Option<String>,
  pub license_id:  Option<String>,
  pub address:     Address,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawPartner {
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      partner_id:  row.get(at)?,
      national_id: row.get(at + 1)?,
      name:        row.get(at + 2)?,
      birth_date:  row.get(at + 3)?,
      registry_id: row.get(at + 4)?,
      license_id:  row.get(at + 5)?,
      address:     read_address(row, at + 6)?,
      created_at:  row.get(at + 14)?,
      updated_at:  row.get(at + 15)?,
    })
  }

  pub fn into_partner(self) -> Result<Partner> {
    Ok(Partner {
      partner_id:  decode_uuid(&self.partner_id)?,
      national_id: NationalId::parse(&self.national_id)?,
      name:        self.name,
      birth_date:  self.birth_date.as_deref().map(decode_date).transpose()?,
      registry_id: self.registry_id,
      license_id:  self.license_id,
      address:     self.address,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `company_partners` row.
pub struct RawLink {
  pub link_id:    String,
  pub company_id: String,
  pub partner_id: String,
  pub percentage: u32,
  pub active:     bool,
  pub created_at: String,
  pub updated_at: String,
}

impl RawLink {
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      link_id:    row.get(at)?,
      company_id: row.get(at + 1)?,
      partner_id: row.get(at + 2)?,
      percentage: row.get(at + 3)?,
      active:     row.get(at + 4)?,
      created_at: row.get(at + 5)?,
      updated_at: row.get(at + 6)?,
    })
  }

  pub fn into_link(self) -> Result<PartnerLink> {
    Ok(PartnerLink {
      link_id:    decode_uuid(&self.link_id)?,
      company_id: decode_uuid(&self.company_id)?,
      partner_id: decode_uuid(&self.partner_id)?,
      percentage: Percentage::from_hundredths(self.percentage)?,
      active:     self.active,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `company_history` row.
pub struct RawCompanySnapshot {
  pub snapshot_id:   String,
  pub company_id:    String,
  pub code:          String,
  pub legal_name:    String,
  pub trade_name:    Option<String>,
  pub tax_id:        String,
  pub address:       Address,
  pub capital_cents: i64,
  pub is_branch:     bool,
  pub source:        String,
  pub snapshot_at:   String,
}

impl RawCompanySnapshot {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      snapshot_id:   row.get(0)?,
      company_id:    row.get(1)?,
      code:          row.get(2)?,
      legal_name:    row.get(3)?,
      trade_name:    row.get(4)?,
      tax_id:        row.get(5)?,
      address:       read_address(row, 6)?,
      capital_cents: row.get(14)?,
      is_branch:     row.get(15)?,
      source:        row.get(16)?,
      snapshot_at:   row.get(17)?,
    })
  }

  pub fn into_snapshot(self) -> Result<CompanySnapshot> {
    Ok(CompanySnapshot {
      snapshot_id:   decode_uuid(&self.snapshot_id)?,
      company_id:    decode_uuid(&self.company_id)?,
      code:          self.code,
      legal_name:    self.legal_name,
      trade_name:    self.trade_name,
      tax_id:        TaxId::parse(&self.tax_id)?,
      address:       self.address,
      capital_cents: self.capital_cents,
      is_branch:     self.is_branch,
      source:        self.source,
      snapshot_at:   decode_dt(&self.snapshot_at)?,
    })
  }
}

/// Raw values read from a `partner_history` row.
pub struct RawPartnerSnapshot {
  pub snapshot_id: String,
  pub partner_id:  String,
  pub national_id: String,
  pub name:        String,
  pub birth_date:  Option<String>,
  pub registry_id: Option<String>,
  pub license_id:  Option<String>,
  pub address:     Address,
  pub company_id:  Option<String>,
  pub percentage:  Option<u32>,
  pub source:      String,
  pub snapshot_at: String,
}

impl RawPartnerSnapshot {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      snapshot_id: row.get(0)?,
      partner_id:  row.get(1)?,
      national_id: row.get(2)?,
      name:        row.get(3)?,
      birth_date:  row.get(4)?,
      registry_id: row.get(5)?,
      license_id:  row.get(6)?,
      address:     read_address(row, 7)?,
      company_id:  row.get(15)?,
      percentage:  row.get(16)?,
      source:      row.get(17)?,
      snapshot_at: row.get(18)?,
    })
  }

  pub fn into_snapshot(self) -> Result<PartnerSnapshot> {
    Ok(PartnerSnapshot {
      snapshot_id: decode_uuid(&self.snapshot_id)?,
      partner_id:  decode_uuid(&self.partner_id)?,
      national_id: NationalId::parse(&self.national_id)?,
      name:        self.name,
      birth_date:  self.birth_date.as_deref().map(decode_date).transpose()?,
      registry_id: self.registry_id,
      license_id:  self.license_id,
      address:     self.address,
      company_id:  self.company_id.as_deref().map(decode_uuid).transpose()?,
      percentage:  self
        .percentage
        .map(Percentage::from_hundredths)
        .transpose()?,
      source:      self.source,
      snapshot_at: decode_dt(&self.snapshot_at)?,
    })
  }
}
