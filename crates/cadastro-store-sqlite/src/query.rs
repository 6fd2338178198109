//! Synchronous reads, run on the connection thread.
//!
//! Each function takes a plain `&Connection` so it can be called both from a
//! read-only `call` and from inside a write transaction.

use cadastro_core::{
  NationalId, TaxId,
  company::{Company, RecordKind},
  history::{CompanySnapshot, PartnerSnapshot},
  partner::{LinkedPartner, Partner, PartnerLink},
  reconcile::ParticipationTotal,
  store::Roster,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    COMPANY_COLUMNS, COMPANY_SNAPSHOT_COLUMNS, LINK_COLUMN_COUNT, LINK_COLUMNS,
    PARTNER_COLUMNS, PARTNER_SNAPSHOT_COLUMNS, RawCompany, RawCompanySnapshot,
    RawLink, RawPartner, RawPartnerSnapshot, encode_uuid, qualified,
  },
};

/// The table holding each kind of operational record.
pub fn record_table(kind: RecordKind) -> &'static str {
  match kind {
    RecordKind::Employee => "employees",
    RecordKind::Admission => "admissions",
    RecordKind::Transfer => "transfers",
    RecordKind::UserAssignment => "user_companies",
  }
}

// ─── Companies ───────────────────────────────────────────────────────────────

fn company_where(
  conn: &Connection,
  predicate: &str,
  value: &str,
) -> Result<Option<Company>> {
  let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE {predicate} = ?1");
  let raw = conn
    .query_row(&sql, params![value], RawCompany::from_row)
    .optional()?;
  raw.map(RawCompany::into_company).transpose()
}

pub fn company(conn: &Connection, id: Uuid) -> Result<Option<Company>> {
  company_where(conn, "company_id", &encode_uuid(id))
}

pub fn company_by_code(conn: &Connection, code: &str) -> Result<Option<Company>> {
  company_where(conn, "code", code)
}

pub fn company_by_tax_id(
  conn: &Connection,
  tax_id: &TaxId,
) -> Result<Option<Company>> {
  company_where(conn, "tax_id", tax_id.as_str())
}

pub fn companies(conn: &Connection) -> Result<Vec<Company>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY code"))?;
  let raws = stmt
    .query_map([], RawCompany::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawCompany::into_company).collect()
}

/// Whether any operational-record table references the company.
pub fn has_linked_records(conn: &Connection, company_id: Uuid) -> Result<bool> {
  let exists_any = RecordKind::ALL
    .iter()
    .map(|k| format!("EXISTS (SELECT 1 FROM {} WHERE company_id = ?1)", record_table(*k)))
    .collect::<Vec<_>>()
    .join(" OR ");

  let linked: bool = conn.query_row(
    &format!("SELECT {exists_any}"),
    params![encode_uuid(company_id)],
    |row| row.get(0),
  )?;
  Ok(linked)
}

// ─── Partners ────────────────────────────────────────────────────────────────

fn partner_where(
  conn: &Connection,
  predicate: &str,
  value: &str,
) -> Result<Option<Partner>> {
  let sql = format!("SELECT {PARTNER_COLUMNS} FROM partners WHERE {predicate} = ?1");
  let raw = conn
    .query_row(&sql, params![value], |row| RawPartner::from_row_at(row, 0))
    .optional()?;
  raw.map(RawPartner::into_partner).transpose()
}

pub fn partner(conn: &Connection, id: Uuid) -> Result<Option<Partner>> {
  partner_where(conn, "partner_id", &encode_uuid(id))
}

pub fn partner_by_national_id(
  conn: &Connection,
  national_id: &NationalId,
) -> Result<Option<Partner>> {
  partner_where(conn, "national_id", national_id.as_str())
}

// ─── Links ───────────────────────────────────────────────────────────────────

pub fn link(
  conn: &Connection,
  company_id: Uuid,
  partner_id: Uuid,
) -> Result<Option<PartnerLink>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {LINK_COLUMNS} FROM company_partners
         WHERE company_id = ?1 AND partner_id = ?2"
      ),
      params![encode_uuid(company_id), encode_uuid(partner_id)],
      |row| RawLink::from_row_at(row, 0),
    )
    .optional()?;
  raw.map(RawLink::into_link).transpose()
}

pub fn links_for_partner(
  conn: &Connection,
  partner_id: Uuid,
) -> Result<Vec<PartnerLink>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {LINK_COLUMNS} FROM company_partners
     WHERE partner_id = ?1 ORDER BY rowid"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(partner_id)], |row| {
      RawLink::from_row_at(row, 0)
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawLink::into_link).collect()
}

/// A company's links joined with their partners, in the order the links
/// were first created.
pub fn roster(
  conn: &Connection,
  company_id: Uuid,
  include_inactive: bool,
) -> Result<Roster> {
  let sql = format!(
    "SELECT {}, {}
     FROM company_partners l
     JOIN partners p ON p.partner_id = l.partner_id
     WHERE l.company_id = ?1 {}
     ORDER BY l.rowid",
    qualified("l", LINK_COLUMNS),
    qualified("p", PARTNER_COLUMNS),
    if include_inactive { "" } else { "AND l.active = 1" },
  );

  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![encode_uuid(company_id)], |row| {
      Ok((
        RawLink::from_row_at(row, 0)?,
        RawPartner::from_row_at(row, LINK_COLUMN_COUNT)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let partners = raws
    .into_iter()
    .map(|(link, partner)| {
      Ok(LinkedPartner { link: link.into_link()?, partner: partner.into_partner()? })
    })
    .collect::<Result<Vec<_>>>()?;

  let total: ParticipationTotal = partners
    .iter()
    .filter(|lp| lp.link.active)
    .map(|lp| lp.link.percentage)
    .collect();

  Ok(Roster { company_id, partners, total })
}

// ─── History ─────────────────────────────────────────────────────────────────

// Ordered by rowid: history is append-only, so insertion order is
// chronological even when several snapshots share a timestamp.

pub fn company_history(
  conn: &Connection,
  company_id: Uuid,
) -> Result<Vec<CompanySnapshot>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {COMPANY_SNAPSHOT_COLUMNS} FROM company_history
     WHERE company_id = ?1 ORDER BY rowid"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(company_id)], RawCompanySnapshot::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawCompanySnapshot::into_snapshot).collect()
}

pub fn partner_history(
  conn: &Connection,
  partner_id: Uuid,
) -> Result<Vec<PartnerSnapshot>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PARTNER_SNAPSHOT_COLUMNS} FROM partner_history
     WHERE partner_id = ?1 ORDER BY rowid"
  ))?;
  let raws = stmt
    .query_map(params![encode_uuid(partner_id)], RawPartnerSnapshot::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPartnerSnapshot::into_snapshot).collect()
}
