//! Synchronous writes, run on the connection thread inside a transaction.
//!
//! Nothing here commits. Callers open a `rusqlite::Transaction`, run one of
//! the batch functions against it, and commit only if it returned `Ok`, so a
//! failure at any row leaves no trace.

use std::collections::HashSet;

use cadastro_core::{
  Percentage,
  company::{Company, ImmutableField, NewCompany, RecordKind},
  history::{CompanySnapshot, PartnerSnapshot},
  partner::{LinkedPartner, NewPartner, Partner, PartnerEntry, PartnerLink},
  store::{CompanySubmission, ImportReport, PreservedField, SavedCompany},
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ffi, params};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{encode_date, encode_dt, encode_uuid},
  query,
};

/// Turn a unique-index violation into a [`Error::Conflict`]; pass anything
/// else through.
fn unique_conflict(err: rusqlite::Error, message: impl FnOnce() -> String) -> Error {
  match &err {
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      Error::Conflict(message())
    }
    _ => Error::Sqlite(err),
  }
}

// ─── Companies ───────────────────────────────────────────────────────────────

/// Outcome of a single company upsert.
pub struct CompanyWrite {
  pub company:   Company,
  pub created:   bool,
  pub preserved: Vec<PreservedField>,
}

/// Upsert one company. Once the company has linked records a changed code or
/// tax ID keeps its stored value and is listed in `preserved`; every other
/// field is written. Does not append a snapshot.
pub fn upsert_company(
  conn: &Connection,
  input: NewCompany,
  now: DateTime<Utc>,
) -> Result<CompanyWrite> {
  let mut input = input.normalized()?;

  let existing = match input.company_id {
    Some(id) => Some(query::company(conn, id)?.ok_or(Error::CompanyNotFound(id))?),
    None => match query::company_by_code(conn, &input.code)? {
      Some(c) => Some(c),
      None => query::company_by_tax_id(conn, &input.tax_id)?,
    },
  };

  let Some(current) = existing else {
    let company = Company {
      company_id:    Uuid::new_v4(),
      code:          input.code,
      legal_name:    input.legal_name,
      trade_name:    input.trade_name,
      tax_id:        input.tax_id,
      address:       input.address,
      capital_cents: input.capital_cents,
      is_branch:     input.is_branch,
      created_at:    now,
      updated_at:    now,
    };
    insert_company(conn, &company)?;
    tracing::debug!(company_id = %company.company_id, code = %company.code, "company created");
    return Ok(CompanyWrite { company, created: true, preserved: Vec::new() });
  };

  let mut changed = Vec::new();
  if input.code != current.code {
    changed.push(ImmutableField::Code);
  }
  if input.tax_id != current.tax_id {
    changed.push(ImmutableField::TaxId);
  }

  let mut preserved = Vec::new();
  if !changed.is_empty() && query::has_linked_records(conn, current.company_id)? {
    for field in changed.drain(..) {
      let (kept, submitted) = match field {
        ImmutableField::Code => {
          let submitted = std::mem::replace(&mut input.code, current.code.clone());
          (current.code.clone(), submitted)
        }
        ImmutableField::TaxId => {
          let submitted = std::mem::replace(&mut input.tax_id, current.tax_id.clone());
          (current.tax_id.to_string(), submitted.to_string())
        }
      };
      tracing::warn!(
        company_id = %current.company_id,
        %field,
        %kept,
        %submitted,
        "kept frozen company identifier"
      );
      preserved.push(PreservedField { company_id: current.company_id, field, kept, submitted });
    }
  }

  // Identifiers that may change must not collide with another company.
  for field in &changed {
    let owner = match field {
      ImmutableField::Code => query::company_by_code(conn, &input.code)?,
      ImmutableField::TaxId => query::company_by_tax_id(conn, &input.tax_id)?,
    };
    if owner.is_some_and(|o| o.company_id != current.company_id) {
      let value = match field {
        ImmutableField::Code => input.code.clone(),
        ImmutableField::TaxId => input.tax_id.to_string(),
      };
      return Err(Error::Conflict(format!("{field} {value} is already in use")));
    }
  }

  let company = Company {
    company_id:    current.company_id,
    code:          input.code,
    legal_name:    input.legal_name,
    trade_name:    input.trade_name,
    tax_id:        input.tax_id,
    address:       input.address,
    capital_cents: input.capital_cents,
    is_branch:     input.is_branch,
    created_at:    current.created_at,
    updated_at:    now,
  };
  update_company(conn, &company)?;
  tracing::debug!(company_id = %company.company_id, code = %company.code, "company updated");

  Ok(CompanyWrite { company, created: false, preserved })
}

fn insert_company(conn: &Connection, c: &Company) -> Result<()> {
  let a = &c.address;
  conn
    .execute(
      "INSERT INTO companies (
         company_id, code, legal_name, trade_name, tax_id,
         postal_code, address_kind, street, number, complement,
         neighborhood, city, state, capital_cents, is_branch,
         created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
      params![
        encode_uuid(c.company_id),
        c.code,
        c.legal_name,
        c.trade_name,
        c.tax_id.as_str(),
        a.postal_code,
        a.kind,
        a.street,
        a.number,
        a.complement,
        a.neighborhood,
        a.city,
        a.state,
        c.capital_cents,
        c.is_branch,
        encode_dt(c.created_at),
        encode_dt(c.updated_at),
      ],
    )
    .map_err(|e| {
      unique_conflict(e, || format!("company {} / {} already exists", c.code, c.tax_id))
    })?;
  Ok(())
}

fn update_company(conn: &Connection, c: &Company) -> Result<()> {
  let a = &c.address;
  conn
    .execute(
      "UPDATE companies SET
         code = ?2, legal_name = ?3, trade_name = ?4, tax_id = ?5,
         postal_code = ?6, address_kind = ?7, street = ?8, number = ?9,
         complement = ?10, neighborhood = ?11, city = ?12, state = ?13,
         capital_cents = ?14, is_branch = ?15, updated_at = ?16
       WHERE company_id = ?1",
      params![
        encode_uuid(c.company_id),
        c.code,
        c.legal_name,
        c.trade_name,
        c.tax_id.as_str(),
        a.postal_code,
        a.kind,
        a.street,
        a.number,
        a.complement,
        a.neighborhood,
        a.city,
        a.state,
        c.capital_cents,
        c.is_branch,
        encode_dt(c.updated_at),
      ],
    )
    .map_err(|e| {
      unique_conflict(e, || format!("company {} / {} already exists", c.code, c.tax_id))
    })?;
  Ok(())
}

pub fn attach_record(
  conn: &Connection,
  company_id: Uuid,
  kind: RecordKind,
  now: DateTime<Utc>,
) -> Result<Uuid> {
  if query::company(conn, company_id)?.is_none() {
    return Err(Error::CompanyNotFound(company_id));
  }
  let record_id = Uuid::new_v4();
  conn.execute(
    &format!(
      "INSERT INTO {} (record_id, company_id, created_at) VALUES (?1, ?2, ?3)",
      query::record_table(kind)
    ),
    params![encode_uuid(record_id), encode_uuid(company_id), encode_dt(now)],
  )?;
  Ok(record_id)
}

// ─── Partners ────────────────────────────────────────────────────────────────

/// Match-or-create by national ID with full-overwrite semantics, then append
/// one snapshot. `roster` is the (company, percentage) context, if any.
pub fn upsert_partner(
  conn: &Connection,
  input: NewPartner,
  roster: Option<(Uuid, Percentage)>,
  source: &str,
  now: DateTime<Utc>,
) -> Result<Partner> {
  let input = input.normalized()?;
  let existing = query::partner_by_national_id(conn, &input.national_id)?;
  let created = existing.is_none();

  let (partner_id, created_at) = existing
    .map(|p| (p.partner_id, p.created_at))
    .unwrap_or_else(|| (Uuid::new_v4(), now));

  let partner = Partner {
    partner_id,
    national_id: input.national_id,
    name: input.name,
    birth_date: input.birth_date,
    registry_id: input.registry_id,
    license_id: input.license_id,
    address: input.address,
    created_at,
    updated_at: now,
  };

  let a = &partner.address;
  let sql = if created {
    "INSERT INTO partners (
       partner_id, national_id, name, birth_date, registry_id, license_id,
       postal_code, address_kind, street, number, complement,
       neighborhood, city, state, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
  } else {
    "UPDATE partners SET
       national_id = ?2, name = ?3, birth_date = ?4, registry_id = ?5,
       license_id = ?6, postal_code = ?7, address_kind = ?8, street = ?9,
       number = ?10, complement = ?11, neighborhood = ?12, city = ?13,
       state = ?14, created_at = ?15, updated_at = ?16
     WHERE partner_id = ?1"
  };
  conn
    .execute(
      sql,
      params![
        encode_uuid(partner.partner_id),
        partner.national_id.as_str(),
        partner.name,
        partner.birth_date.map(encode_date),
        partner.registry_id,
        partner.license_id,
        a.postal_code,
        a.kind,
        a.street,
        a.number,
        a.complement,
        a.neighborhood,
        a.city,
        a.state,
        encode_dt(partner.created_at),
        encode_dt(partner.updated_at),
      ],
    )
    .map_err(|e| {
      unique_conflict(e, || format!("partner {} already exists", partner.national_id))
    })?;

  tracing::debug!(
    partner_id = %partner.partner_id,
    national_id = %partner.national_id,
    created,
    "partner upserted"
  );

  append_partner_snapshot(conn, &PartnerSnapshot::capture(&partner, roster, source, now))?;
  Ok(partner)
}

// ─── Links ───────────────────────────────────────────────────────────────────

/// Upsert the (company, partner) link: new percentage, active again,
/// `updated_at` refreshed. The company total is not checked here.
pub fn upsert_link(
  conn: &Connection,
  company_id: Uuid,
  partner_id: Uuid,
  percentage: Percentage,
  now: DateTime<Utc>,
) -> Result<PartnerLink> {
  let link = match query::link(conn, company_id, partner_id)? {
    Some(existing) => {
      conn.execute(
        "UPDATE company_partners SET percentage = ?2, active = 1, updated_at = ?3
         WHERE link_id = ?1",
        params![encode_uuid(existing.link_id), percentage.hundredths(), encode_dt(now)],
      )?;
      PartnerLink { percentage, active: true, updated_at: now, ..existing }
    }
    None => {
      let link = PartnerLink {
        link_id: Uuid::new_v4(),
        company_id,
        partner_id,
        percentage,
        active: true,
        created_at: now,
        updated_at: now,
      };
      conn.execute(
        "INSERT INTO company_partners (
           link_id, company_id, partner_id, percentage, active, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
        params![
          encode_uuid(link.link_id),
          encode_uuid(company_id),
          encode_uuid(partner_id),
          percentage.hundredths(),
          encode_dt(now),
          encode_dt(now),
        ],
      )?;
      link
    }
  };
  Ok(link)
}

pub fn disengage(
  conn: &Connection,
  company_id: Uuid,
  partner_id: Uuid,
  now: DateTime<Utc>,
) -> Result<PartnerLink> {
  let existing = query::link(conn, company_id, partner_id)?
    .ok_or(Error::LinkNotFound { company_id, partner_id })?;
  conn.execute(
    "UPDATE company_partners SET active = 0, updated_at = ?2 WHERE link_id = ?1",
    params![encode_uuid(existing.link_id), encode_dt(now)],
  )?;
  Ok(PartnerLink { active: false, updated_at: now, ..existing })
}

// ─── History ─────────────────────────────────────────────────────────────────

pub fn append_company_snapshot(conn: &Connection, s: &CompanySnapshot) -> Result<()> {
  let a = &s.address;
  conn.execute(
    "INSERT INTO company_history (
       snapshot_id, company_id, code, legal_name, trade_name, tax_id,
       postal_code, address_kind, street, number, complement,
       neighborhood, city, state, capital_cents, is_branch, source, snapshot_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
    params![
      encode_uuid(s.snapshot_id),
      encode_uuid(s.company_id),
      s.code,
      s.legal_name,
      s.trade_name,
      s.tax_id.as_str(),
      a.postal_code,
      a.kind,
      a.street,
      a.number,
      a.complement,
      a.neighborhood,
      a.city,
      a.state,
      s.capital_cents,
      s.is_branch,
      s.source,
      encode_dt(s.snapshot_at),
    ],
  )?;
  Ok(())
}

pub fn append_partner_snapshot(conn: &Connection, s: &PartnerSnapshot) -> Result<()> {
  let a = &s.address;
  conn.execute(
    "INSERT INTO partner_history (
       snapshot_id, partner_id, national_id, name, birth_date, registry_id,
       license_id, postal_code, address_kind, street, number, complement,
       neighborhood, city, state, company_id, percentage, source, snapshot_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
    params![
      encode_uuid(s.snapshot_id),
      encode_uuid(s.partner_id),
      s.national_id.as_str(),
      s.name,
      s.birth_date.map(encode_date),
      s.registry_id,
      s.license_id,
      a.postal_code,
      a.kind,
      a.street,
      a.number,
      a.complement,
      a.neighborhood,
      a.city,
      a.state,
      s.company_id.map(encode_uuid),
      s.percentage.map(Percentage::hundredths),
      s.source,
      encode_dt(s.snapshot_at),
    ],
  )?;
  Ok(())
}

// ─── Batches ─────────────────────────────────────────────────────────────────

/// Write an already-reconciled roster in submission order: partner upsert
/// and snapshot, then the link, for each entry. The submission replaces the
/// roster, so active links to partners it leaves out are disengaged. An
/// empty roster writes nothing.
pub fn write_roster(
  conn: &Connection,
  company_id: Uuid,
  entries: Vec<PartnerEntry>,
  source: &str,
  now: DateTime<Utc>,
) -> Result<Vec<LinkedPartner>> {
  if entries.is_empty() {
    return Ok(Vec::new());
  }

  let written = entries
    .into_iter()
    .map(|entry| {
      let percentage = entry.percentage;
      let partner =
        upsert_partner(conn, entry.partner, Some((company_id, percentage)), source, now)?;
      let link = upsert_link(conn, company_id, partner.partner_id, percentage, now)?;
      Ok(LinkedPartner { partner, link })
    })
    .collect::<Result<Vec<_>>>()?;

  let submitted: HashSet<Uuid> = written.iter().map(|lp| lp.partner.partner_id).collect();
  for omitted in query::roster(conn, company_id, false)?
    .partners
    .into_iter()
    .filter(|lp| !submitted.contains(&lp.partner.partner_id))
  {
    disengage(conn, company_id, omitted.partner.partner_id, now)?;
    tracing::debug!(
      %company_id,
      partner_id = %omitted.partner.partner_id,
      "partner left out of roster disengaged"
    );
  }

  Ok(written)
}

/// Outcome of the company form: what was saved, plus any frozen identifier
/// the submission tried to change.
pub struct CompanyForm {
  pub saved:     SavedCompany,
  pub preserved: Vec<PreservedField>,
}

/// The company form: company upsert, roster, then one company snapshot.
pub fn save_company(
  conn: &Connection,
  submission: CompanySubmission,
  now: DateTime<Utc>,
) -> Result<CompanyForm> {
  let CompanySubmission { company, partners, source } = submission;

  let write = upsert_company(conn, company, now)?;
  let partners = write_roster(conn, write.company.company_id, partners, &source, now)?;
  append_company_snapshot(conn, &CompanySnapshot::capture(&write.company, &source, now))?;

  Ok(CompanyForm {
    saved:     SavedCompany { company: write.company, created: write.created, partners },
    preserved: write.preserved,
  })
}

/// Roster-only submission for an existing company.
pub fn submit_roster(
  conn: &Connection,
  company_id: Uuid,
  entries: Vec<PartnerEntry>,
  source: &str,
  now: DateTime<Utc>,
) -> Result<()> {
  let company =
    query::company(conn, company_id)?.ok_or(Error::CompanyNotFound(company_id))?;
  if entries.is_empty() {
    return Ok(());
  }
  write_roster(conn, company_id, entries, source, now)?;
  append_company_snapshot(conn, &CompanySnapshot::capture(&company, source, now))?;
  Ok(())
}

/// Bulk import: every row upserted with frozen identifiers preserved, one
/// snapshot per row.
pub fn import_companies(
  conn: &Connection,
  rows: Vec<NewCompany>,
  source: &str,
  now: DateTime<Utc>,
) -> Result<ImportReport> {
  let mut report = ImportReport::default();
  for row in rows {
    let write = upsert_company(conn, row, now)?;
    append_company_snapshot(conn, &CompanySnapshot::capture(&write.company, source, now))?;
    if write.created {
      report.created += 1;
    } else {
      report.updated += 1;
    }
    report.preserved.extend(write.preserved);
  }
  Ok(report)
}
