//! [`SqliteStore`] — the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use cadastro_core::{
  NationalId, Percentage,
  company::{Company, NewCompany, RecordKind},
  history::{CompanySnapshot, PartnerSnapshot},
  partner::{NewPartner, Partner, PartnerLink},
  reconcile::validate_roster,
  store::{
    CompanySubmission, ImportReport, RegistryStore, Roster, RosterSubmission,
    SavedCompany,
  },
};
use chrono::Utc;
use rusqlite::{Connection, Transaction};
use uuid::Uuid;

use crate::{Error, Result, query, schema::SCHEMA, write};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A partner registry backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` against the connection outside any explicit transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside one transaction. It commits only if `f` returns `Ok`;
  /// on `Err` the transaction is dropped, which rolls it back.
  async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let outcome = f(&tx);
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = Error;

  // ── Batches ───────────────────────────────────────────────────────────────

  async fn save_company(&self, submission: CompanySubmission) -> Result<SavedCompany> {
    if let Err(e) = validate_roster(&submission.partners) {
      tracing::warn!(code = %submission.company.code, error = %e, "company form rejected");
      return Err(e.into());
    }

    let source = submission.source.clone();
    let code = submission.company.code.clone();
    let now = Utc::now();

    let write::CompanyForm { saved, preserved } = self
      .transact(move |tx| write::save_company(tx, submission, now))
      .await
      .inspect_err(|e| tracing::warn!(%code, error = %e, "company form rolled back"))?;

    tracing::info!(
      company_id = %saved.company.company_id,
      created = saved.created,
      partners = saved.partners.len(),
      %source,
      "company form committed"
    );

    // Committed, but the caller still learns the identifier was not changed.
    match preserved.first() {
      Some(p) => Err(Error::ImmutableField {
        company_id: p.company_id,
        field:      p.field,
        saved:      Box::new(saved),
      }),
      None => Ok(saved),
    }
  }

  async fn submit_roster(&self, submission: RosterSubmission) -> Result<Roster> {
    let RosterSubmission { company_id, partners, source } = submission;

    if let Err(e) = validate_roster(&partners) {
      tracing::warn!(%company_id, error = %e, "roster rejected");
      return Err(e.into());
    }

    let count = partners.len();
    let now = Utc::now();
    let roster = self
      .transact(move |tx| {
        write::submit_roster(tx, company_id, partners, &source, now)?;
        query::roster(tx, company_id, false)
      })
      .await
      .inspect_err(|e| tracing::warn!(%company_id, error = %e, "roster rolled back"))?;

    if count > 0 {
      tracing::info!(%company_id, partners = count, total = %roster.total, "roster committed");
    }
    Ok(roster)
  }

  async fn import_companies(
    &self,
    rows: Vec<NewCompany>,
    source: String,
  ) -> Result<ImportReport> {
    let rows_len = rows.len();
    let now = Utc::now();
    let report = self
      .transact(move |tx| write::import_companies(tx, rows, &source, now))
      .await
      .inspect_err(|e| tracing::warn!(rows = rows_len, error = %e, "company import rolled back"))?;

    tracing::info!(
      created = report.created,
      updated = report.updated,
      preserved = report.preserved.len(),
      "company import committed"
    );
    Ok(report)
  }

  // ── Companies ─────────────────────────────────────────────────────────────

  async fn get_company(&self, id: Uuid) -> Result<Option<Company>> {
    self.read(move |conn| query::company(conn, id)).await
  }

  async fn find_company_by_code(&self, code: String) -> Result<Option<Company>> {
    self
      .read(move |conn| query::company_by_code(conn, code.trim()))
      .await
  }

  async fn list_companies(&self) -> Result<Vec<Company>> {
    self.read(query::companies).await
  }

  async fn attach_record(&self, company_id: Uuid, kind: RecordKind) -> Result<Uuid> {
    let now = Utc::now();
    let record_id = self
      .transact(move |tx| write::attach_record(tx, company_id, kind, now))
      .await?;
    tracing::debug!(%company_id, ?kind, %record_id, "operational record attached");
    Ok(record_id)
  }

  async fn has_linked_records(&self, company_id: Uuid) -> Result<bool> {
    self
      .read(move |conn| query::has_linked_records(conn, company_id))
      .await
  }

  // ── Partners ──────────────────────────────────────────────────────────────

  async fn upsert_partner(&self, partner: NewPartner, source: String) -> Result<Partner> {
    let now = Utc::now();
    self
      .transact(move |tx| write::upsert_partner(tx, partner, None, &source, now))
      .await
  }

  async fn get_partner(&self, id: Uuid) -> Result<Option<Partner>> {
    self.read(move |conn| query::partner(conn, id)).await
  }

  async fn find_partner(&self, national_id: NationalId) -> Result<Option<Partner>> {
    self
      .read(move |conn| query::partner_by_national_id(conn, &national_id))
      .await
  }

  // ── Links ─────────────────────────────────────────────────────────────────

  async fn upsert_link(
    &self,
    company_id: Uuid,
    partner_id: Uuid,
    percentage: Percentage,
  ) -> Result<PartnerLink> {
    let now = Utc::now();
    self
      .transact(move |tx| {
        if query::company(tx, company_id)?.is_none() {
          return Err(Error::CompanyNotFound(company_id));
        }
        if query::partner(tx, partner_id)?.is_none() {
          return Err(Error::PartnerNotFound(partner_id));
        }
        write::upsert_link(tx, company_id, partner_id, percentage, now)
      })
      .await
  }

  async fn disengage_partner(
    &self,
    company_id: Uuid,
    partner_id: Uuid,
  ) -> Result<PartnerLink> {
    let now = Utc::now();
    let link = self
      .transact(move |tx| write::disengage(tx, company_id, partner_id, now))
      .await?;
    tracing::info!(%company_id, %partner_id, "partner disengaged");
    Ok(link)
  }

  async fn company_roster(&self, company_id: Uuid, include_inactive: bool) -> Result<Roster> {
    self
      .read(move |conn| {
        if query::company(conn, company_id)?.is_none() {
          return Err(Error::CompanyNotFound(company_id));
        }
        query::roster(conn, company_id, include_inactive)
      })
      .await
  }

  async fn partner_links(&self, partner_id: Uuid) -> Result<Vec<PartnerLink>> {
    self
      .read(move |conn| {
        if query::partner(conn, partner_id)?.is_none() {
          return Err(Error::PartnerNotFound(partner_id));
        }
        query::links_for_partner(conn, partner_id)
      })
      .await
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn company_history(&self, company_id: Uuid) -> Result<Vec<CompanySnapshot>> {
    self
      .read(move |conn| query::company_history(conn, company_id))
      .await
  }

  async fn partner_history(&self, partner_id: Uuid) -> Result<Vec<PartnerSnapshot>> {
    self
      .read(move |conn| query::partner_history(conn, partner_id))
      .await
  }
}
