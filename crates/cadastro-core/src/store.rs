//! The `RegistryStore` trait and the batch types it accepts and returns.
//!
//! The trait is implemented by storage backends (e.g.
//! `cadastro-store-sqlite`). The API layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Classify,
  company::{Company, ImmutableField, NewCompany, RecordKind},
  history::{CompanySnapshot, PartnerSnapshot, SOURCE_COMPANY_FORM},
  ids::NationalId,
  partner::{LinkedPartner, NewPartner, Partner, PartnerEntry, PartnerLink},
  percentage::Percentage,
  reconcile::ParticipationTotal,
};

// ─── Batch inputs ────────────────────────────────────────────────────────────

/// A company form: the company's fields plus, optionally, its full partner
/// roster. A non-empty roster replaces the active one; an empty roster leaves
/// the company's partners untouched.
#[derive(Debug, Clone)]
pub struct CompanySubmission {
  pub company:  NewCompany,
  pub partners: Vec<PartnerEntry>,
  /// Tag written to every snapshot this submission produces.
  pub source:   String,
}

impl CompanySubmission {
  pub fn new(company: NewCompany) -> Self {
    Self {
      company,
      partners: Vec::new(),
      source: SOURCE_COMPANY_FORM.to_owned(),
    }
  }

  pub fn with_partners(mut self, partners: Vec<PartnerEntry>) -> Self {
    self.partners = partners;
    self
  }
}

/// A roster for an existing company, submitted without company fields.
#[derive(Debug, Clone)]
pub struct RosterSubmission {
  pub company_id: Uuid,
  pub partners:   Vec<PartnerEntry>,
  pub source:     String,
}

impl RosterSubmission {
  pub fn new(company_id: Uuid, partners: Vec<PartnerEntry>) -> Self {
    Self { company_id, partners, source: SOURCE_COMPANY_FORM.to_owned() }
  }
}

// ─── Batch outputs ───────────────────────────────────────────────────────────

/// Result of [`RegistryStore::save_company`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCompany {
  pub company:  Company,
  /// `true` if the submission created the company.
  pub created:  bool,
  /// The links written by this submission, in submission order.
  pub partners: Vec<LinkedPartner>,
}

/// A company's current roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
  pub company_id: Uuid,
  pub partners:   Vec<LinkedPartner>,
  /// Sum over the active links only.
  pub total:      ParticipationTotal,
}

/// A frozen identifier that a company write kept instead of overwriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreservedField {
  pub company_id: Uuid,
  pub field:      ImmutableField,
  pub kept:       String,
  pub submitted:  String,
}

/// Result of [`RegistryStore::import_companies`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
  pub created:   usize,
  pub updated:   usize,
  pub preserved: Vec<PreservedField>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a partner registry backend.
///
/// Batch writes (`save_company`, `submit_roster`, `import_companies`) are
/// atomic: either every company, partner, link, and snapshot row commits or
/// none does.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Batches ─────────────────────────────────────────────────────────────

  /// Upsert a company and, if the roster is non-empty, reconcile and write
  /// it, disengaging active partners it leaves out. One company snapshot and
  /// one snapshot per partner are appended.
  ///
  /// A changed code or tax ID on a company with linked records keeps its
  /// stored value; the rest still commits and the call returns an error of
  /// kind [`crate::ErrorKind::Conflict`] naming the field.
  fn save_company(
    &self,
    submission: CompanySubmission,
  ) -> impl Future<Output = Result<SavedCompany, Self::Error>> + Send + '_;

  /// Reconcile and write the full roster of an existing company; active
  /// partners it leaves out are disengaged. An empty roster writes nothing
  /// and returns the company's current roster.
  fn submit_roster(
    &self,
    submission: RosterSubmission,
  ) -> impl Future<Output = Result<Roster, Self::Error>> + Send + '_;

  /// Upsert many companies in one transaction. Frozen identifiers are kept
  /// rather than failing the import.
  fn import_companies(
    &self,
    rows: Vec<NewCompany>,
    source: String,
  ) -> impl Future<Output = Result<ImportReport, Self::Error>> + Send + '_;

  // ── Companies ───────────────────────────────────────────────────────────

  fn get_company(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  fn find_company_by_code(
    &self,
    code: String,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  fn list_companies(
    &self,
  ) -> impl Future<Output = Result<Vec<Company>, Self::Error>> + Send + '_;

  /// Register an operational record (employee, admission, ...) against a
  /// company. From then on its code and tax ID are frozen.
  fn attach_record(
    &self,
    company_id: Uuid,
    kind: RecordKind,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  /// Whether any operational record references the company.
  fn has_linked_records(
    &self,
    company_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Partners ────────────────────────────────────────────────────────────

  /// Match-or-create a partner by national ID, overwrite every field, and
  /// append a snapshot tagged `source`.
  fn upsert_partner(
    &self,
    partner: NewPartner,
    source: String,
  ) -> impl Future<Output = Result<Partner, Self::Error>> + Send + '_;

  fn get_partner(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Partner>, Self::Error>> + Send + '_;

  fn find_partner(
    &self,
    national_id: NationalId,
  ) -> impl Future<Output = Result<Option<Partner>, Self::Error>> + Send + '_;

  // ── Links ───────────────────────────────────────────────────────────────

  /// Upsert a single (company, partner) link.
  ///
  /// This does not check the company's total; callers that skip
  /// [`submit_roster`](Self::submit_roster) own the 100% invariant.
  fn upsert_link(
    &self,
    company_id: Uuid,
    partner_id: Uuid,
    percentage: Percentage,
  ) -> impl Future<Output = Result<PartnerLink, Self::Error>> + Send + '_;

  /// Mark a link inactive. The row is kept.
  fn disengage_partner(
    &self,
    company_id: Uuid,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<PartnerLink, Self::Error>> + Send + '_;

  fn company_roster(
    &self,
    company_id: Uuid,
    include_inactive: bool,
  ) -> impl Future<Output = Result<Roster, Self::Error>> + Send + '_;

  fn partner_links(
    &self,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PartnerLink>, Self::Error>> + Send + '_;

  // ── History ─────────────────────────────────────────────────────────────

  /// Snapshots for a company, oldest first.
  fn company_history(
    &self,
    company_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CompanySnapshot>, Self::Error>> + Send + '_;

  /// Snapshots for a partner, oldest first.
  fn partner_history(
    &self,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PartnerSnapshot>, Self::Error>> + Send + '_;
}
