//! Error type for `cadastro-store-sqlite`.

use cadastro_core::{Classify, ErrorKind, company::ImmutableField, store::SavedCompany};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Validation failures from `cadastro-core`, shown verbatim.
  #[error(transparent)]
  Core(#[from] cadastro_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("company not found: {0}")]
  CompanyNotFound(Uuid),

  #[error("partner not found: {0}")]
  PartnerNotFound(Uuid),

  #[error("partner {partner_id} is not linked to company {company_id}")]
  LinkNotFound { company_id: Uuid, partner_id: Uuid },

  /// The company form tried to change a frozen identifier. The stored value
  /// was kept and the rest of the submission committed as `saved`.
  #[error("{field} cannot be changed: the company has linked records")]
  ImmutableField {
    company_id: Uuid,
    field:      ImmutableField,
    saved:      Box<SavedCompany>,
  },

  /// A unique key (company code, tax ID, national ID) is already taken.
  #[error("{0}")]
  Conflict(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::CompanyNotFound(_)
      | Error::PartnerNotFound(_)
      | Error::LinkNotFound { .. } => ErrorKind::NotFound,
      Error::ImmutableField { .. } | Error::Conflict(_) => ErrorKind::Conflict,
      Error::Database(_)
      | Error::Sqlite(_)
      | Error::Uuid(_)
      | Error::DateParse(_) => ErrorKind::Persistence,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
