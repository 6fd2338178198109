//! Error types for `cadastro-core`.

use thiserror::Error;

use crate::{ids::NationalId, reconcile::ReconciliationError};

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Reconciliation(#[from] ReconciliationError),

  #[error("invalid national ID {0:?}: expected 11 digits")]
  InvalidNationalId(String),

  #[error("invalid tax ID {0:?}: expected 11 or 14 digits")]
  InvalidTaxId(String),

  #[error("invalid participation percentage {0:?}: expected 0 to 100 with at most two decimals")]
  InvalidPercentage(String),

  #[error("partner {0} appears more than once in the submitted roster")]
  DuplicatePartner(NationalId),

  #[error("share capital cannot be negative: {0}")]
  NegativeCapital(i64),

  #[error("{0} is required")]
  MissingField(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse category of a registry failure, used by callers to pick a
/// response without knowing the backend's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The submission itself is wrong; nothing was written.
  Validation,
  /// The submission clashes with stored state (frozen or duplicate keys).
  Conflict,
  /// A referenced company, partner, or link does not exist.
  NotFound,
  /// The backend failed.
  Persistence,
}

/// Implemented by every [`RegistryStore`](crate::store::RegistryStore) error.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  /// Everything `cadastro-core` rejects is a problem with the input.
  fn kind(&self) -> ErrorKind { ErrorKind::Validation }
}
