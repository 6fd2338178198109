//! Core types and trait definitions for the Cadastro partner registry.
//!
//! Companies, partners (sócios), the links that carry each partner's
//! participation percentage, and the append-only history of every accepted
//! write. The reconciliation rule that keeps a company's roster at exactly
//! 100% lives here too, free of any storage dependency.

pub mod company;
pub mod error;
pub mod history;
pub mod ids;
pub mod partner;
pub mod percentage;
pub mod reconcile;
pub mod store;

pub use error::{Classify, Error, ErrorKind, Result};
pub use ids::{NationalId, TaxId};
pub use percentage::Percentage;
pub use reconcile::ReconciliationError;
