//! JSON REST API for the Cadastro partner registry.
//!
//! Exposes an axum [`Router`] backed by any
//! [`cadastro_core::store::RegistryStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cadastro_api::api_router(store.clone()))
//! ```

pub mod companies;
pub mod error;
pub mod partners;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use cadastro_core::store::RegistryStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RegistryStore + 'static,
{
  Router::new()
    // Companies
    .route("/companies", get(companies::list::<S>).post(companies::save::<S>))
    .route("/companies/import", post(companies::import::<S>))
    .route("/companies/{id}", get(companies::get_one::<S>))
    .route(
      "/companies/{id}/partners",
      get(companies::roster::<S>).put(companies::submit_roster::<S>),
    )
    .route(
      "/companies/{id}/partners/{partner_id}/disengage",
      post(companies::disengage::<S>),
    )
    .route("/companies/{id}/records", post(companies::attach_record::<S>))
    .route("/companies/{id}/history", get(companies::history::<S>))
    // Partners
    .route("/partners", get(partners::lookup::<S>).post(partners::upsert::<S>))
    .route("/partners/{id}", get(partners::get_one::<S>))
    .route("/partners/{id}/companies", get(partners::companies::<S>))
    .route("/partners/{id}/history", get(partners::history::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
