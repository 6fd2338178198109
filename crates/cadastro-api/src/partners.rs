//! Handlers for `/partners` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/partners` | `?national_id=` required; punctuation is ignored |
//! | `POST` | `/partners` | Body: [`PartnerBody`]; full-overwrite upsert |
//! | `GET`  | `/partners/:id` | 404 if not found |
//! | `GET`  | `/partners/:id/companies` | Every link, active or not |
//! | `GET`  | `/partners/:id/history` | Snapshots, oldest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use cadastro_core::{
  NationalId,
  history::{PartnerSnapshot, SOURCE_PARTNER_FORM},
  partner::{NewPartner, Partner, PartnerLink},
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

async fn require_partner<S: RegistryStore>(
  store: &S,
  id: Uuid,
) -> Result<Partner, ApiError> {
  store
    .get_partner(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("partner {id} not found")))
}

// ─── Lookup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupParams {
  pub national_id: String,
}

/// `GET /partners?national_id=<digits>`
pub async fn lookup<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<LookupParams>,
) -> Result<Json<Partner>, ApiError>
where
  S: RegistryStore,
{
  let national_id = NationalId::parse(&params.national_id).map_err(ApiError::store)?;
  let partner = store
    .find_partner(national_id.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("partner {national_id} not found")))?;
  Ok(Json(partner))
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PartnerBody {
  #[serde(flatten)]
  pub partner: NewPartner,
  pub source:  Option<String>,
}

/// `POST /partners` — match-or-create by national ID.
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<PartnerBody>,
) -> Result<Json<Partner>, ApiError>
where
  S: RegistryStore,
{
  let source = body
    .source
    .unwrap_or_else(|| SOURCE_PARTNER_FORM.to_owned());
  let partner = store
    .upsert_partner(body.partner, source)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(partner))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /partners/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Partner>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(require_partner(store.as_ref(), id).await?))
}

/// `GET /partners/:id/companies`
pub async fn companies<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PartnerLink>>, ApiError>
where
  S: RegistryStore,
{
  let links = store.partner_links(id).await.map_err(ApiError::store)?;
  Ok(Json(links))
}

/// `GET /partners/:id/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PartnerSnapshot>>, ApiError>
where
  S: RegistryStore,
{
  require_partner(store.as_ref(), id).await?;
  let snapshots = store
    .partner_history(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(snapshots))
}
