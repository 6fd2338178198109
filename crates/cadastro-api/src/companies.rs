//! Handlers for `/companies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/companies` | Optional `?code=` for an exact code lookup |
//! | `POST` | `/companies` | Body: [`CompanyBody`]; 201 if created, else 200 |
//! | `POST` | `/companies/import` | Body: [`ImportBody`]; returns the import report |
//! | `GET`  | `/companies/:id` | 404 if not found |
//! | `GET`  | `/companies/:id/partners` | Optional `?include_inactive=true` |
//! | `PUT`  | `/companies/:id/partners` | Body: [`RosterBody`] |
//! | `POST` | `/companies/:id/partners/:partner_id/disengage` | Clears the link's `active` flag |
//! | `POST` | `/companies/:id/records` | Body: `{"kind":"employee"}` |
//! | `GET`  | `/companies/:id/history` | Snapshots, oldest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cadastro_core::{
  company::{Company, NewCompany, RecordKind},
  history::{CompanySnapshot, SOURCE_COMPANY_FORM, SOURCE_COMPANY_IMPORT},
  partner::{PartnerEntry, PartnerLink},
  store::{
    CompanySubmission, ImportReport, RegistryStore, Roster, RosterSubmission,
  },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

async fn require_company<S: RegistryStore>(
  store: &S,
  id: Uuid,
) -> Result<Company, ApiError> {
  store
    .get_company(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("company {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub code: Option<String>,
}

/// `GET /companies[?code=<code>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Company>>, ApiError>
where
  S: RegistryStore,
{
  let companies = match params.code {
    Some(code) => store
      .find_company_by_code(code)
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .collect(),
    None => store.list_companies().await.map_err(ApiError::store)?,
  };
  Ok(Json(companies))
}

// ─── Save ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /companies`: the company fields, inline, plus
/// an optional roster.
#[derive(Debug, Deserialize)]
pub struct CompanyBody {
  #[serde(flatten)]
  pub company:  NewCompany,
  #[serde(default)]
  pub partners: Vec<PartnerEntry>,
  pub source:   Option<String>,
}

impl From<CompanyBody> for CompanySubmission {
  fn from(b: CompanyBody) -> Self {
    CompanySubmission {
      company:  b.company,
      partners: b.partners,
      source:   b.source.unwrap_or_else(|| SOURCE_COMPANY_FORM.to_owned()),
    }
  }
}

/// `POST /companies` — returns 201 when the company was created.
pub async fn save<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CompanyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let saved = store
    .save_company(CompanySubmission::from(body))
    .await
    .map_err(ApiError::store)?;
  let status = if saved.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(saved)))
}

// ─── Import ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportBody {
  pub companies: Vec<NewCompany>,
  pub source:    Option<String>,
}

/// `POST /companies/import`
pub async fn import<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<ImportBody>,
) -> Result<Json<ImportReport>, ApiError>
where
  S: RegistryStore,
{
  let source = body
    .source
    .unwrap_or_else(|| SOURCE_COMPANY_IMPORT.to_owned());
  let report = store
    .import_companies(body.companies, source)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(report))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /companies/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError>
where
  S: RegistryStore,
{
  Ok(Json(require_company(store.as_ref(), id).await?))
}

// ─── Roster ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RosterParams {
  #[serde(default)]
  pub include_inactive: bool,
}

/// `GET /companies/:id/partners[?include_inactive=true]`
pub async fn roster<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<RosterParams>,
) -> Result<Json<Roster>, ApiError>
where
  S: RegistryStore,
{
  let roster = store
    .company_roster(id, params.include_inactive)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(roster))
}

#[derive(Debug, Deserialize)]
pub struct RosterBody {
  pub partners: Vec<PartnerEntry>,
  pub source:   Option<String>,
}

/// `PUT /companies/:id/partners` — returns the active roster after the write.
pub async fn submit_roster<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RosterBody>,
) -> Result<Json<Roster>, ApiError>
where
  S: RegistryStore,
{
  let mut submission = RosterSubmission::new(id, body.partners);
  if let Some(source) = body.source {
    submission.source = source;
  }
  let roster = store
    .submit_roster(submission)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(roster))
}

/// `POST /companies/:id/partners/:partner_id/disengage`
pub async fn disengage<S>(
  State(store): State<Arc<S>>,
  Path((id, partner_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PartnerLink>, ApiError>
where
  S: RegistryStore,
{
  let link = store
    .disengage_partner(id, partner_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(link))
}

// ─── Operational records ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub kind: RecordKind,
}

#[derive(Debug, Serialize)]
pub struct RecordCreated {
  pub record_id: Uuid,
}

/// `POST /companies/:id/records` — body: `{"kind":"employee"}`
pub async fn attach_record<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RecordBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let record_id = store
    .attach_record(id, body.kind)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(RecordCreated { record_id })))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /companies/:id/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<CompanySnapshot>>, ApiError>
where
  S: RegistryStore,
{
  require_company(store.as_ref(), id).await?;
  let snapshots = store
    .company_history(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(snapshots))
}
