//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use cadastro_core::{company::RecordKind, store::RegistryStore};
use cadastro_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

async fn setup() -> (Arc<SqliteStore>, Router) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let router = api_router(store.clone());
  (store, router)
}

async fn send(
  router: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = router
    .clone()
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
    .await
    .unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

fn company_body(code: &str, partners: Value) -> Value {
  json!({
    "code": code,
    "legal_name": "Padaria Central Ltda",
    "tax_id": "12.345.678/0001-90",
    "address": { "street": "Rua das Flores", "number": "10", "city": "Curitiba" },
    "capital_cents": 5_000_000,
    "partners": partners,
  })
}

fn three_way() -> Value {
  json!([
    { "national_id": "123.456.789-01", "name": "Ana Souza",  "percentage": 40 },
    { "national_id": "234.567.890-12", "name": "Bruno Lima", "percentage": "35,00" },
    { "national_id": "345.678.901-23", "name": "Carla Dias", "percentage": 25.0 },
  ])
}

// ── Companies ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_company_with_roster_returns_201() {
  let (_, router) = setup().await;
  let (status, body) =
    send(&router, "POST", "/companies", Some(company_body("10", three_way()))).await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["created"], true);
  assert_eq!(body["company"]["tax_id"], "12345678000190");
  assert_eq!(body["partners"].as_array().unwrap().len(), 3);
  assert_eq!(body["partners"][0]["partner"]["national_id"], "12345678901");

  let id = body["company"]["company_id"].as_str().unwrap();
  let (status, roster) = send(&router, "GET", &format!("/companies/{id}/partners"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(roster["total"], 100.0);
}

#[tokio::test]
async fn resubmitting_company_returns_200() {
  let (_, router) = setup().await;
  send(&router, "POST", "/companies", Some(company_body("10", json!([])))).await;
  let (status, body) =
    send(&router, "POST", "/companies", Some(company_body("10", json!([])))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["created"], false);
}

#[tokio::test]
async fn unbalanced_roster_is_422_with_fixed_message() {
  let (store, router) = setup().await;
  let partners = json!([
    { "national_id": "12345678901", "name": "Ana Souza",  "percentage": 40 },
    { "national_id": "23456789012", "name": "Bruno Lima", "percentage": 35 },
    { "national_id": "34567890123", "name": "Carla Dias", "percentage": 24.99 },
  ]);
  let (status, body) =
    send(&router, "POST", "/companies", Some(company_body("10", partners))).await;

  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(
    body["error"],
    "the total of partner participations must be exactly 100%"
  );
  assert!(store.list_companies().await.unwrap().is_empty());
}

#[tokio::test]
async fn frozen_code_change_is_409() {
  let (store, router) = setup().await;
  let (_, created) =
    send(&router, "POST", "/companies", Some(company_body("10", json!([])))).await;
  let id: Uuid = created["company"]["company_id"].as_str().unwrap().parse().unwrap();
  store.attach_record(id, RecordKind::Employee).await.unwrap();

  // The code stays, the street change in the same submission is kept.
  let mut edit = company_body("11", json!([]));
  edit["company_id"] = json!(id);
  edit["address"]["street"] = json!("Rua Nova");
  let (status, body) = send(&router, "POST", "/companies", Some(edit)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("company code"));

  let (status, body) = send(&router, "GET", &format!("/companies/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["code"], "10");
  assert_eq!(body["address"]["street"], "Rua Nova");

  // Street-only change goes through cleanly.
  let mut edit = company_body("10", json!([]));
  edit["company_id"] = json!(id);
  edit["address"]["street"] = json!("Avenida Brasil");
  let (status, body) = send(&router, "POST", "/companies", Some(edit)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["company"]["address"]["street"], "Avenida Brasil");
}

#[tokio::test]
async fn attach_record_route_locks_company() {
  let (store, router) = setup().await;
  let (_, created) =
    send(&router, "POST", "/companies", Some(company_body("10", json!([])))).await;
  let id = created["company"]["company_id"].as_str().unwrap();

  let (status, body) = send(
    &router,
    "POST",
    &format!("/companies/{id}/records"),
    Some(json!({ "kind": "admission" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(body["record_id"].is_string());
  assert!(store.has_linked_records(id.parse().unwrap()).await.unwrap());
}

#[tokio::test]
async fn unknown_company_is_404() {
  let (_, router) = setup().await;
  let id = Uuid::new_v4();
  for uri in [
    format!("/companies/{id}"),
    format!("/companies/{id}/partners"),
    format!("/companies/{id}/history"),
  ] {
    let (status, body) = send(&router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    assert!(body["error"].is_string());
  }
}

#[tokio::test]
async fn list_filters_by_code() {
  let (_, router) = setup().await;
  send(&router, "POST", "/companies", Some(company_body("10", json!([])))).await;

  let (_, all) = send(&router, "GET", "/companies", None).await;
  assert_eq!(all.as_array().unwrap().len(), 1);
  let (_, hit) = send(&router, "GET", "/companies?code=10", None).await;
  assert_eq!(hit.as_array().unwrap().len(), 1);
  let (_, miss) = send(&router, "GET", "/companies?code=99", None).await;
  assert!(miss.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn import_reports_preserved_codes() {
  let (store, router) = setup().await;
  let (_, created) =
    send(&router, "POST", "/companies", Some(company_body("10", json!([])))).await;
  let id: Uuid = created["company"]["company_id"].as_str().unwrap().parse().unwrap();
  store.attach_record(id, RecordKind::Transfer).await.unwrap();

  let body = json!({
    "companies": [
      { "code": "77", "legal_name": "Padaria Central SA", "tax_id": "12345678000190" },
      { "code": "20", "legal_name": "Mercado Sul Ltda",   "tax_id": "98765432000110" },
    ],
  });
  let (status, report) = send(&router, "POST", "/companies/import", Some(body)).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["created"], 1);
  assert_eq!(report["updated"], 1);
  assert_eq!(report["preserved"][0]["field"], "code");
  assert_eq!(report["preserved"][0]["kept"], "10");

  let (_, history) = send(&router, "GET", &format!("/companies/{id}/history"), None).await;
  assert_eq!(history[1]["source"], "company_import");
}

// ── Rosters ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_roster_then_disengage() {
  let (_, router) = setup().await;
  let (_, created) =
    send(&router, "POST", "/companies", Some(company_body("10", json!([])))).await;
  let id = created["company"]["company_id"].as_str().unwrap();
  let uri = format!("/companies/{id}/partners");

  let (status, roster) =
    send(&router, "PUT", &uri, Some(json!({ "partners": three_way() }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(roster["partners"].as_array().unwrap().len(), 3);

  let carla = roster["partners"][2]["partner"]["partner_id"].as_str().unwrap();
  let (status, link) = send(
    &router,
    "POST",
    &format!("/companies/{id}/partners/{carla}/disengage"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(link["active"], false);

  let (_, active) = send(&router, "GET", &uri, None).await;
  assert_eq!(active["partners"].as_array().unwrap().len(), 2);
  assert_eq!(active["total"], 75.0);

  let (_, all) = send(&router, "GET", &format!("{uri}?include_inactive=true"), None).await;
  assert_eq!(all["partners"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn duplicate_partner_in_roster_is_422() {
  let (_, router) = setup().await;
  let partners = json!([
    { "national_id": "12345678901", "name": "Ana Souza", "percentage": 50 },
    { "national_id": "123.456.789-01", "name": "Ana S.", "percentage": 50 },
  ]);
  let (status, body) =
    send(&router, "POST", "/companies", Some(company_body("10", partners))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("12345678901"));
}

#[tokio::test]
async fn disengage_unknown_link_is_404() {
  let (_, router) = setup().await;
  let (_, created) =
    send(&router, "POST", "/companies", Some(company_body("10", json!([])))).await;
  let id = created["company"]["company_id"].as_str().unwrap();
  let (status, _) = send(
    &router,
    "POST",
    &format!("/companies/{id}/partners/{}/disengage", Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Partners ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn partner_lookup_history_and_links() {
  let (_, router) = setup().await;
  send(&router, "POST", "/companies", Some(company_body("10", three_way()))).await;

  let (status, ana) =
    send(&router, "GET", "/partners?national_id=123.456.789-01", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ana["name"], "Ana Souza");
  let ana_id = ana["partner_id"].as_str().unwrap();

  let (_, links) = send(&router, "GET", &format!("/partners/{ana_id}/companies"), None).await;
  assert_eq!(links.as_array().unwrap().len(), 1);
  assert_eq!(links[0]["percentage"], 40.0);

  let (status, updated) = send(
    &router,
    "POST",
    "/partners",
    Some(json!({ "national_id": "12345678901", "name": "Ana Souza Lima" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["partner_id"], ana_id);

  let (_, history) = send(&router, "GET", &format!("/partners/{ana_id}/history"), None).await;
  let history = history.as_array().unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0]["source"], "company_form");
  assert_eq!(history[1]["source"], "partner_form");
  assert_eq!(history[1]["name"], "Ana Souza Lima");
}

#[tokio::test]
async fn malformed_national_id_is_422() {
  let (_, router) = setup().await;
  let (status, body) = send(&router, "GET", "/partners?national_id=123", None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("national ID"));
}

#[tokio::test]
async fn unknown_partner_is_404() {
  let (_, router) = setup().await;
  let (status, _) = send(&router, "GET", "/partners?national_id=99999999999", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&router, "GET", &format!("/partners/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) =
    send(&router, "GET", &format!("/partners/{}/companies", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
