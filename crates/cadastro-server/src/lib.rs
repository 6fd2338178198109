//! HTTP server wiring for the Cadastro partner registry.
//!
//! Mounts [`cadastro_api::api_router`] under `/api` with request tracing.
//! The binary in `main.rs` handles configuration and startup.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use cadastro_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CADASTRO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
pub fn app(store: SqliteStore) -> Router {
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", cadastro_api::api_router(Arc::new(store)))
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  async fn status_of(app: Router, uri: &str) -> StatusCode {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(req).await.unwrap().status()
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = app(store);

    assert_eq!(status_of(app.clone(), "/health").await, StatusCode::OK);
    assert_eq!(status_of(app.clone(), "/api/companies").await, StatusCode::OK);
    assert_eq!(status_of(app, "/companies").await, StatusCode::NOT_FOUND);
  }

  #[test]
  fn config_defaults_host_and_port() {
    let settings = config::Config::builder()
      .set_override("store_path", "/tmp/cadastro.db")
      .unwrap()
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/cadastro.db"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/cadastro.db")),
      PathBuf::from(home).join("cadastro.db")
    );
    assert_eq!(
      expand_tilde(Path::new("/var/lib/cadastro.db")),
      PathBuf::from("/var/lib/cadastro.db")
    );
  }
}
