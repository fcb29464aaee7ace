//! ChainLeaf server: configuration and application assembly.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use axum::Router;
use chainleaf_api::{AppState, api_router};
use chainleaf_store_sqlite::{SqliteStore, seed};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CHAINLEAF_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// Public origin embedded in verification URLs.
  pub origin:     String,
  pub store_path: PathBuf,
  /// Load the demo users, farms and batches into an empty store.
  pub seed:       bool,
}

impl ServerConfig {
  /// Read `path` (optional) then the environment over built-in defaults.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("origin", "http://localhost:8080")?
      .set_default("store_path", "~/.local/share/chainleaf/chainleaf.db")?
      .set_default("seed", true)?
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("CHAINLEAF"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Open the store named by `cfg`, seeding it if configured.
pub async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cfg.seed {
    let data = seed::demo_data().context("failed to build demo data")?;
    store.seed_if_empty(data).await.context("failed to seed store")?;
  }
  Ok(store)
}

/// The full HTTP application: the JSON API under `/api`, with request tracing.
pub fn app(store: SqliteStore, cfg: &ServerConfig) -> Router {
  let state = AppState::new(store, cfg.origin.as_str());
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
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

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  fn test_config() -> ServerConfig {
    ServerConfig {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      origin:     "https://chainleaf.example".to_string(),
      store_path: PathBuf::from(":memory:"),
      seed:       true,
    }
  }

  #[test]
  fn defaults_apply_without_a_file() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/chainleaf.toml")).unwrap();
    assert!(cfg.seed);
    assert!(!cfg.origin.is_empty());
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let plain = Path::new("/var/lib/chainleaf.db");
    assert_eq!(expand_tilde(plain), plain);
    let odd = Path::new("data/~/x.db");
    assert_eq!(expand_tilde(odd), odd);
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let cfg = test_config();
    let store = open_store(&cfg).await.unwrap();
    let req = Request::builder()
      .uri("/api/batches/BATCH-001/qr")
      .body(Body::empty())
      .unwrap();
    let resp = app(store, &cfg).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = std::str::from_utf8(&bytes).unwrap();
    assert!(body.contains("https://chainleaf.example/verify/BATCH-001"), "{body}");
  }
}
