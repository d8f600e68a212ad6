use sqlx::SqlitePool;

use crate::config::Config;

/// Shared application state injected into all route handlers via Axum
/// extractors. The pool travels with the state; there is no ambient
/// database singleton.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}
