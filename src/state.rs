use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::Authenticator;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(db: SqlitePool, auth: Authenticator) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
        }
    }
}
