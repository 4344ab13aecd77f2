//! Application state shared across admin handlers.

use std::sync::Arc;

use sqlx::PgPool;

use juniper_row_core::NotificationDispatcher;

use crate::config::AdminConfig;
use crate::services::notifications::LogDispatcher;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                dispatcher: Arc::new(LogDispatcher),
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a handle to the notification dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<dyn NotificationDispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }
}
