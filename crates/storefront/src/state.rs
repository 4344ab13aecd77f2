//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use juniper_row_core::{NotificationDispatcher, PricingStrategy};

use crate::config::StorefrontConfig;
use crate::services::notifications::LogDispatcher;
use crate::services::pricing::StandardPricing;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the database pool,
/// configuration, and the pluggable pricing/notification collaborators.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    pricing: StandardPricing,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let pricing = StandardPricing::new(&config.pricing);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                pricing,
                dispatcher: Arc::new(LogDispatcher),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the configured pricing strategy.
    #[must_use]
    pub fn pricing(&self) -> &dyn PricingStrategy {
        &self.inner.pricing
    }

    /// Get a handle to the notification dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<dyn NotificationDispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }
}
