//! Filtered order list.
//!
//! Filters arrive as query parameters and are mapped onto the typed
//! [`OrderListFilters`]; values are only ever bound as SQL parameters.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use juniper_row_core::{OrderStatus, parse_order_number};

use crate::db::OrderAdminRepository;
use crate::db::orders::{OrderListFilters, OrderSummary};
use crate::error::{AdminError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

const DEFAULT_PER_PAGE: i64 = 25;
const MAX_PER_PAGE: i64 = 100;

/// Query parameters for the order list.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    /// Status filter (`pending`, `processing`, ...).
    pub status: Option<String>,
    /// Search over order number, shipping name/email, account email.
    pub q: Option<String>,
    /// Inclusive start date (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
    /// Zero-based page.
    pub page: Option<i64>,
    /// Page size (capped).
    pub per_page: Option<i64>,
}

/// Order list response.
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderSummary>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl OrderListQuery {
    fn into_filters(self) -> Result<OrderListFilters> {
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|_| AdminError::BadRequest(format!("Invalid status: {raw}")))?,
            ),
            None => None,
        };

        let search = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        // A pasted order number ("JR-000042") searches by exact id.
        let id_search = search.and_then(parse_order_number);

        let page = self.page.unwrap_or(0).max(0);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);

        Ok(OrderListFilters {
            status,
            search: search.map(str::to_owned),
            id_search,
            created_from: self
                .from
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            created_before: self
                .to
                .and_then(|d| d.succ_opt())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            page,
            per_page,
        })
    }
}

/// Filtered, paginated order list.
#[instrument(skip(_admin, state, query))]
pub async fn list_orders(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderListResponse>> {
    let filters = query.into_filters()?;
    let (orders, total) = OrderAdminRepository::new(state.pool()).list(&filters).await?;

    Ok(Json(OrderListResponse {
        orders,
        total,
        page: filters.page,
        per_page: filters.per_page,
    }))
}
