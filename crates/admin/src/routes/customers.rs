//! Customer list and detail for the back office.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use juniper_row_core::UserId;

use crate::db::customers::CustomerSummary;
use crate::db::orders::OrderSummary;
use crate::db::{CustomerRepository, OrderAdminRepository};
use crate::error::{AdminError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

const DEFAULT_PER_PAGE: i64 = 25;
const MAX_PER_PAGE: i64 = 100;

/// Query parameters for the customer list.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    /// Search over name or email.
    pub q: Option<String>,
    /// Zero-based page.
    pub page: Option<i64>,
    /// Page size (capped).
    pub per_page: Option<i64>,
}

/// Customer detail with their order history.
#[derive(Debug, Serialize)]
pub struct CustomerDetailResponse {
    #[serde(flatten)]
    pub customer: CustomerSummary,
    pub orders: Vec<OrderSummary>,
}

/// Paginated customer list with order aggregates.
#[instrument(skip(_admin, state, query))]
pub async fn list_customers(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> Result<Json<Vec<CustomerSummary>>> {
    let page = query.page.unwrap_or(0).max(0);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let customers = CustomerRepository::new(state.pool())
        .list(search, page, per_page)
        .await?;

    Ok(Json(customers))
}

/// Customer detail with their orders, newest first.
#[instrument(skip(_admin, state), fields(customer_id = id))]
pub async fn customer_detail(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CustomerDetailResponse>> {
    let user_id = UserId::new(id);

    let customer = CustomerRepository::new(state.pool())
        .get(user_id)
        .await?
        .ok_or_else(|| AdminError::NotFound("Customer".to_owned()))?;
    let orders = OrderAdminRepository::new(state.pool())
        .list_for_customer(user_id)
        .await?;

    Ok(Json(CustomerDetailResponse { customer, orders }))
}
