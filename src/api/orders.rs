//! Order CRUD handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::pagination::{Page, PageParams, SortOrder};
use crate::http::server::AppState;
use crate::store::orders::{self, NewOrder, Order, OrderFilter, OrderSortKey, OrderStatus};
use crate::store::users;

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn parse_filter(query: &ListOrdersQuery) -> Result<OrderFilter, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(|raw| {
            OrderStatus::from_param(raw).ok_or_else(|| {
                ApiError::Validation(format!("status is not a known order status: {raw:?}"))
            })
        })
        .transpose()?;
    let user_id = query
        .user_id
        .as_deref()
        .map(|raw| {
            raw.parse::<i64>().map_err(|_| {
                ApiError::Validation(format!("user_id must be an integer, got {raw:?}"))
            })
        })
        .transpose()?;

    Ok(OrderFilter {
        search: query.search.clone().filter(|s| !s.is_empty()),
        status,
        user_id,
        sort_by: OrderSortKey::from_param(query.sort_by.as_deref()),
        sort_order: SortOrder::parse(query.sort_order.as_deref())?,
    })
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Page<Order>>, ApiError> {
    let params = PageParams::from_query(
        query.page.as_deref(),
        query.size.as_deref(),
        &state.config.pagination,
    )?;
    let filter = parse_filter(&query)?;

    let (items, total) = orders::list(&state.pool, &filter, params).await?;
    Ok(Json(Page::new(items, total, params)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError> {
    let order = orders::get(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("Order not found"))?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub user_id: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    if payload.total_cents < 0 {
        return Err(ApiError::Validation(
            "total_cents must not be negative".to_string(),
        ));
    }
    if let Some(notes) = &payload.notes {
        if notes.len() > 1000 {
            return Err(ApiError::Validation(
                "notes must be at most 1000 characters".to_string(),
            ));
        }
    }

    // Orders always belong to an existing user.
    if users::get(&state.pool, payload.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found"));
    }

    let new_order = NewOrder {
        order_number: format!("ORD-{}", Uuid::new_v4().simple()),
        user_id: payload.user_id,
        total_cents: payload.total_cents,
        notes: payload.notes,
    };
    let order = orders::insert(&state.pool, &new_order).await?;

    tracing::info!(
        order_id = order.id,
        order_number = %order.order_number,
        user_id = order.user_id,
        "Order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatus>,
) -> Result<Json<Order>, ApiError> {
    let order = orders::get(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("Order not found"))?;

    if !order.status.can_transition(payload.status) {
        return Err(ApiError::Conflict(format!(
            "Order cannot move from {} to {}",
            status_name(order.status),
            status_name(payload.status)
        )));
    }

    let updated = orders::update_status(&state.pool, id, payload.status)
        .await?
        .ok_or(ApiError::NotFound("Order not found"))?;

    tracing::info!(order_id = id, status = status_name(updated.status), "Order status updated");
    Ok(Json(updated))
}

fn status_name(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Confirmed => "confirmed",
        OrderStatus::Processing => "processing",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Delivered => "delivered",
        OrderStatus::Cancelled => "cancelled",
        OrderStatus::Refunded => "refunded",
    }
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !orders::delete(&state.pool, id).await? {
        return Err(ApiError::NotFound("Order not found"));
    }
    tracing::info!(order_id = id, "Order deleted");
    Ok(Json(serde_json::json!({
        "message": "Order deleted successfully"
    })))
}
