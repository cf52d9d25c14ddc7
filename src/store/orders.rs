//! Order entity, status transitions, and queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use crate::http::pagination::{PageParams, SortOrder};
use crate::store::DbPool;

/// Order lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }

    /// Whether a transition to `next` is legal from this state.
    ///
    /// Cancellation is only possible before processing starts; refunds only
    /// after cancellation or delivery; terminal states admit no exit other
    /// than a refund.
    pub fn can_transition(self, next: OrderStatus) -> bool {
        match next {
            OrderStatus::Cancelled => {
                matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
            }
            OrderStatus::Refunded => {
                matches!(self, OrderStatus::Cancelled | OrderStatus::Delivered)
            }
            _ => !matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
}

/// Whitelisted sort columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSortKey {
    Status,
    TotalCents,
    CreatedAt,
    UpdatedAt,
}

impl OrderSortKey {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("status") => OrderSortKey::Status,
            Some("total_cents") => OrderSortKey::TotalCents,
            Some("updated_at") => OrderSortKey::UpdatedAt,
            _ => OrderSortKey::CreatedAt,
        }
    }

    fn column(self) -> &'static str {
        match self {
            OrderSortKey::Status => "status",
            OrderSortKey::TotalCents => "total_cents",
            OrderSortKey::CreatedAt => "created_at",
            OrderSortKey::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderFilter {
    /// Substring match against the order number.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub user_id: Option<i64>,
    pub sort_by: OrderSortKey,
    pub sort_order: SortOrder,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            user_id: None,
            sort_by: OrderSortKey::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, total_cents, notes, \
                             created_at, updated_at, shipped_at, delivered_at";

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    let mut prefix = " WHERE ";
    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", term.to_lowercase());
        qb.push(prefix)
            .push("LOWER(order_number) LIKE ")
            .push_bind(pattern);
        prefix = " AND ";
    }
    if let Some(status) = filter.status {
        qb.push(prefix).push("status = ").push_bind(status);
        prefix = " AND ";
    }
    if let Some(user_id) = filter.user_id {
        qb.push(prefix).push("user_id = ").push_bind(user_id);
    }
}

/// Fetch one page of orders plus the pre-pagination total.
pub async fn list(
    pool: &DbPool,
    filter: &OrderFilter,
    page: PageParams,
) -> Result<(Vec<Order>, i64), sqlx::Error> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY ")
        .push(filter.sort_by.column())
        .push(" ")
        .push(filter.sort_order.as_sql())
        .push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = qb.build_query_as::<Order>().fetch_all(pool).await?;

    Ok((items, total))
}

pub async fn get(pool: &DbPool, id: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &DbPool, new: &NewOrder) -> Result<Order, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO orders (order_number, user_id, status, total_cents, notes, created_at, updated_at) \
         VALUES (?, ?, 'pending', ?, ?, ?, ?)",
    )
    .bind(&new.order_number)
    .bind(new.user_id)
    .bind(new.total_cents)
    .bind(&new.notes)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    get(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

/// Move an order to `next`, stamping shipment/delivery instants the first
/// time those states are reached. The transition itself has already been
/// validated by the caller against [`OrderStatus::can_transition`].
pub async fn update_status(
    pool: &DbPool,
    id: i64,
    next: OrderStatus,
) -> Result<Option<Order>, sqlx::Error> {
    let now = Utc::now();
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE orders SET status = ");
    qb.push_bind(next);
    qb.push(", updated_at = ").push_bind(now);
    if next == OrderStatus::Shipped {
        qb.push(", shipped_at = COALESCE(shipped_at, ").push_bind(now).push(")");
    }
    if next == OrderStatus::Delivered {
        qb.push(", delivered_at = COALESCE(delivered_at, ").push_bind(now).push(")");
    }
    qb.push(" WHERE id = ").push_bind(id);

    let result = qb.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get(pool, id).await
}

/// Delete by id; `true` when a row was removed.
pub async fn delete(pool: &DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
