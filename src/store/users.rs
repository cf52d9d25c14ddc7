//! User entity and queries.
//!
//! List queries are assembled with `QueryBuilder`: the WHERE clause is
//! shared between the row query and the count query so the reported total
//! always matches the filter, and every value is pushed as a bind
//! parameter. Sort columns come from a whitelist, never from the request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use crate::http::pagination::{PageParams, SortOrder};
use crate::store::DbPool;

/// Role assigned to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Manager,
}

impl Role {
    /// Parse a query-parameter value; `None` for anything out of contract.
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "manager" => Some(Role::Manager),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub bio: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
    pub bio: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub bio: Option<String>,
    pub is_active: Option<bool>,
}

/// Whitelisted sort columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortKey {
    Name,
    Email,
    Role,
    CreatedAt,
    UpdatedAt,
}

impl UserSortKey {
    /// Unknown values fall back to the creation timestamp.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("name") => UserSortKey::Name,
            Some("email") => UserSortKey::Email,
            Some("role") => UserSortKey::Role,
            Some("updated_at") => UserSortKey::UpdatedAt,
            _ => UserSortKey::CreatedAt,
        }
    }

    fn column(self) -> &'static str {
        match self {
            UserSortKey::Name => "name",
            UserSortKey::Email => "email",
            UserSortKey::Role => "role",
            UserSortKey::CreatedAt => "created_at",
            UserSortKey::UpdatedAt => "updated_at",
        }
    }
}

/// Filters applied to the user list.
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub sort_by: UserSortKey,
    pub sort_order: SortOrder,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            search: None,
            role: None,
            is_active: None,
            sort_by: UserSortKey::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

const USER_COLUMNS: &str =
    "id, name, email, username, role, bio, is_active, created_at, updated_at";

/// Push the WHERE clause for `filter`: search terms OR-ed over the text
/// fields, equality filters AND-ed on top.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    let mut prefix = " WHERE ";
    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", term.to_lowercase());
        qb.push(prefix)
            .push("(LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(email) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(username, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
        prefix = " AND ";
    }
    if let Some(role) = filter.role {
        qb.push(prefix).push("role = ").push_bind(role);
        prefix = " AND ";
    }
    if let Some(active) = filter.is_active {
        qb.push(prefix).push("is_active = ").push_bind(active);
    }
}

/// Fetch one page of users plus the pre-pagination total.
pub async fn list(
    pool: &DbPool,
    filter: &UserFilter,
    page: PageParams,
) -> Result<(Vec<User>, i64), sqlx::Error> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM users");
    push_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY ")
        .push(filter.sort_by.column())
        .push(" ")
        .push(filter.sort_order.as_sql())
        .push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = qb.build_query_as::<User>().fetch_all(pool).await?;

    Ok((items, total))
}

pub async fn get(pool: &DbPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Insert a user. A duplicate email surfaces as the engine's
/// unique-violation error; callers map it to the conflict response.
pub async fn insert(pool: &DbPool, new: &NewUser) -> Result<User, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO users (name, email, username, role, bio, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.username)
    .bind(new.role)
    .bind(&new.bio)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    get(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

/// Apply a partial update; returns `None` when no row has that id.
pub async fn update(
    pool: &DbPool,
    id: i64,
    changes: &UserChanges,
) -> Result<Option<User>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE users SET updated_at = ");
    qb.push_bind(Utc::now());
    if let Some(name) = &changes.name {
        qb.push(", name = ").push_bind(name);
    }
    if let Some(email) = &changes.email {
        qb.push(", email = ").push_bind(email);
    }
    if let Some(username) = &changes.username {
        qb.push(", username = ").push_bind(username);
    }
    if let Some(role) = changes.role {
        qb.push(", role = ").push_bind(role);
    }
    if let Some(bio) = &changes.bio {
        qb.push(", bio = ").push_bind(bio);
    }
    if let Some(active) = changes.is_active {
        qb.push(", is_active = ").push_bind(active);
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
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Aggregate counts for the admin statistics endpoint.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub recent_registrations: i64,
}

pub async fn stats(pool: &DbPool, since: DateTime<Utc>) -> Result<UserStats, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    let active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
        .fetch_one(pool)
        .await?;
    let recent: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= ?")
        .bind(since)
        .fetch_one(pool)
        .await?;

    Ok(UserStats {
        total_users: total,
        active_users: active,
        inactive_users: total - active,
        recent_registrations: recent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_pool;

    fn new_user(name: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            username: None,
            role,
            bio: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let pool = test_pool().await;
        let created = insert(&pool, &new_user("John Doe", "john@example.com", Role::Admin))
            .await
            .unwrap();
        assert!(created.is_active);

        let fetched = get(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "john@example.com");
        assert_eq!(fetched.role, Role::Admin);
    }

    #[tokio::test]
    async fn duplicate_email_hits_unique_constraint() {
        let pool = test_pool().await;
        insert(&pool, &new_user("A", "dup@example.com", Role::User))
            .await
            .unwrap();

        let err = insert(&pool, &new_user("B", "dup@example.com", Role::User))
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }

        // The failed insert must not have mutated stored state.
        let (_, total) = list(&pool, &UserFilter::default(), PageParams { page: 1, size: 10 })
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn search_and_role_combine_with_and_semantics() {
        let pool = test_pool().await;
        insert(&pool, &new_user("John Doe", "john@example.com", Role::Admin))
            .await
            .unwrap();
        insert(&pool, &new_user("John Smith", "smith@example.com", Role::User))
            .await
            .unwrap();
        insert(&pool, &new_user("Lisa Garcia", "lisa@example.com", Role::Admin))
            .await
            .unwrap();

        let page = PageParams { page: 1, size: 10 };

        let search_only = UserFilter {
            search: Some("john".to_string()),
            ..Default::default()
        };
        let (_, search_total) = list(&pool, &search_only, page).await.unwrap();
        assert_eq!(search_total, 2);

        let role_only = UserFilter {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let (_, role_total) = list(&pool, &role_only, page).await.unwrap();
        assert_eq!(role_total, 2);

        // Intersection of the two filters applied alone.
        let both = UserFilter {
            search: Some("john".to_string()),
            role: Some(Role::Admin),
            ..Default::default()
        };
        let (items, both_total) = list(&pool, &both, page).await.unwrap();
        assert_eq!(both_total, 1);
        assert_eq!(items[0].email, "john@example.com");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_text_fields() {
        let pool = test_pool().await;
        let mut user = new_user("Ada Lovelace", "ada@example.com", Role::User);
        user.username = Some("countess".to_string());
        insert(&pool, &user).await.unwrap();

        let page = PageParams { page: 1, size: 10 };
        for term in ["ADA", "LoveLace", "COUNTESS", "example.COM"] {
            let filter = UserFilter {
                search: Some(term.to_string()),
                ..Default::default()
            };
            let (_, total) = list(&pool, &filter, page).await.unwrap();
            assert_eq!(total, 1, "term {term:?} should match");
        }
    }

    #[tokio::test]
    async fn pages_partition_the_result_set() {
        let pool = test_pool().await;
        for i in 0..7 {
            insert(&pool, &new_user(&format!("U{i}"), &format!("u{i}@x.com"), Role::User))
                .await
                .unwrap();
        }

        let filter = UserFilter::default();
        let mut seen = Vec::new();
        for page in 1..=3 {
            let (items, total) = list(&pool, &filter, PageParams { page, size: 3 })
                .await
                .unwrap();
            assert_eq!(total, 7);
            seen.extend(items.into_iter().map(|u| u.id));
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 7);
    }

    #[tokio::test]
    async fn partial_update_only_touches_provided_fields() {
        let pool = test_pool().await;
        let created = insert(&pool, &new_user("Before", "b@example.com", Role::User))
            .await
            .unwrap();

        let changes = UserChanges {
            name: Some("After".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = update(&pool, created.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.name, "After");
        assert_eq!(updated.email, "b@example.com");
        assert!(!updated.is_active);

        assert!(update(&pool, 9999, &changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let pool = test_pool().await;
        let created = insert(&pool, &new_user("X", "x@example.com", Role::User))
            .await
            .unwrap();
        assert!(delete(&pool, created.id).await.unwrap());
        assert!(!delete(&pool, created.id).await.unwrap());
        assert!(get(&pool, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stats_count_active_and_recent() {
        let pool = test_pool().await;
        insert(&pool, &new_user("A", "a@example.com", Role::User))
            .await
            .unwrap();
        let b = insert(&pool, &new_user("B", "b@example.com", Role::User))
            .await
            .unwrap();
        update(
            &pool,
            b.id,
            &UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let s = stats(&pool, Utc::now() - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(s.total_users, 2);
        assert_eq!(s.active_users, 1);
        assert_eq!(s.inactive_users, 1);
        assert_eq!(s.recent_registrations, 2);
    }

    #[test]
    fn unknown_sort_key_falls_back_to_created_at() {
        assert_eq!(UserSortKey::from_param(Some("name")), UserSortKey::Name);
        assert_eq!(
            UserSortKey::from_param(Some("no_such_column")),
            UserSortKey::CreatedAt
        );
        assert_eq!(UserSortKey::from_param(None), UserSortKey::CreatedAt);
    }
}
