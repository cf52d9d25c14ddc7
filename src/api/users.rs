//! User CRUD handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::http::pagination::{Page, PageParams, SortOrder};
use crate::http::server::AppState;
use crate::store::users::{
    self, NewUser, Role, User, UserChanges, UserFilter, UserSortKey, UserStats,
};

/// Raw list query: values arrive as strings so that malformed input maps
/// to 422 instead of the extractor's opaque 400.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub size: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, ApiError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ApiError::Validation(format!(
            "{field} must be a boolean, got {other:?}"
        ))),
    }
}

fn parse_filter(query: &ListUsersQuery) -> Result<UserFilter, ApiError> {
    let role = query
        .role
        .as_deref()
        .map(|raw| {
            Role::from_param(raw).ok_or_else(|| {
                ApiError::Validation(format!(
                    "role must be one of admin, user, manager, got {raw:?}"
                ))
            })
        })
        .transpose()?;
    let is_active = query
        .is_active
        .as_deref()
        .map(|raw| parse_bool("is_active", raw))
        .transpose()?;

    Ok(UserFilter {
        search: query.search.clone().filter(|s| !s.is_empty()),
        role,
        is_active,
        sort_by: UserSortKey::from_param(query.sort_by.as_deref()),
        sort_order: SortOrder::parse(query.sort_order.as_deref())?,
    })
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Page<User>>, ApiError> {
    let params = PageParams::from_query(
        query.page.as_deref(),
        query.size.as_deref(),
        &state.config.pagination,
    )?;
    let filter = parse_filter(&query)?;

    let (items, total) = users::list(&state.pool, &filter, params).await?;
    Ok(Json(Page::new(items, total, params)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = users::get(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
    pub bio: Option<String>,
}

fn default_role() -> Role {
    Role::User
}

impl CreateUser {
    fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_optional_text("username", self.username.as_deref(), 100)?;
        validate_optional_text("bio", self.bio.as_deref(), 500)?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 100 {
        return Err(ApiError::Validation(
            "name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() || email.len() > 255 || !email.contains('@') {
        return Err(ApiError::Validation(
            "email must be a valid address of at most 255 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_optional_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<(), ApiError> {
    if let Some(value) = value {
        if value.is_empty() || value.len() > max_len {
            return Err(ApiError::Validation(format!(
                "{field} must be between 1 and {max_len} characters"
            )));
        }
    }
    Ok(())
}

/// Map the engine's unique violation on `users.email` to the conflict
/// response; the constraint is what makes concurrent duplicate creates
/// safe, the earlier pre-check only produces the friendly common case.
fn conflict_on_duplicate_email(e: sqlx::Error) -> ApiError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("User with this email already exists".to_string())
        }
        _ => ApiError::from(e),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    payload.validate()?;

    if users::find_by_email(&state.pool, &payload.email)
        .await?
        .is_some()
    {
        tracing::warn!(email = %payload.email, "Create rejected, user exists");
        return Err(ApiError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let new_user = NewUser {
        name: payload.name,
        email: payload.email,
        username: payload.username,
        role: payload.role,
        bio: payload.bio,
    };
    let user = users::insert(&state.pool, &new_user)
        .await
        .map_err(conflict_on_duplicate_email)?;

    // Fire-and-forget; a slow mailer never delays the 201.
    state.mailer.send_welcome(&user.email, &user.name);

    tracing::info!(user_id = user.id, email = %user.email, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub bio: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        validate_optional_text("username", self.username.as_deref(), 100)?;
        validate_optional_text("bio", self.bio.as_deref(), 500)?;
        Ok(())
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUser>,
) -> Result<Json<User>, ApiError> {
    payload.validate()?;

    let existing = users::get(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    // Only a changed email needs the uniqueness pre-check.
    if let Some(email) = &payload.email {
        if *email != existing.email
            && users::find_by_email(&state.pool, email).await?.is_some()
        {
            return Err(ApiError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
    }

    let changes = UserChanges {
        name: payload.name,
        email: payload.email,
        username: payload.username,
        role: payload.role,
        bio: payload.bio,
        is_active: payload.is_active,
    };
    let user = users::update(&state.pool, id, &changes)
        .await
        .map_err(conflict_on_duplicate_email)?
        .ok_or(ApiError::NotFound("User not found"))?;

    tracing::info!(user_id = id, "User updated");
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !users::delete(&state.pool, id).await? {
        return Err(ApiError::NotFound("User not found"));
    }
    tracing::info!(user_id = id, "User deleted");
    Ok(Json(serde_json::json!({
        "message": "User deleted successfully"
    })))
}

/// Admin-only aggregate counts; the admin guard runs before this handler.
pub async fn user_stats(State(state): State<AppState>) -> Result<Json<UserStats>, ApiError> {
    let since = Utc::now() - Duration::days(30);
    let stats = users::stats(&state.pool, since).await?;
    Ok(Json(stats))
}
