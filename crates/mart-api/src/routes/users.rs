//! # Users API
//!
//! Registration and login issue identity tokens. `GET /users` lists
//! accounts for debugging and is only mounted outside production.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use mart_core::{Email, Role, UserId, UserRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, is_blank, Validate};
use crate::state::AppState;

/// Registration request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name.
    pub name: Option<String>,
    /// Login email.
    pub email: Option<String>,
    /// Plain-text password.
    pub password: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        if is_blank(&self.name) || is_blank(&self.email) || is_blank(&self.password) {
            return Err("name, email and password are required".to_string());
        }
        Ok(())
    }
}

/// Login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login email.
    pub email: Option<String>,
    /// Plain-text password.
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        if is_blank(&self.email) || is_blank(&self.password) {
            return Err("email and password are required".to_string());
        }
        Ok(())
    }
}

/// Identity returned by registration and login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// User id.
    #[serde(rename = "_id")]
    #[schema(value_type = String)]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized email.
    pub email: String,
    /// Current role.
    #[schema(value_type = String)]
    pub role: Role,
    /// Bearer token.
    pub token: String,
}

impl AuthResponse {
    fn issue(state: &AppState, user: &UserRecord) -> Result<Self, AppError> {
        Ok(Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.as_str().to_string(),
            role: user.role,
            token: state.tokens.issue(user)?,
        })
    }
}

/// Build the users router.
pub fn router(include_debug_routes: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));
    if include_debug_routes {
        router.route("/users", get(list_users))
    } else {
        router
    }
}

/// POST /api/register — Create an account and return a token.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = AuthResponse),
        (status = 400, description = "Missing fields or email taken", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let email = Email::parse(req.email.as_deref().unwrap_or_default())?;
    let name = req.name.unwrap_or_default().trim().to_string();
    let password = req.password.unwrap_or_default();

    if state.user_by_email(&email).is_some() {
        return Err(AppError::BadRequest("email is already in use".into()));
    }

    let hasher = state.passwords.clone();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash_password(&password)).await??;

    let _guard = state.mutation_lock.lock().await;
    if state.user_by_email(&email).is_some() {
        return Err(AppError::BadRequest("email is already in use".into()));
    }

    let user = UserRecord::new(email, name, password_hash);
    if let Some(pool) = &state.db_pool {
        crate::db::users::insert(pool, &user).await?;
    }
    state.users.insert(user.id, user.clone());

    tracing::info!(user_id = %user.id, "user registered");
    metrics::counter!("mart_users_registered_total").increment(1);

    Ok(Json(AuthResponse::issue(&state, &user)?))
}

/// POST /api/login — Exchange credentials for a token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown email or wrong password", body = crate::error::ErrorBody),
    ),
    tag = "users"
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let user = Email::parse(req.email.as_deref().unwrap_or_default())
        .ok()
        .and_then(|email| state.user_by_email(&email));
    let Some(user) = user else {
        metrics::counter!("mart_logins_total", "outcome" => "unknown_email").increment(1);
        return Err(AppError::NotFound("invalid email".into()));
    };

    let hasher = state.passwords.clone();
    let password = req.password.unwrap_or_default();
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash)).await??;
    if !valid {
        tracing::debug!(user_id = %user.id, "login rejected: wrong password");
        metrics::counter!("mart_logins_total", "outcome" => "wrong_password").increment(1);
        return Err(AppError::NotFound("incorrect password".into()));
    }

    metrics::counter!("mart_logins_total", "outcome" => "success").increment(1);
    Ok(Json(AuthResponse::issue(&state, &user)?))
}

/// GET /api/users — List accounts (non-production only).
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users, without credentials"),
    ),
    tag = "users"
)]
pub(crate) async fn list_users(State(state): State<AppState>) -> Json<Vec<UserRecord>> {
    let mut users = state.users.list();
    users.sort_by_key(|u| u.created_at);
    Json(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_every_field() {
        let req = RegisterRequest {
            name: Some("A".into()),
            email: Some("a@mail.com".into()),
            password: Some("  ".into()),
        };
        assert!(req.validate().is_err());

        let ok = RegisterRequest {
            password: Some("123456".into()),
            ..req
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn login_requires_email_and_password() {
        let req = LoginRequest {
            email: None,
            password: Some("x".into()),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn auth_response_carries_a_verifiable_token() {
        let state = AppState::new();
        let user = UserRecord::new(Email::parse("a@mail.com").unwrap(), "A", String::new());
        let response = AuthResponse::issue(&state, &user).unwrap();
        assert_eq!(response.id, user.id);
        assert_eq!(state.tokens.verify(&response.token).unwrap().sub, user.id);
    }
}
