//! # Authentication Middleware
//!
//! Resolves an optional `Authorization: Bearer <token>` header into a
//! [`Caller`] for the store and product routes.
//!
//! | Header                              | Outcome                     |
//! |-------------------------------------|-----------------------------|
//! | absent                              | anonymous, request proceeds |
//! | valid token for an existing user    | [`Caller`] in extensions    |
//! | non-Bearer, invalid, or expired     | 401                         |
//! | valid token, user no longer exists  | 401                         |
//!
//! Handlers that require a caller take [`Caller`] (rejects with 401);
//! handlers where identity only changes the response take `Option<Caller>`.
//!
//! The token's `sub` is the only claim trusted. Role, email and name are
//! re-read from the user record on every request so role changes take
//! effect without re-login.

use std::convert::Infallible;

use axum::extract::{OptionalFromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use mart_core::{Email, Role, UserId, UserRecord};

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// User id.
    pub id: UserId,
    /// Current role.
    pub role: Role,
    /// Current email.
    pub email: Email,
    /// Current display name.
    pub name: String,
}

impl From<&UserRecord> for Caller {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            role: user.role,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Required caller. Rejects with 401 when the request is anonymous.
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("authentication required".into()))
    }
}

/// Optional caller. `None` for anonymous requests.
impl<S: Send + Sync> OptionalFromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Caller>().cloned())
    }
}

/// Resolve the bearer token, if any, into a [`Caller`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = match request.headers().typed_try_get::<Authorization<Bearer>>() {
        Ok(Some(header)) => header,
        Ok(None) => return next.run(request).await,
        Err(_) => {
            tracing::warn!("authentication failed: malformed or non-Bearer authorization header");
            metrics::counter!("mart_auth_failures_total", "reason" => "scheme").increment(1);
            return AppError::Unauthorized("authorization header must use Bearer scheme".into())
                .into_response();
        }
    };

    let claims = match state.tokens.verify(header.token()) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, "authentication failed: token rejected");
            metrics::counter!("mart_auth_failures_total", "reason" => "token").increment(1);
            return AppError::from(err).into_response();
        }
    };

    let Some(user) = state.users.get(&claims.sub) else {
        tracing::warn!(user_id = %claims.sub, "authentication failed: user no longer exists");
        metrics::counter!("mart_auth_failures_total", "reason" => "unknown_user").increment(1);
        return AppError::Unauthorized("user not found".into()).into_response();
    };

    request.extensions_mut().insert(Caller::from(&user));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn whoami(caller: Option<Caller>) -> String {
        caller.map_or_else(|| "anonymous".to_string(), |c| c.name)
    }

    async fn private(caller: Caller) -> String {
        caller.id.to_string()
    }

    fn test_app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/private", get(private))
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn seeded() -> (AppState, UserRecord, String) {
        let state = AppState::new();
        let user = UserRecord::new(Email::parse("usuario@mail.com").unwrap(), "Usuario 1", String::new());
        state.users.insert(user.id, user.clone());
        let token = state.tokens.issue(&user).unwrap();
        (state, user, token)
    }

    async fn call(app: Router, uri: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn absent_header_is_anonymous() {
        let (state, _, _) = seeded();
        let (status, body) = call(test_app(state), "/whoami", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn valid_token_resolves_caller() {
        let (state, user, token) = seeded();
        let (status, body) =
            call(test_app(state), "/whoami", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user.name);
    }

    #[tokio::test]
    async fn caller_reflects_current_record() {
        let (state, user, token) = seeded();
        state.users.update(&user.id, |u| u.name = "Renomeado".into());
        let (_, body) = call(test_app(state), "/whoami", Some(&format!("Bearer {token}"))).await;
        assert_eq!(body, "Renomeado");
    }

    #[tokio::test]
    async fn invalid_token_rejected_even_on_optional_route() {
        let (state, _, _) = seeded();
        let (status, body) = call(test_app(state), "/whoami", Some("Bearer garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("message"));
    }

    #[tokio::test]
    async fn non_bearer_scheme_rejected() {
        let (state, _, _) = seeded();
        let (status, _) = call(test_app(state), "/whoami", Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deleted_user_rejected() {
        let (state, user, token) = seeded();
        state.users.remove(&user.id);
        let (status, _) = call(test_app(state), "/whoami", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn required_caller_rejects_anonymous() {
        let (state, user, token) = seeded();
        let app = test_app(state);
        let (status, _) = call(app.clone(), "/private", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(app, "/private", Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user.id.to_string());
    }
}
