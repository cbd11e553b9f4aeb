use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use blog_core::types::Role;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{internal_error, ApiResult, AppError},
    state::{AppState, RequestId},
};

/// The caller resolved from a bearer token. `role` is only filled in by the
/// admin guard.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

pub async fn protect_user(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> ApiResult<Response> {
    let request_id = request_id_of(&req);
    let token = bearer_token(req.headers()).map(str::to_string);

    let user = authenticate(&state, token, &request_id).await?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

pub async fn protect_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> ApiResult<Response> {
    let request_id = request_id_of(&req);
    let token = bearer_token(req.headers()).map(str::to_string);

    let mut user = authenticate(&state, token, &request_id).await?;

    let role = db::queries::users::get_role(&state.db, user.id)
        .await
        .map_err(internal_error(&request_id, "Internal server error"))?
        .ok_or_else(|| {
            AppError::NotFound("User role not found".to_string()).with_request_id(&request_id.0)
        })?;

    if Role::from_db(&role) != Some(Role::Admin) {
        tracing::info!(request_id = %request_id.0, user_id = %user.id, "admin access denied");
        return Err(
            AppError::Forbidden("Forbidden: You do not have admin access".to_string())
                .with_request_id(&request_id.0),
        );
    }

    user.role = Some(Role::Admin);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

async fn authenticate(
    state: &AppState,
    token: Option<String>,
    request_id: &RequestId,
) -> ApiResult<AuthUser> {
    let token = token.ok_or_else(|| {
        AppError::Unauthorized("Unauthorized: Token missing".to_string())
            .with_request_id(&request_id.0)
    })?;

    match state.identity.get_user(&token).await {
        Ok(user) => Ok(AuthUser {
            id: user.id,
            email: user.email,
            role: None,
        }),
        Err(err) if err.is_rejection() => Err(AppError::Unauthorized(
            "Unauthorized: Invalid token".to_string(),
        )
        .with_request_id(&request_id.0)),
        Err(err) => Err(internal_error(request_id, "Internal server error")(err)),
    }
}

fn request_id_of(req: &Request<Body>) -> RequestId {
    req.extensions()
        .get::<RequestId>()
        .cloned()
        .unwrap_or_else(|| RequestId(String::new()))
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}
