use axum::{
    extract::{rejection::JsonRejection, State},
    handler::Handler,
    http::{HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Extension, Json, Router,
};
use blog_core::types::Role;
use db::models::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{internal_error, ApiResult, AppError},
    middleware::auth::{bearer_token, protect_admin, protect_user, AuthUser},
    state::{AppState, RequestId},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/auth/protected-route",
            get(protected_route.layer(from_fn_with_state(state.clone(), protect_user))),
        )
        .route(
            "/auth/admin-only",
            get(admin_only.layer(from_fn_with_state(state.clone(), protect_admin))),
        )
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/get-user", get(get_user))
        .route("/auth/reset-password", put(reset_password))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: Option<String>,
    password: Option<String>,
    username: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest {
    old_password: Option<String>,
    new_password: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProtectedResponse {
    message: &'static str,
    user: AuthUser,
}

#[derive(Debug, Serialize)]
struct AdminResponse {
    message: &'static str,
    admin: AuthUser,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    message: &'static str,
    user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    message: &'static str,
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    id: Uuid,
    email: Option<String>,
    username: String,
    name: String,
    role: String,
    profile_pic: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn protected_route(Extension(user): Extension<AuthUser>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "This is protected content",
        user,
    })
}

async fn admin_only(Extension(admin): Extension<AuthUser>) -> Json<AdminResponse> {
    Json(AdminResponse {
        message: "This is admin-only content",
        admin,
    })
}

async fn register(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    const FAILED: &str = "An error occurred during registration";

    let Json(body) = body.map_err(|rejection| bad_request(rejection.body_text(), &request_id))?;
    let (Some(email), Some(password), Some(username), Some(name)) = (
        present(body.email),
        present(body.password),
        present(body.username),
        present(body.name),
    ) else {
        return Err(bad_request(
            "Email, password, username and name are required",
            &request_id,
        ));
    };

    let existing = db::queries::users::get_by_username(&state.db, &username)
        .await
        .map_err(internal_error(&request_id, FAILED))?;
    if existing.is_some() {
        return Err(bad_request("This username is already taken", &request_id));
    }

    let identity_user = match state.identity.sign_up(&email, &password).await {
        Ok(user) => user,
        Err(err) if err.is_user_already_exists() => {
            return Err(bad_request("User with this email already exists", &request_id));
        }
        Err(err) if err.is_rejection() => {
            tracing::info!(request_id = %request_id.0, error = %err, "sign-up rejected");
            return Err(bad_request(
                "Failed to create user. Please try again.",
                &request_id,
            ));
        }
        Err(err) => return Err(internal_error(&request_id, FAILED)(err)),
    };

    let user = db::queries::users::create(
        &state.db,
        identity_user.id,
        &username,
        &name,
        Role::User,
    )
    .await
    .map_err(internal_error(&request_id, FAILED))?;

    tracing::info!(request_id = %request_id.0, user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(body) = body.map_err(|rejection| bad_request(rejection.body_text(), &request_id))?;
    let (Some(email), Some(password)) = (present(body.email), present(body.password)) else {
        return Err(bad_request("Email and password are required", &request_id));
    };

    match state.identity.sign_in_with_password(&email, &password).await {
        Ok(session) => Ok(Json(LoginResponse {
            message: "Signed in successfully",
            access_token: session.access_token,
        })),
        Err(err) if err.is_invalid_credentials() => Err(bad_request(
            "Your password is incorrect or this email doesn't exist",
            &request_id,
        )),
        Err(err) if err.is_rejection() => Err(bad_request(
            err.provider_message().unwrap_or("Login failed"),
            &request_id,
        )),
        Err(err) => Err(internal_error(&request_id, "An error occurred during login")(err)),
    }
}

async fn get_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> ApiResult<Json<ProfileResponse>> {
    const FAILED: &str = "Internal server error";

    let token = bearer_token(&headers).ok_or_else(|| {
        AppError::Unauthorized("Unauthorized: Token missing".to_string())
            .with_request_id(&request_id.0)
    })?;

    let identity_user = match state.identity.get_user(token).await {
        Ok(user) => user,
        Err(err) if err.is_rejection() => {
            return Err(AppError::Unauthorized("Unauthorized or token expired".to_string())
                .with_request_id(&request_id.0));
        }
        Err(err) => return Err(internal_error(&request_id, FAILED)(err)),
    };

    let profile = db::queries::users::get_by_id(&state.db, identity_user.id)
        .await
        .map_err(internal_error(&request_id, FAILED))?
        .ok_or_else(|| {
            AppError::NotFound("User profile not found".to_string()).with_request_id(&request_id.0)
        })?;

    Ok(Json(ProfileResponse {
        id: identity_user.id,
        email: identity_user.email,
        username: profile.username,
        name: profile.name,
        role: profile.role,
        profile_pic: profile.profile_pic,
    }))
}

async fn reset_password(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    const FAILED: &str = "Internal server error";

    let token = bearer_token(&headers).ok_or_else(|| {
        AppError::Unauthorized("Unauthorized: Token missing".to_string())
            .with_request_id(&request_id.0)
    })?;
    let Json(body) = body.map_err(|rejection| bad_request(rejection.body_text(), &request_id))?;
    let Some(new_password) = present(body.new_password) else {
        return Err(bad_request("New password is required", &request_id));
    };

    let identity_user = match state.identity.get_user(token).await {
        Ok(user) => user,
        Err(err) if err.is_rejection() => {
            return Err(AppError::Unauthorized("Unauthorized: Invalid token".to_string())
                .with_request_id(&request_id.0));
        }
        Err(err) => return Err(internal_error(&request_id, FAILED)(err)),
    };

    // Re-authenticate with the old password before allowing the change.
    let (Some(email), Some(old_password)) = (identity_user.email, present(body.old_password))
    else {
        return Err(bad_request("Invalid old password", &request_id));
    };
    match state.identity.sign_in_with_password(&email, &old_password).await {
        Ok(_) => {}
        Err(err) if err.is_rejection() => {
            return Err(bad_request("Invalid old password", &request_id));
        }
        Err(err) => return Err(internal_error(&request_id, FAILED)(err)),
    }

    match state.identity.update_password(token, &new_password).await {
        Ok(_) => {}
        Err(err) if err.is_rejection() => {
            return Err(bad_request(
                err.provider_message().unwrap_or("Password update failed"),
                &request_id,
            ));
        }
        Err(err) => return Err(internal_error(&request_id, FAILED)(err)),
    }

    tracing::info!(request_id = %request_id.0, user_id = %identity_user.id, "password updated");

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn bad_request(message: impl Into<String>, request_id: &RequestId) -> crate::error::ApiError {
    AppError::BadRequest(message.into()).with_request_id(&request_id.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{send, test_app, TestApp, VALID_TOKEN};
    use axum::body::Body;
    use axum::http::Request;
    use blog_core::listing::FilterMode;
    use serde_json::{json, Value};

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    #[test]
    fn test_present_treats_blank_as_missing() {
        assert_eq!(present(Some("  ".to_string())), None);
        assert_eq!(present(None), None);
        assert_eq!(present(Some("x".to_string())), Some("x".to_string()));
    }

    #[tokio::test]
    async fn test_protected_route_returns_user() {
        let TestApp { app, user_id } = test_app(FilterMode::CategoryName).await;
        let req = request("GET", "/auth/protected-route", Some(VALID_TOKEN), None);

        let (status, json) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "This is protected content");
        assert_eq!(json["user"]["id"], user_id.to_string());
        assert_eq!(json["user"]["email"], "reader@example.com");
    }

    #[tokio::test]
    async fn test_protected_route_without_token() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let req = request("GET", "/auth/protected-route", None, None);

        let (status, json) = send(app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "Unauthorized: Token missing");
    }

    #[tokio::test]
    async fn test_admin_only_rejects_invalid_token() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let req = request("GET", "/auth/admin-only", Some("expired"), None);

        let (status, json) = send(app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "Unauthorized: Invalid token");
    }

    #[tokio::test]
    async fn test_register_requires_all_fields() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let body = json!({"email": "a@example.com", "password": "secret", "username": "a"});

        let (status, json) = send(app, request("POST", "/auth/register", None, Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"],
            "Email, password, username and name are required"
        );
    }

    #[tokio::test]
    async fn test_login_success() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let body = json!({"email": "reader@example.com", "password": "secret"});

        let (status, json) = send(app, request("POST", "/auth/login", None, Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Signed in successfully");
        assert_eq!(json["accessToken"], VALID_TOKEN);
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let body = json!({"email": "reader@example.com", "password": "wrong"});

        let (status, json) = send(app, request("POST", "/auth/login", None, Some(body))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"],
            "Your password is incorrect or this email doesn't exist"
        );
    }

    #[tokio::test]
    async fn test_get_user_without_token() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;

        let (status, json) = send(app, request("GET", "/auth/get-user", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "Unauthorized: Token missing");
    }

    #[tokio::test]
    async fn test_get_user_expired_token() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;

        let (status, json) =
            send(app, request("GET", "/auth/get-user", Some("expired"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["message"], "Unauthorized or token expired");
    }

    #[tokio::test]
    async fn test_reset_password_requires_new_password() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let body = json!({"oldPassword": "secret"});

        let (status, json) = send(
            app,
            request("PUT", "/auth/reset-password", Some(VALID_TOKEN), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "New password is required");
    }

    #[tokio::test]
    async fn test_reset_password_wrong_old_password() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let body = json!({"oldPassword": "wrong", "newPassword": "fresh-secret"});

        let (status, json) = send(
            app,
            request("PUT", "/auth/reset-password", Some(VALID_TOKEN), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Invalid old password");
    }

    #[tokio::test]
    async fn test_reset_password_provider_rejects_new_password() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let body = json!({"oldPassword": "secret", "newPassword": "short"});

        let (status, json) = send(
            app,
            request("PUT", "/auth/reset-password", Some(VALID_TOKEN), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"]["message"],
            "Password should be at least 6 characters."
        );
    }

    #[tokio::test]
    async fn test_reset_password_success() {
        let TestApp { app, .. } = test_app(FilterMode::CategoryName).await;
        let body = json!({"oldPassword": "secret", "newPassword": "fresh-secret"});

        let (status, json) = send(
            app,
            request("PUT", "/auth/reset-password", Some(VALID_TOKEN), Some(body)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Password updated successfully");
    }
}
