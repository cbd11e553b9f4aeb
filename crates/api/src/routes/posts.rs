use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    handler::Handler,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use blog_core::listing::{ListingFilter, ListingResult, PageRequest};
use db::models::{Post, PostWithCategory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{internal_error, ApiResult, AppError},
    middleware::auth::protect_admin,
    state::{AppState, RequestId},
    validation::PostPayload,
};

const NOT_FOUND: &str = "Server could not find a requested post";
const READ_FAILED: &str = "Server could not read post because database connection";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/posts",
            get(list_posts).post(create_post.layer(from_fn_with_state(state.clone(), protect_admin))),
        )
        .route(
            "/posts/{post_id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct ListingParams {
    page: Option<String>,
    limit: Option<String>,
    category: Option<String>,
    keyword: Option<String>,
}

#[derive(Debug, Serialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    message: &'static str,
    data: Post,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn list_posts(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> ApiResult<Json<ListingResult<PostWithCategory>>> {
    let Query(params) = params.map_err(|rejection| {
        AppError::BadRequest(rejection.body_text()).with_request_id(&request_id.0)
    })?;
    let settings = &state.settings;
    let page = PageRequest::from_raw(
        params.page.as_deref(),
        params.limit.as_deref(),
        settings.listing_max_limit,
    );
    let filter = ListingFilter::from_raw(
        params.category.as_deref(),
        params.keyword.as_deref(),
        settings.listing_filter_mode,
    )
    .map_err(|err| AppError::BadRequest(err.to_string()).with_request_id(&request_id.0))?;

    let result = db::queries::posts::list(&state.db, &filter, page)
        .await
        .map_err(internal_error(&request_id, READ_FAILED))?;

    tracing::debug!(
        request_id = %request_id.0,
        total_items = result.total_items,
        page = result.current_page,
        "listed posts"
    );

    Ok(Json(result))
}

async fn get_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<DataResponse<PostWithCategory>>> {
    let id = parse_post_id(&post_id, NOT_FOUND, &request_id)?;

    let post = db::queries::posts::get_by_id(&state.db, id)
        .await
        .map_err(internal_error(&request_id, READ_FAILED))?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()).with_request_id(&request_id.0))?;

    Ok(Json(DataResponse { data: post }))
}

async fn create_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let payload = parse_payload(body, &request_id)?;

    let post = db::queries::posts::create(&state.db, &payload.fields)
        .await
        .map_err(internal_error(
            &request_id,
            "Server could not create post because database connection",
        ))?;

    tracing::info!(request_id = %request_id.0, post_id = post.id, "post created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Created post successfully",
            data: post,
        }),
    ))
}

async fn update_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(post_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    const MISSING: &str = "Server could not find a requested post to update";

    let id = parse_post_id(&post_id, MISSING, &request_id)?;
    let payload = parse_payload(body, &request_id)?;

    db::queries::posts::update(&state.db, id, &payload.fields, payload.date)
        .await
        .map_err(internal_error(
            &request_id,
            "Server could not update post because database connection",
        ))?
        .ok_or_else(|| AppError::NotFound(MISSING.to_string()).with_request_id(&request_id.0))?;

    tracing::info!(request_id = %request_id.0, post_id = id, "post updated");

    Ok(Json(MessageResponse {
        message: "Updated post sucessfully",
    }))
}

async fn delete_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    const MISSING: &str = "Server could not find a requested post to delete";

    let id = parse_post_id(&post_id, MISSING, &request_id)?;

    let deleted = db::queries::posts::delete(&state.db, id)
        .await
        .map_err(internal_error(
            &request_id,
            "Server could not delete post because database connection",
        ))?;
    if !deleted {
        return Err(AppError::NotFound(MISSING.to_string()).with_request_id(&request_id.0));
    }

    tracing::info!(request_id = %request_id.0, post_id = id, "post deleted");

    Ok(Json(MessageResponse {
        message: "Deleted post successfully",
    }))
}

// Ids outside the serial column's range cannot match any row.
fn parse_post_id(raw: &str, missing: &str, request_id: &RequestId) -> ApiResult<i32> {
    raw.parse::<i32>()
        .map_err(|_| AppError::NotFound(missing.to_string()).with_request_id(&request_id.0))
}

fn parse_payload(
    body: Result<Json<Value>, JsonRejection>,
    request_id: &RequestId,
) -> ApiResult<PostPayload> {
    let Json(body) =
        body.map_err(|rejection| AppError::BadRequest(rejection.body_text()).with_request_id(&request_id.0))?;

    PostPayload::from_json(&body)
        .map_err(|message| AppError::BadRequest(message).with_request_id(&request_id.0))
}
