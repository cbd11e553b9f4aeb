use blog_core::listing::{CategoryFilter, ListingFilter, ListingResult, PageRequest};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{Post, PostFields, PostWithCategory};

const FROM_POSTS: &str = " FROM posts INNER JOIN categories ON posts.category_id = categories.id";

const SELECT_POSTS: &str = "SELECT posts.id, posts.image, posts.category_id, posts.title, \
     posts.description, posts.date, posts.content, posts.status_id, \
     categories.name AS category_name";

pub async fn create(pool: &PgPool, fields: &PostFields) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, image, category_id, description, content, status_id, date)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        RETURNING id, image, category_id, title, description, date, content, status_id
        "#,
    )
    .bind(&fields.title)
    .bind(&fields.image)
    .bind(fields.category_id)
    .bind(&fields.description)
    .bind(&fields.content)
    .bind(fields.status_id)
    .fetch_one(pool)
    .await
}

pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<PostWithCategory>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(SELECT_POSTS);
    qb.push(FROM_POSTS);
    qb.push(" WHERE posts.id = ").push_bind(id);

    qb.build_query_as::<PostWithCategory>()
        .fetch_optional(pool)
        .await
}

/// Overwrites every editable field. `date` keeps its stored value when `None`.
pub async fn update(
    pool: &PgPool,
    id: i32,
    fields: &PostFields,
    date: Option<DateTime<Utc>>,
) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = $2,
            image = $3,
            category_id = $4,
            description = $5,
            content = $6,
            status_id = $7,
            date = COALESCE($8, date)
        WHERE id = $1
        RETURNING id, image, category_id, title, description, date, content, status_id
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(&fields.image)
    .bind(fields.category_id)
    .bind(&fields.description)
    .bind(&fields.content)
    .bind(fields.status_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

/// Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list(
    pool: &PgPool,
    filter: &ListingFilter,
    page: PageRequest,
) -> Result<ListingResult<PostWithCategory>, sqlx::Error> {
    let mut count_qb = count_query(filter);
    tracing::debug!(sql = count_qb.sql(), "counting posts");
    let total_items: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut page_qb = page_query(filter, page);
    tracing::debug!(sql = page_qb.sql(), page = page.page, limit = page.limit, "listing posts");
    let items = page_qb
        .build_query_as::<PostWithCategory>()
        .fetch_all(pool)
        .await?;

    Ok(ListingResult::new(total_items, page, items))
}

/// Counts every row the listing filter matches, ignoring pagination.
pub fn count_query(filter: &ListingFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*)");
    qb.push(FROM_POSTS);
    push_filters(&mut qb, filter);
    qb
}

/// Selects one page of the filtered listing, newest first.
pub fn page_query(filter: &ListingFilter, page: PageRequest) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_POSTS);
    qb.push(FROM_POSTS);
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY posts.date DESC, posts.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

// Shared by both listing queries so the count always matches the pages.
fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, filter: &ListingFilter) {
    let mut prefix = " WHERE ";

    if let Some(category) = &filter.category {
        qb.push(prefix);
        match category {
            CategoryFilter::Name(name) => {
                qb.push("categories.name ILIKE ").push_bind(name.clone());
            }
            CategoryFilter::Id(id) => {
                qb.push("posts.category_id = ").push_bind(*id);
            }
        }
        prefix = " AND ";
    }

    if let Some(pattern) = filter.keyword_pattern() {
        qb.push(prefix);
        qb.push("(posts.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR posts.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR posts.content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
