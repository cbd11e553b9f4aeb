use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i32,
    pub image: String,
    pub category_id: i32,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub content: String,
    pub status_id: i32,
}

/// A post joined with its category name, as returned by the read routes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostWithCategory {
    pub id: i32,
    pub image: String,
    pub category_id: i32,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub content: String,
    pub status_id: i32,
    pub category_name: String,
}

/// Field values for insert and full update.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub image: String,
    pub category_id: i32,
    pub description: String,
    pub content: String,
    pub status_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub role: String,
    pub profile_pic: Option<String>,
}
