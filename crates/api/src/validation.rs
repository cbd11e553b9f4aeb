//! Request-body checks for post create and update.

use chrono::{DateTime, Utc};
use db::models::PostFields;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct PostPayload {
    pub fields: PostFields,
    /// Only honoured by update.
    pub date: Option<DateTime<Utc>>,
}

impl PostPayload {
    /// Checks fields in a fixed order and reports the first one that fails.
    pub fn from_json(body: &Value) -> Result<Self, String> {
        let title = text(body, "title")?;
        let image = text(body, "image")?;
        let category_id = number(body, "category_id")?;
        let description = text(body, "description")?;
        let content = text(body, "content")?;
        let status_id = number(body, "status_id")?;

        let date = match body.get("date") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_str()
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .ok_or_else(|| "Invalid date (Must be RFC 3339 String)".to_string())?,
            ),
        };

        Ok(Self {
            fields: PostFields {
                title,
                image,
                category_id,
                description,
                content,
                status_id,
            },
            date,
        })
    }
}

fn text(body: &Value, field: &str) -> Result<String, String> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("Invalid or missing {field} (Must be String)"))
}

fn number(body: &Value, field: &str) -> Result<i32, String> {
    body.get(field)
        .and_then(Value::as_i64)
        .filter(|value| *value != 0)
        .and_then(|value| i32::try_from(value).ok())
        .ok_or_else(|| format!("Invalid or missing {field} (Must be Number)"))
}
