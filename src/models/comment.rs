// src/models/comment.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::{empty_as_none, non_empty, sanitize_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved: bool,
}

/// Visitor input. `approved` and `createdAt` are always set by the server.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NewComment {
    #[validate(length(min = 1, max = 100, message = "Nama wajib diisi"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email tidak valid"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "Pesan wajib diisi"))]
    pub message: String,
}

impl NewComment {
    pub fn normalized(self) -> Self {
        NewComment {
            name: sanitize_text(&self.name),
            email: non_empty(self.email),
            message: sanitize_text(&self.message),
        }
    }
}
