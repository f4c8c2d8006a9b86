// src/models/news.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::{empty_as_none, non_empty, sanitize_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewNews {
    #[validate(length(min = 1, message = "Judul berita wajib diisi"))]
    pub title: String,
    #[validate(length(min = 1, message = "Isi berita wajib diisi"))]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewNews {
    pub fn normalized(self) -> Self {
        NewNews {
            title: sanitize_text(&self.title),
            content: sanitize_text(&self.content),
            image_url: non_empty(self.image_url),
        }
    }
}

/// Mutable fields of a news item. `None` leaves the stored value untouched;
/// an empty `imageUrl` clears the image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Judul berita wajib diisi"))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Isi berita wajib diisi"))]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NewsPatch {
    pub fn normalized(self) -> Self {
        NewsPatch {
            title: self.title.map(|t| sanitize_text(&t)),
            content: self.content.map(|c| sanitize_text(&c)),
            image_url: self.image_url.map(|u| u.trim().to_string()),
        }
    }
}
