// src/models/gallery.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A member card in the organization structure (Struktur Kepengurusan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    pub image_url: String,
    pub name: String,
    pub position: String,
    pub period: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl GalleryItem {
    /// Display caption, "Name - Position". Never parsed back.
    pub fn caption(&self) -> String {
        format!("{} - {}", self.name, self.position)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewGalleryItem {
    #[validate(length(min = 1, message = "URL foto wajib diisi"))]
    pub image_url: String,
    #[validate(length(min = 1, message = "Nama lengkap wajib diisi"))]
    pub name: String,
    #[validate(length(min = 1, message = "Jabatan wajib diisi"))]
    pub position: String,
    /// Defaults to the current year when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Periode wajib diisi"))]
    pub period: Option<String>,
}

impl NewGalleryItem {
    pub fn normalized(self, current_year: &str) -> Self {
        NewGalleryItem {
            image_url: self.image_url.trim().to_string(),
            name: self.name.trim().to_string(),
            position: self.position.trim().to_string(),
            period: Some(
                self.period
                    .map(|p| p.trim().to_string())
                    .unwrap_or_else(|| current_year.to_string()),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GalleryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "URL foto wajib diisi"))]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Nama lengkap wajib diisi"))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Jabatan wajib diisi"))]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Periode wajib diisi"))]
    pub period: Option<String>,
}

impl GalleryPatch {
    pub fn normalized(self) -> Self {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        GalleryPatch {
            image_url: trim(self.image_url),
            name: trim(self.name),
            position: trim(self.position),
            period: trim(self.period),
        }
    }
}
