//utils.rs
use std::collections::HashSet;

use chrono::{DateTime, Datelike, Local, Utc};
use sanitize_filename::sanitize;
use serde::{Deserialize, Deserializer};

pub const DEFAULT_UPLOAD_FOLDER: &str = "images";

/// Membership year used to decide which members are shown.
pub fn current_year() -> String {
    Local::now().year().to_string()
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Remove every tag (and the bodies of `script`/`style`) but keep the text as
/// typed: `&`, `<` and `>` in plain text come back unescaped.
pub fn sanitize_text(text: &str) -> String {
    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));
    let cleaned = builder.clean(text).to_string();
    unescape_text(&cleaned).trim().to_string()
}

// Inverse of the html serializer's text escaping; `&amp;` must go last.
fn unescape_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

pub fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(non_empty(value))
}

/// Object key for an uploaded image: `{folder}/{millis}_{filename}`.
pub fn object_key(folder: &str, filename: &str, at: DateTime<Utc>) -> String {
    let folder = folder
        .split('/')
        .map(|segment| sanitize(segment.trim()))
        .filter(|segment| !segment.is_empty() && segment != "." && segment != "..")
        .collect::<Vec<_>>()
        .join("/");
    let folder = if folder.is_empty() {
        DEFAULT_UPLOAD_FOLDER.to_string()
    } else {
        folder
    };

    let filename = sanitize(filename.trim()).replace(' ', "_");
    let filename = if filename.is_empty() || filename.starts_with('.') {
        format!("image{}", filename)
    } else {
        filename
    };

    format!("{}/{}_{}", folder, at.timestamp_millis(), filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_710_000_000_000).unwrap()
    }

    #[test]
    fn object_key_prefixes_timestamp_and_cleans_name() {
        assert_eq!(
            object_key("news", "foto kegiatan.png", at()),
            "news/1710000000000_foto_kegiatan.png"
        );
    }

    #[test]
    fn object_key_drops_traversal_segments() {
        assert_eq!(
            object_key("../gallery/./2024", "a.jpg", at()),
            "gallery/2024/1710000000000_a.jpg"
        );
        assert_eq!(object_key("", "", at()), "images/1710000000000_image");
    }

    #[test]
    fn sanitize_keeps_plain_text_verbatim() {
        assert_eq!(
            sanitize_text("Tari & Musik: kuota < 10 orang"),
            "Tari & Musik: kuota < 10 orang"
        );
        assert_eq!(sanitize_text("<3 acaranya > harapan"), "<3 acaranya > harapan");
        assert_eq!(sanitize_text("  R&D  "), "R&D");
    }

    #[test]
    fn sanitize_strips_tags_and_script_bodies() {
        assert_eq!(
            sanitize_text("<p>Belajar <b>membatik</b></p><script>alert(1)</script>"),
            "Belajar membatik"
        );
        assert_eq!(sanitize_text("<style>p{}</style>Halo &amp; selamat"), "Halo & selamat");
    }

    #[test]
    fn non_empty_trims_and_drops_blanks() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" x ".into())), Some("x".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
