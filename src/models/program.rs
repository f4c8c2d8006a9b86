// src/models/program.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One sie (division) and its ordered list of work programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramItem {
    pub id: String,
    pub sie_name: String,
    pub description: String,
    #[serde(default)]
    pub programs: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProgramSie {
    #[validate(length(min = 1, message = "Nama sie wajib diisi"))]
    pub sie_name: String,
    #[validate(length(min = 1, message = "Deskripsi sie wajib diisi"))]
    pub description: String,
    #[serde(default)]
    pub programs: Vec<String>,
}

impl NewProgramSie {
    pub fn normalized(self) -> Self {
        NewProgramSie {
            sie_name: self.sie_name.trim().to_string(),
            description: self.description.trim().to_string(),
            programs: clean_programs(self.programs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProgramPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Nama sie wajib diisi"))]
    pub sie_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Deskripsi sie wajib diisi"))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programs: Option<Vec<String>>,
}

impl ProgramPatch {
    pub fn normalized(self) -> Self {
        ProgramPatch {
            sie_name: self.sie_name.map(|s| s.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
            programs: self.programs.map(clean_programs),
        }
    }
}

// The edit form keeps a trailing blank row for the next entry.
fn clean_programs(programs: Vec<String>) -> Vec<String> {
    programs
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
