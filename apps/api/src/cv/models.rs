use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Column width of `cvs.professional_title`.
pub const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_year: String,
    pub end_year: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    /// Still employed here; `end_date` is then usually empty.
    pub current: bool,
    pub description: String,
}

/// `level` is a free-form label ("beginner", "expert", "B2", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    pub level: String,
}

/// Request body for `POST /cv/`. Every field replaces the stored value;
/// omitted sections become empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvPayload {
    #[serde(default)]
    pub about_me: Option<String>,
    #[serde(default)]
    pub professional_title: Option<String>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
}

impl CvPayload {
    /// Rejects values the `cvs` columns cannot hold.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.professional_title {
            if title.chars().count() > MAX_TITLE_CHARS {
                return Err(AppError::InvalidInput(format!(
                    "professional_title must be at most {MAX_TITLE_CHARS} characters"
                )));
            }
        }
        Ok(())
    }
}

/// A persisted CV as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cv {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub account_id: Uuid,
    pub about_me: Option<String>,
    pub professional_title: Option<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<SkillEntry>,
    pub updated_at: DateTime<Utc>,
}
