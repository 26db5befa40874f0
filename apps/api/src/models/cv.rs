use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::cv::models::{Cv, EducationEntry, ExperienceEntry, SkillEntry};

/// Row shape of the `cvs` table. Array-valued sections are stored as JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct CvRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub about_me: Option<String>,
    pub professional_title: Option<String>,
    pub education: Json<Vec<EducationEntry>>,
    pub experience: Json<Vec<ExperienceEntry>>,
    pub skills: Json<Vec<SkillEntry>>,
    pub updated_at: DateTime<Utc>,
}

impl From<CvRow> for Cv {
    fn from(row: CvRow) -> Self {
        Cv {
            id: row.id,
            account_id: row.account_id,
            about_me: row.about_me,
            professional_title: row.professional_title,
            education: row.education.0,
            experience: row.experience.0,
            skills: row.skills.0,
            updated_at: row.updated_at,
        }
    }
}
