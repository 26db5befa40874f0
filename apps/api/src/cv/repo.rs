use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cv::models::{Cv, CvPayload};
use crate::errors::AppError;
use crate::models::cv::CvRow;

/// Storage for CV documents, at most one per account.
#[async_trait]
pub trait CvRepository: Send + Sync {
    async fn find_for_account(&self, account_id: Uuid) -> Result<Option<Cv>, AppError>;

    /// Creates the account's CV or overwrites every field of the existing one.
    /// `updated_at` always moves strictly forward.
    async fn upsert(&self, account_id: Uuid, payload: &CvPayload) -> Result<Cv, AppError>;
}

#[derive(Clone)]
pub struct PgCvRepository {
    pool: PgPool,
}

impl PgCvRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CvRepository for PgCvRepository {
    async fn find_for_account(&self, account_id: Uuid) -> Result<Option<Cv>, AppError> {
        let row = sqlx::query_as::<_, CvRow>("SELECT * FROM cvs WHERE account_id = $1 LIMIT 1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Cv::from))
    }

    async fn upsert(&self, account_id: Uuid, payload: &CvPayload) -> Result<Cv, AppError> {
        let row = sqlx::query_as::<_, CvRow>(
            r#"
            INSERT INTO cvs
                (id, account_id, about_me, professional_title, education, experience, skills, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            ON CONFLICT (account_id) DO UPDATE SET
                about_me = EXCLUDED.about_me,
                professional_title = EXCLUDED.professional_title,
                education = EXCLUDED.education,
                experience = EXCLUDED.experience,
                skills = EXCLUDED.skills,
                updated_at = GREATEST(now(), cvs.updated_at + INTERVAL '1 microsecond')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(&payload.about_me)
        .bind(&payload.professional_title)
        .bind(Json(&payload.education))
        .bind(Json(&payload.experience))
        .bind(Json(&payload.skills))
        .fetch_one(&self.pool)
        .await?;

        Ok(Cv::from(row))
    }
}
