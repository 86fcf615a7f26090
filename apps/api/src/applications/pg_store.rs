use async_trait::async_trait;
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

use crate::applications::store::ApplicationStore;
use crate::errors::AppError;
use crate::models::application::{
    ApplicationRecord, ApplicationRow, ApplicationSummary, SummaryRow,
};

/// Postgres-backed store. Schema lives in `migrations/`.
pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn insert(&self, record: &ApplicationRecord) -> Result<(), AppError> {
        let resume = record.resume.as_ref();
        sqlx::query(
            r#"
            INSERT INTO applications
                (id, name, email, phone,
                 resume_filename, resume_storage_path, resume_mime_type, resume_uploaded_at,
                 behavioral_responses, status, submitted_at, last_updated, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(resume.map(|r| r.filename.as_str()))
        .bind(resume.map(|r| r.storage_path.as_str()))
        .bind(resume.map(|r| r.mime_type.as_str()))
        .bind(resume.map(|r| r.uploaded_at))
        .bind(SqlJson(&record.behavioral_responses))
        .bind(record.status.as_str())
        .bind(record.submitted_at)
        .bind(record.last_updated)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError> {
        let row = sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ApplicationRecord::try_from)
            .transpose()
            .map_err(AppError::Internal)
    }

    async fn save(&self, record: &ApplicationRecord) -> Result<(), AppError> {
        let resume = record.resume.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE applications SET
                name = $2, email = $3, phone = $4,
                resume_filename = $5, resume_storage_path = $6,
                resume_mime_type = $7, resume_uploaded_at = $8,
                behavioral_responses = $9, status = $10,
                submitted_at = $11, last_updated = $12
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(resume.map(|r| r.filename.as_str()))
        .bind(resume.map(|r| r.storage_path.as_str()))
        .bind(resume.map(|r| r.mime_type.as_str()))
        .bind(resume.map(|r| r.uploaded_at))
        .bind(SqlJson(&record.behavioral_responses))
        .bind(record.status.as_str())
        .bind(record.submitted_at)
        .bind(record.last_updated)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::application_not_found());
        }
        Ok(())
    }

    async fn list_summaries(&self) -> Result<Vec<ApplicationSummary>, AppError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, name, email, status, submitted_at FROM applications \
             ORDER BY submitted_at DESC NULLS LAST",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(ApplicationSummary::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::Internal)
    }
}
