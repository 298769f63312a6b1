// db/jobdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    dtos::jobdtos::{ApplyJobDto, CreateJobDto},
    models::jobmodel::{Application, ApplicationStatus, Job, APPLICATION_COLUMNS, JOB_COLUMNS},
};

#[async_trait]
pub trait JobExt {
    async fn create_job(&self, organization_id: Uuid, body: CreateJobDto) -> Result<Job, sqlx::Error>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error>;

    async fn get_jobs(&self, limit: i64, offset: i64) -> Result<Vec<Job>, sqlx::Error>;

    async fn delete_job(&self, job_id: Uuid) -> Result<u64, sqlx::Error>;

    /// Fails with a unique violation when the worker already applied to the job.
    async fn create_application(
        &self,
        worker_id: Uuid,
        body: ApplyJobDto,
    ) -> Result<Application, sqlx::Error>;

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, sqlx::Error>;

    async fn get_worker_applications(&self, worker_id: Uuid) -> Result<Vec<Application>, sqlx::Error>;

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, sqlx::Error>;

    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, sqlx::Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(&self, organization_id: Uuid, body: CreateJobDto) -> Result<Job, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO jobs (
                organization_id, title, description, location, job_type,
                salary_min, salary_max, skills
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            JOB_COLUMNS
        );

        sqlx::query_as::<_, Job>(&sql)
            .bind(organization_id)
            .bind(body.title)
            .bind(body.description)
            .bind(body.location)
            .bind(body.job_type)
            .bind(body.salary_min)
            .bind(body.salary_max)
            .bind(body.skills)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_jobs(&self, limit: i64, offset: i64) -> Result<Vec<Job>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM jobs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            JOB_COLUMNS
        );
        sqlx::query_as::<_, Job>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_application(
        &self,
        worker_id: Uuid,
        body: ApplyJobDto,
    ) -> Result<Application, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO applications (job_id, worker_id, cover_letter, resume_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );

        sqlx::query_as::<_, Application>(&sql)
            .bind(body.job_id)
            .bind(worker_id)
            .bind(body.cover_letter)
            .bind(body.resume_url)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Option<Application>, sqlx::Error> {
        let sql = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        sqlx::query_as::<_, Application>(&sql)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_worker_applications(&self, worker_id: Uuid) -> Result<Vec<Application>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM applications WHERE worker_id = $1 ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(worker_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM applications WHERE job_id = $1 ORDER BY created_at ASC",
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE applications
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(application_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await
    }
}
