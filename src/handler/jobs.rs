use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{jobdb::JobExt, userdb::UserExt},
    dtos::{
        jobdtos::{ApplyJobDto, CreateJobDto, UpdateApplicationStatusDto},
        RequestQueryDto, Response,
    },
    error::{is_unique_violation, ErrorMessage, HttpError},
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::{jobmodel::Job, usermodel::Permission},
    service::notification_service::EmailJob,
    AppState,
};

/// Job board reads are public; posting needs an organization account.
pub fn jobs_handler() -> Router {
    Router::new()
        .route(
            "/",
            post(create_job)
                .layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![Permission::Organization])
                }))
                .layer(middleware::from_fn(auth))
                .get(get_jobs),
        )
        .route(
            "/:id",
            delete(delete_job)
                .layer(middleware::from_fn(auth))
                .get(get_job),
        )
        .route(
            "/:id/applications",
            get(get_job_applications).layer(middleware::from_fn(auth)),
        )
}

pub fn applications_handler() -> Router {
    Router::new()
        .route(
            "/",
            post(apply_to_job).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![Permission::RemoteWorker])
            })),
        )
        .route("/mine", get(get_my_applications))
        .route("/:id/status", put(update_application_status))
        .layer(middleware::from_fn(auth))
}

async fn load_owned_job(app_state: &AppState, job_id: Uuid, user_id: Uuid) -> Result<Job, HttpError> {
    let job = app_state
        .db_client
        .get_job(job_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    if job.organization_id != user_id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(job)
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .db_client
        .create_job(auth.user.id, body)
        .await
        .map_err(HttpError::database)?;

    tracing::info!("Job {} posted by {}", job.id, auth.user.id);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"status": "success", "data": job})),
    ))
}

pub async fn get_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query_params): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let jobs = app_state
        .db_client
        .get_jobs(query_params.limit() as i64, query_params.offset())
        .await
        .map_err(HttpError::database)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": jobs.len(),
        "data": jobs
    })))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .db_client
        .get_job(job_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    Ok(Json(serde_json::json!({"status": "success", "data": job})))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    load_owned_job(&app_state, job_id, auth.user.id).await?;

    app_state
        .db_client
        .delete_job(job_id)
        .await
        .map_err(HttpError::database)?;

    Ok(Json(Response {
        status: "success",
        message: "Job deleted".to_string(),
    }))
}

pub async fn get_job_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    load_owned_job(&app_state, job_id, auth.user.id).await?;

    let applications = app_state
        .db_client
        .get_job_applications(job_id)
        .await
        .map_err(HttpError::database)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": applications.len(),
        "data": applications
    })))
}

pub async fn apply_to_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<ApplyJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .db_client
        .get_job(body.job_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    let application = app_state
        .db_client
        .create_application(auth.user.id, body)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                HttpError::unique_constraint_violation("You have already applied to this job")
            } else {
                HttpError::database(e)
            }
        })?;

    match app_state
        .db_client
        .get_user(Some(job.organization_id), None, None)
        .await
    {
        Ok(Some(organization)) => app_state.outbox.enqueue(EmailJob::JobApplication {
            email: organization.email,
            username: organization.username,
            applicant: auth.user.username.clone(),
            job_title: job.title.clone(),
            job_id: job.id,
        }),
        Ok(None) => tracing::warn!("Job {} has no owning organization", job.id),
        Err(e) => tracing::error!("Failed to load organization for job {}: {}", job.id, e),
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"status": "success", "data": application})),
    ))
}

pub async fn get_my_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state
        .db_client
        .get_worker_applications(auth.user.id)
        .await
        .map_err(HttpError::database)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": applications.len(),
        "data": applications
    })))
}

pub async fn update_application_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(application_id): Path<Uuid>,
    Json(body): Json<UpdateApplicationStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .db_client
        .get_application(application_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Application not found"))?;

    load_owned_job(&app_state, application.job_id, auth.user.id).await?;

    let application = app_state
        .db_client
        .update_application_status(application_id, body.status)
        .await
        .map_err(HttpError::database)?;

    tracing::info!(
        "Application {} moved to {}",
        application.id,
        application.status.to_str()
    );

    Ok(Json(serde_json::json!({"status": "success", "data": application})))
}
