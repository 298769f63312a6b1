use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{cache::CacheHelper, gigdb::GigExt},
    dtos::{
        gigdtos::{CreateGigDto, GigDto, GigQueryDto},
        Response,
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::{gigmodel::Gig, usermodel::Permission},
    AppState,
};

const GIG_CACHE_TTL: usize = 300;

fn gig_cache_key(gig_id: Uuid) -> String {
    format!("gig:{}", gig_id)
}

/// Listing and reading gigs is public; writes require a session.
pub fn gigs_handler() -> Router {
    Router::new()
        .route(
            "/",
            post(create_gig)
                .layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![Permission::Seller])
                }))
                .layer(middleware::from_fn(auth))
                .get(get_gigs),
        )
        .route(
            "/:id",
            delete(delete_gig)
                .layer(middleware::from_fn(auth))
                .get(get_gig),
        )
}

pub async fn create_gig(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateGigDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let gig = app_state
        .db_client
        .create_gig(auth.user.id, body)
        .await
        .map_err(HttpError::database)?;

    tracing::info!("Gig {} created by {}", gig.id, auth.user.id);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": GigDto::from_gig(gig)
        })),
    ))
}

pub async fn get_gigs(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<GigQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let gigs = app_state
        .db_client
        .get_gigs(&query)
        .await
        .map_err(HttpError::database)?;

    let gigs: Vec<GigDto> = gigs.into_iter().map(GigDto::from_gig).collect();

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": gigs.len(),
        "data": gigs
    })))
}

pub async fn get_gig(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(gig_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let key = gig_cache_key(gig_id);

    if let Some(redis) = &app_state.db_client.redis_client {
        if let Ok(Some(gig)) = CacheHelper::get::<Gig>(redis, &key).await {
            return Ok(Json(serde_json::json!({
                "status": "success",
                "data": GigDto::from_gig(gig)
            })));
        }
    }

    let gig = app_state
        .db_client
        .get_gig(gig_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Gig not found"))?;

    if let Some(redis) = &app_state.db_client.redis_client {
        if let Err(e) = CacheHelper::set(redis, &key, &gig, GIG_CACHE_TTL).await {
            tracing::warn!("Failed to cache gig {}: {}", gig_id, e);
        }
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": GigDto::from_gig(gig)
    })))
}

pub async fn delete_gig(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(gig_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let gig = app_state
        .db_client
        .get_gig(gig_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Gig not found"))?;

    if gig.user_id != auth.user.id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    app_state
        .db_client
        .delete_gig(gig_id)
        .await
        .map_err(HttpError::database)?;

    if let Some(redis) = &app_state.db_client.redis_client {
        if let Err(e) = CacheHelper::delete(redis, &gig_cache_key(gig_id)).await {
            tracing::warn!("Failed to evict gig {} from cache: {}", gig_id, e);
        }
    }

    Ok(Json(Response {
        status: "success",
        message: "Gig has been deleted".to_string(),
    }))
}
