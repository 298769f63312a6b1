use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        orderdb::OrderExt,
        userdb::{ProfileUpdate, UserExt},
    },
    dtos::{
        orderdtos::{AdminDashboardDto, SellerDashboardDto},
        userdtos::{
            FilterUserDto, PublicUserDto, UpdateProfileDto, UserData, UserListResponseDto,
            UserResponseDto,
        },
        RequestQueryDto, Response,
    },
    error::{ErrorMessage, HttpError},
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::Permission,
    utils::currency::split_platform_fee,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route(
            "/dashboard/seller",
            get(seller_dashboard).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![Permission::Seller])
            })),
        )
        .route(
            "/dashboard/admin",
            get(admin_dashboard).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![Permission::Admin])
            })),
        )
        .route(
            "/admin/users",
            get(get_users).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![Permission::Admin])
            })),
        )
        .route("/:id", get(get_user).delete(delete_user))
}

pub async fn get_me(
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&auth.user),
        },
    }))
}

pub async fn get_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": { "user": PublicUserDto::from_user(&user) }
    })))
}

pub async fn update_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let update = ProfileUpdate {
        description: body.description,
        img: body.img,
        phone: body.phone,
        country: body.country,
    };

    let user = app_state
        .db_client
        .update_user_profile(auth.user.id, update)
        .await
        .map_err(HttpError::database)?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn delete_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if auth.user.id != user_id && !auth.user.is_admin {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    let deleted = app_state
        .db_client
        .delete_user(user_id)
        .await
        .map_err(HttpError::database)?;

    if deleted == 0 {
        return Err(HttpError::not_found("User not found"));
    }

    tracing::info!("User {} deleted by {}", user_id, auth.user.id);
    Ok(Json(Response {
        status: "success",
        message: "User deleted".to_string(),
    }))
}

pub async fn get_users(
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let users = app_state
        .db_client
        .get_users(query_params.page(), query_params.limit())
        .await
        .map_err(HttpError::database)?;

    let user_count = app_state
        .db_client
        .get_user_count()
        .await
        .map_err(HttpError::database)?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        users: FilterUserDto::filter_users(&users),
        results: user_count,
    }))
}

pub async fn seller_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .db_client
        .seller_stats(auth.user.id)
        .await
        .map_err(HttpError::database)?;

    let (monthly_platform_fee, monthly_earnings) = split_platform_fee(stats.monthly_revenue);

    let dashboard = SellerDashboardDto {
        gig_count: stats.gig_count,
        total_sales: stats.total_sales,
        gross_revenue: stats.gross_revenue,
        monthly_revenue: stats.monthly_revenue,
        monthly_platform_fee,
        monthly_earnings,
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": dashboard
    })))
}

pub async fn admin_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state
        .db_client
        .platform_stats()
        .await
        .map_err(HttpError::database)?;

    let (monthly_earnings, _) = split_platform_fee(stats.monthly_revenue);

    let dashboard = AdminDashboardDto {
        user_count: stats.user_count,
        seller_count: stats.seller_count,
        gig_count: stats.gig_count,
        order_count: stats.order_count,
        monthly_revenue: stats.monthly_revenue,
        monthly_earnings,
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": dashboard
    })))
}
