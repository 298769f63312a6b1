use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::{cache::CacheHelper, userdb::UserExt},
    dtos::{
        userdtos::{
            FilterUserDto, LoginUserDto, RegisterUserDto, ResendOtpDto, UserData,
            UserLoginResponseDto, UserResponseDto, VerifyOtpDto,
        },
        Response,
    },
    error::{ErrorMessage, HttpError},
    middleware::{
        auth,
        rate_limit::{rate_limit_middleware, RateLimiter},
        JWTAuthMiddeware,
    },
    models::usermodel::User,
    service::registration_service::normalize_email,
    utils::{password, token},
    AppState,
};

pub fn auth_handler(limiter: Arc<RateLimiter>) -> Router {
    let guarded = Router::new()
        .route("/verify-otp", post(verify_otp))
        .route("/resend-otp", post(resend_otp))
        .route("/login", post(login))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/logout", post(logout).layer(middleware::from_fn(auth)))
        .merge(guarded)
}

fn session_cookie(token: &str, max_age_minutes: i64) -> Result<HeaderValue, HttpError> {
    let cookie = Cookie::build(("token", token.to_string()))
        .path("/")
        .max_age(time::Duration::minutes(max_age_minutes))
        .http_only(true)
        .build();

    HeaderValue::from_str(&cookie.to_string()).map_err(|e| HttpError::server_error(e.to_string()))
}

fn issue_token(app_state: &AppState, user: &User) -> Result<String, HttpError> {
    token::create_token(
        &user.id.to_string(),
        user.is_seller,
        user.is_admin,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state.registration.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            status: "success",
            message: "Registration received! Check your email for the verification code.".to_string(),
        }),
    ))
}

pub async fn verify_otp(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<VerifyOtpDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state.registration.verify(&body.email, &body.otp).await?;

    let token = issue_token(&app_state, &user)?;
    let cookie = session_cookie(&token, app_state.env.jwt_maxage)?;

    let mut response = (
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    )
        .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    Ok(response)
}

pub async fn resend_otp(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ResendOtpDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state.registration.resend(&body.email).await?;

    Ok(Json(Response {
        status: "success",
        message: "A new verification code has been sent to your email.".to_string(),
    }))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let email = normalize_email(&body.email);
    let user = app_state
        .db_client
        .get_user(None, None, Some(&email))
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }

    let token = issue_token(&app_state, &user)?;
    let cookie = session_cookie(&token, app_state.env.jwt_maxage)?;

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
    })
    .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    tracing::info!("User {} logged in", user.id);
    Ok(response)
}

pub async fn logout(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(redis) = &app_state.db_client.redis_client {
        let remaining = token::decode_token(auth.token.as_str(), app_state.env.jwt_secret.as_bytes())
            .map(|claims| claims.exp.saturating_sub(chrono::Utc::now().timestamp() as usize))
            .unwrap_or(0);

        if let Err(e) = CacheHelper::blacklist_token(redis, &auth.token, remaining).await {
            tracing::error!("Failed to blacklist token for {}: {}", auth.user.id, e);
        }
    }

    let cookie = session_cookie("", 0)?;
    let mut response = Json(Response {
        status: "success",
        message: "Logged out".to_string(),
    })
    .into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);

    Ok(response)
}
