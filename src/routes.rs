use std::sync::Arc;

use axum::{middleware, response::IntoResponse, routing::get, Extension, Json, Router};
use tower_http::trace::TraceLayer;

use crate::{
    db::cache::CacheHelper,
    handler::{
        auth::auth_handler,
        chat::{conversations_handler, messages_handler},
        gigs::gigs_handler,
        jobs::{applications_handler, jobs_handler},
        orders::orders_handler,
        users::users_handler,
    },
    middleware::{auth, rate_limit::RateLimiter},
    AppState,
};

pub fn create_router(app_state: Arc<AppState>, limiter: Arc<RateLimiter>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler(limiter))
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/gigs", gigs_handler())
        .nest("/orders", orders_handler())
        .nest(
            "/conversations",
            conversations_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/messages", messages_handler().layer(middleware::from_fn(auth)))
        .nest("/jobs", jobs_handler())
        .nest("/applications", applications_handler());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_route)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}

async fn health(Extension(app_state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1")
        .execute(&app_state.db_client.pool)
        .await
    {
        Ok(_) => "up",
        Err(e) => {
            tracing::error!("Health check database error: {}", e);
            "down"
        }
    };

    let cache = match &app_state.db_client.redis_client {
        Some(redis) => match CacheHelper::health_check(redis).await {
            Ok(true) => "up",
            _ => "down",
        },
        None => app_state.db_client.cache_status(),
    };

    Json(serde_json::json!({
        "status": "success",
        "database": database,
        "cache": cache
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        db::{db::DBClient, pendingdb::InMemoryPendingStore},
        service::{
            checkout_service::CheckoutService,
            notification_service::{testing::CapturingOutbox, Outbox},
            payment_provider::PaymentProviderService,
            registration_service::RegistrationService,
        },
    };

    fn test_app() -> Router {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let db_client = Arc::new(DBClient::new(pool));
        let outbox: Arc<dyn Outbox> = Arc::new(CapturingOutbox::default());
        let payments = Arc::new(PaymentProviderService::new(&config));

        let app_state = AppState {
            registration: RegistrationService::new(
                db_client.clone(),
                Arc::new(InMemoryPendingStore::new()),
                outbox.clone(),
            ),
            checkout: CheckoutService::new(
                db_client.clone(),
                payments,
                outbox.clone(),
                config.paystack_secret_key.clone(),
                config.flutterwave_webhook_hash.clone(),
            ),
            env: config,
            db_client,
            outbox,
        };

        let limiter = Arc::new(RateLimiter::new(100, Duration::from_secs(60)));
        create_router(Arc::new(app_state), limiter)
    }

    #[tokio::test]
    async fn test_paystack_webhook_rejects_bad_signature() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/orders/webhook/paystack")
                    .header("x-paystack-signature", "deadbeef")
                    .body(Body::from(r#"{"event":"charge.success","data":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_flutterwave_webhook_rejects_wrong_hash() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/orders/webhook/flutterwave")
                    .header("verif-hash", "not-the-hash")
                    .body(Body::from(r#"{"event":"charge.completed","data":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/users/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_creating_a_gig_requires_token() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/gigs")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/conversations")
                    .header("authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
