mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{
    db::{connect_redis, DBClient},
    pendingdb::{InMemoryPendingStore, PendingRegistrationStore, RedisPendingStore},
};
use dotenv::dotenv;
use mail::sendmail::transport_from_config;
use middleware::rate_limit::otp_rate_limiter;
use routes::create_router;
use service::{
    checkout_service::CheckoutService,
    notification_service::{spawn_email_worker, EmailOutbox, Outbox},
    payment_provider::PaymentProviderService,
    registration_service::RegistrationService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub registration: RegistrationService,
    pub checkout: CheckoutService,
    pub outbox: Arc<dyn Outbox>,
}

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!().run(&pool).await {
        tracing::error!("Failed to run migrations: {}", err);
        std::process::exit(1);
    }

    let redis = match &config.redis_url {
        Some(redis_url) => connect_redis(redis_url).await,
        None => {
            tracing::warn!("REDIS_URL not set, running without cache");
            None
        }
    };
    let db_client = Arc::new(DBClient::new(pool).with_cache(redis));

    let pending: Arc<dyn PendingRegistrationStore> = match &db_client.redis_client {
        Some(redis) => Arc::new(RedisPendingStore::new(redis.clone())),
        None => {
            let store = Arc::new(InMemoryPendingStore::new());
            let sweeper = store.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(PURGE_INTERVAL);
                loop {
                    interval.tick().await;
                    let purged = sweeper.purge_expired();
                    if purged > 0 {
                        tracing::debug!("Purged {} stale pending registrations", purged);
                    }
                }
            });
            store
        }
    };

    let (email_outbox, receiver) = EmailOutbox::channel();
    spawn_email_worker(receiver, transport_from_config(&config), config.app_url.clone());
    let outbox: Arc<dyn Outbox> = Arc::new(email_outbox);

    let payments = Arc::new(PaymentProviderService::new(&config));

    let app_state = AppState {
        registration: RegistrationService::new(db_client.clone(), pending, outbox.clone()),
        checkout: CheckoutService::new(
            db_client.clone(),
            payments,
            outbox.clone(),
            config.paystack_secret_key.clone(),
            config.flutterwave_webhook_hash.clone(),
        ),
        env: config.clone(),
        db_client,
        outbox,
    };

    let limiter = Arc::new(otp_rate_limiter().trust_forwarded_for(config.trust_forwarded_for));
    let pruned = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            pruned.prune();
        }
    });

    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app = create_router(Arc::new(app_state), limiter).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", err);
    }
}
