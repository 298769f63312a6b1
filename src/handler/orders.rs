use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::orderdb::OrderExt,
    dtos::orderdtos::CompleteOrderDto,
    error::{ErrorMessage, HttpError},
    middleware::{auth, JWTAuthMiddeware},
    models::ordermodel::PaymentGateway,
    AppState,
};

/// Order routes. Gateway callbacks are merged after the session layer and are
/// authenticated by signature instead.
pub fn orders_handler() -> Router {
    let webhooks = Router::new()
        .route("/webhook/paystack", post(paystack_webhook))
        .route("/webhook/flutterwave", post(flutterwave_webhook));

    Router::new()
        .route("/", get(get_orders))
        .route("/paystack/:gig_id", post(create_paystack_intent))
        .route("/flutterwave/:gig_id", post(create_flutterwave_intent))
        .route("/reference/:reference", get(get_order_by_reference))
        .route("/:id/complete", put(complete_order))
        .layer(middleware::from_fn(auth))
        .merge(webhooks)
}

async fn create_intent(
    app_state: Arc<AppState>,
    auth: JWTAuthMiddeware,
    gig_id: Uuid,
    gateway: PaymentGateway,
) -> Result<impl IntoResponse, HttpError> {
    let intent = app_state
        .checkout
        .create_intent(&auth.user, gig_id, gateway)
        .await?;

    Ok((StatusCode::CREATED, Json(intent)))
}

pub async fn create_paystack_intent(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(gig_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    create_intent(app_state, auth, gig_id, PaymentGateway::Paystack).await
}

pub async fn create_flutterwave_intent(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(gig_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    create_intent(app_state, auth, gig_id, PaymentGateway::Flutterwave).await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

pub async fn paystack_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .checkout
        .handle_paystack_webhook(&body, header_str(&headers, "x-paystack-signature"))
        .await?;

    Ok(Json(serde_json::json!({"status": "success"})))
}

pub async fn flutterwave_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .checkout
        .handle_flutterwave_webhook(&body, header_str(&headers, "verif-hash"))
        .await?;

    Ok(Json(serde_json::json!({"status": "success"})))
}

pub async fn get_orders(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let orders = app_state
        .db_client
        .get_user_orders(auth.user.id)
        .await
        .map_err(HttpError::database)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": orders.len(),
        "data": orders
    })))
}

/// Lets the buyer poll after the gateway redirect. 404 until the webhook lands.
pub async fn get_order_by_reference(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let order = app_state
        .db_client
        .get_order_by_reference(&reference)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Order not found"))?;

    if order.buyer_id != auth.user.id && order.seller_id != auth.user.id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": order
    })))
}

pub async fn complete_order(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(order_id): Path<Uuid>,
    body: Option<Json<CompleteOrderDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let order = app_state
        .db_client
        .get_order(order_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Order not found"))?;

    if order.buyer_id != auth.user.id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    let order = app_state
        .db_client
        .complete_order(order_id, body.star)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::bad_request("Order is already completed"))?;

    tracing::info!("Order {} completed by {}", order.id, auth.user.id);

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": order
    })))
}
