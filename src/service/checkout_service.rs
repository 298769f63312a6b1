// service/checkout_service.rs
//! Payment intents and webhook reconciliation for gig purchases.
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::{
    error::ServiceError,
    notification_service::{EmailJob, Outbox},
    payment_provider::{
        generate_reference, verify_flutterwave_hash, verify_paystack_signature, CheckoutRequest,
        PaymentProviderService,
    },
};
use crate::{
    db::{db::DBClient, gigdb::GigExt, orderdb::OrderExt, userdb::UserExt},
    dtos::orderdtos::PaymentIntentResponseDto,
    models::{
        ordermodel::{ConfirmedCharge, Order, PaymentGateway},
        usermodel::User,
    },
};

/// Who bought what, as carried in gateway metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeMetadata {
    pub gig_id: Uuid,
    pub buyer_id: Uuid,
}

/// A charge the webhook claims succeeded, before the gig is re-read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedCharge {
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    pub metadata: ChargeMetadata,
}

fn uuid_field(meta: &Value, key: &str) -> Result<Uuid, ServiceError> {
    meta[key]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ServiceError::MalformedPayload(format!("metadata.{} missing or invalid", key)))
}

pub fn parse_metadata(meta: &Value) -> Result<ChargeMetadata, ServiceError> {
    Ok(ChargeMetadata {
        gig_id: uuid_field(meta, "gig_id")?,
        buyer_id: uuid_field(meta, "buyer_id")?,
    })
}

fn parse_body(raw_body: &[u8]) -> Result<Value, ServiceError> {
    serde_json::from_slice(raw_body).map_err(|e| ServiceError::MalformedPayload(e.to_string()))
}

/// `Ok(None)` for events other than `charge.success`.
pub fn parse_paystack_event(raw_body: &[u8]) -> Result<Option<ReportedCharge>, ServiceError> {
    let body = parse_body(raw_body)?;
    let event = body["event"]
        .as_str()
        .ok_or_else(|| ServiceError::MalformedPayload("missing event".to_string()))?;

    if event != "charge.success" {
        tracing::info!("Ignoring Paystack event {}", event);
        return Ok(None);
    }

    let data = &body["data"];
    let reference = data["reference"]
        .as_str()
        .ok_or_else(|| ServiceError::MalformedPayload("missing reference".to_string()))?;
    let amount_minor = data["amount"]
        .as_f64()
        .ok_or_else(|| ServiceError::MalformedPayload("missing amount".to_string()))?;

    Ok(Some(ReportedCharge {
        reference: reference.to_string(),
        amount: amount_minor / 100.0,
        currency: data["currency"].as_str().unwrap_or("NGN").to_string(),
        metadata: parse_metadata(&data["metadata"])?,
    }))
}

/// Returns the Flutterwave transaction id for successful `charge.completed` events.
pub fn parse_flutterwave_event(raw_body: &[u8]) -> Result<Option<i64>, ServiceError> {
    let body = parse_body(raw_body)?;
    let event = body["event"]
        .as_str()
        .ok_or_else(|| ServiceError::MalformedPayload("missing event".to_string()))?;
    let data = &body["data"];

    if event != "charge.completed" || data["status"].as_str() != Some("successful") {
        tracing::info!(
            "Ignoring Flutterwave event {} ({})",
            event,
            data["status"].as_str().unwrap_or("unknown")
        );
        return Ok(None);
    }

    data["id"]
        .as_i64()
        .map(Some)
        .ok_or_else(|| ServiceError::MalformedPayload("missing transaction id".to_string()))
}

#[derive(Clone)]
pub struct CheckoutService {
    db_client: Arc<DBClient>,
    payments: Arc<PaymentProviderService>,
    outbox: Arc<dyn Outbox>,
    paystack_secret_key: Option<String>,
    flutterwave_webhook_hash: Option<String>,
}

impl CheckoutService {
    pub fn new(
        db_client: Arc<DBClient>,
        payments: Arc<PaymentProviderService>,
        outbox: Arc<dyn Outbox>,
        paystack_secret_key: Option<String>,
        flutterwave_webhook_hash: Option<String>,
    ) -> Self {
        Self {
            db_client,
            payments,
            outbox,
            paystack_secret_key,
            flutterwave_webhook_hash,
        }
    }

    pub async fn create_intent(
        &self,
        buyer: &User,
        gig_id: Uuid,
        gateway: PaymentGateway,
    ) -> Result<PaymentIntentResponseDto, ServiceError> {
        let gig = self
            .db_client
            .get_gig(gig_id)
            .await?
            .ok_or(ServiceError::GigNotFound(gig_id))?;

        if gig.user_id == buyer.id {
            return Err(ServiceError::OwnGigPurchase);
        }

        let (amount, currency) = self
            .payments
            .quote(gig.price, buyer.country.as_deref(), gateway)
            .await;

        let request = CheckoutRequest {
            email: buyer.email.clone(),
            amount,
            currency: currency.clone(),
            reference: generate_reference(gateway),
            title: gig.title.clone(),
            metadata: serde_json::json!({
                "gig_id": gig.id,
                "buyer_id": buyer.id,
                "seller_id": gig.user_id,
            }),
        };

        let session = self.payments.create_checkout(gateway, &request).await?;

        tracing::info!(
            "{} intent {} created for gig {} by {}",
            gateway.to_str(),
            session.reference,
            gig.id,
            buyer.id
        );

        Ok(PaymentIntentResponseDto {
            status: "success".to_string(),
            payment_url: session.payment_url,
            reference: session.reference,
            amount,
            currency,
        })
    }

    pub async fn handle_paystack_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<Option<Order>, ServiceError> {
        let secret = self.paystack_secret_key.as_deref().unwrap_or_default();
        let valid = match signature {
            Some(signature) if !secret.is_empty() => {
                verify_paystack_signature(raw_body, signature, secret)
            }
            _ => false,
        };
        if !valid {
            tracing::warn!("Rejected Paystack webhook with invalid signature");
            return Err(ServiceError::InvalidSignature);
        }

        match parse_paystack_event(raw_body)? {
            Some(charge) => self.reconcile(PaymentGateway::Paystack, charge).await,
            None => Ok(None),
        }
    }

    pub async fn handle_flutterwave_webhook(
        &self,
        raw_body: &[u8],
        hash: Option<&str>,
    ) -> Result<Option<Order>, ServiceError> {
        let expected = self.flutterwave_webhook_hash.as_deref().unwrap_or_default();
        let valid = match hash {
            Some(hash) if !expected.is_empty() => verify_flutterwave_hash(hash, expected),
            _ => false,
        };
        if !valid {
            tracing::warn!("Rejected Flutterwave webhook with invalid verif-hash");
            return Err(ServiceError::InvalidSignature);
        }

        let transaction_id = match parse_flutterwave_event(raw_body)? {
            Some(id) => id,
            None => return Ok(None),
        };

        // The webhook body is not trusted for amounts or metadata.
        let verified = self.payments.flutterwave_verify_transaction(transaction_id).await?;
        if verified.status != "successful" {
            tracing::warn!(
                "Flutterwave transaction {} verified as {}",
                transaction_id,
                verified.status
            );
            return Ok(None);
        }

        let charge = ReportedCharge {
            reference: verified.tx_ref,
            amount: verified.amount,
            currency: verified.currency,
            metadata: parse_metadata(&verified.meta)?,
        };
        self.reconcile(PaymentGateway::Flutterwave, charge).await
    }

    /// Records the order once per reference. Duplicate deliveries return `None`.
    pub async fn reconcile(
        &self,
        gateway: PaymentGateway,
        charge: ReportedCharge,
    ) -> Result<Option<Order>, ServiceError> {
        let gig_id = charge.metadata.gig_id;
        let gig = self
            .db_client
            .get_gig(gig_id)
            .await?
            .ok_or(ServiceError::GigNotFound(gig_id))?;

        let confirmed = ConfirmedCharge {
            gateway,
            reference: charge.reference,
            gig_id: gig.id,
            buyer_id: charge.metadata.buyer_id,
            seller_id: gig.user_id,
            amount: charge.amount,
            currency: charge.currency,
        };

        let order = self
            .db_client
            .record_order(&confirmed, &gig.title, Some(gig.cover.as_str()))
            .await?;

        let order = match order {
            Some(order) => order,
            None => {
                tracing::info!("Duplicate webhook for reference {}", confirmed.reference);
                return Ok(None);
            }
        };

        tracing::info!(
            "Order {} recorded for gig {} (reference {})",
            order.id,
            gig.id,
            order.payment_intent
        );

        match self.db_client.get_user(Some(order.buyer_id), None, None).await {
            Ok(Some(buyer)) => self.outbox.enqueue(EmailJob::OrderReceipt {
                email: buyer.email,
                username: buyer.username,
                gig_title: order.title.clone(),
                amount: order.price,
                currency: order.currency.clone(),
                reference: order.payment_intent.clone(),
                gateway,
            }),
            Ok(None) => tracing::warn!("Buyer {} no longer exists, no receipt sent", order.buyer_id),
            Err(e) => tracing::error!("Could not load buyer for receipt: {}", e),
        }

        Ok(Some(order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_json(gig_id: Uuid, buyer_id: Uuid) -> Value {
        serde_json::json!({ "gig_id": gig_id, "buyer_id": buyer_id, "seller_id": Uuid::new_v4() })
    }

    #[test]
    fn test_parse_paystack_charge_success() {
        let gig_id = Uuid::new_v4();
        let buyer_id = Uuid::new_v4();
        let body = serde_json::json!({
            "event": "charge.success",
            "data": {
                "reference": "GH-PS-1",
                "amount": 1_500_050,
                "currency": "NGN",
                "metadata": metadata_json(gig_id, buyer_id),
            }
        });

        let charge = parse_paystack_event(body.to_string().as_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(charge.reference, "GH-PS-1");
        assert_eq!(charge.amount, 15_000.5);
        assert_eq!(charge.metadata, ChargeMetadata { gig_id, buyer_id });
    }

    #[test]
    fn test_paystack_other_events_are_ignored() {
        let body = br#"{"event":"transfer.success","data":{}}"#;
        assert_eq!(parse_paystack_event(body).unwrap(), None);
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            parse_paystack_event(b"not json"),
            Err(ServiceError::MalformedPayload(_))
        ));

        let missing_meta = br#"{"event":"charge.success","data":{"reference":"r","amount":100}}"#;
        assert!(matches!(
            parse_paystack_event(missing_meta),
            Err(ServiceError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_parse_flutterwave_event() {
        let ok = br#"{"event":"charge.completed","data":{"id":4242,"status":"successful"}}"#;
        assert_eq!(parse_flutterwave_event(ok).unwrap(), Some(4242));

        let failed = br#"{"event":"charge.completed","data":{"id":4242,"status":"failed"}}"#;
        assert_eq!(parse_flutterwave_event(failed).unwrap(), None);

        let no_id = br#"{"event":"charge.completed","data":{"status":"successful"}}"#;
        assert!(parse_flutterwave_event(no_id).is_err());
    }
}
