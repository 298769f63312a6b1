// service/payment_provider.rs
use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::error::ServiceError;
use crate::{
    config::Config,
    models::ordermodel::PaymentGateway,
    utils::currency::{charge_currency, convert_usd, to_minor_units},
};

const PAYSTACK_BASE_URL: &str = "https://api.paystack.co";
const FLUTTERWAVE_BASE_URL: &str = "https://api.flutterwave.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutRequest {
    pub email: String,
    /// Major units of `currency`.
    pub amount: f64,
    pub currency: String,
    pub reference: String,
    pub title: String,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutSession {
    pub payment_url: String,
    pub reference: String,
}

/// A gateway-side transaction as reported by Flutterwave's verify endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    pub status: String,
    pub tx_ref: String,
    pub amount: f64,
    pub currency: String,
    pub meta: Value,
}

#[derive(Debug, Deserialize)]
struct ExchangeRates {
    rates: std::collections::HashMap<String, f64>,
}

pub struct PaymentProviderService {
    client: reqwest::Client,
    paystack_secret_key: Option<String>,
    flutterwave_secret_key: Option<String>,
    exchange_rate_api_url: String,
    redirect_url: String,
}

impl PaymentProviderService {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            paystack_secret_key: config.paystack_secret_key.clone(),
            flutterwave_secret_key: config.flutterwave_secret_key.clone(),
            exchange_rate_api_url: config.exchange_rate_api_url.clone(),
            redirect_url: format!("{}/orders", config.app_url.trim_end_matches('/')),
        }
    }

    /// USD -> `currency` rate. Any failure yields `None`.
    pub async fn usd_rate(&self, currency: &str) -> Option<f64> {
        if currency == "USD" {
            return Some(1.0);
        }

        let response = match self.client.get(&self.exchange_rate_api_url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Exchange rate request failed: {}", e);
                return None;
            }
        };

        match response.json::<ExchangeRates>().await {
            Ok(body) => body.rates.get(currency).copied().filter(|rate| *rate > 0.0),
            Err(e) => {
                tracing::error!("Exchange rate response unreadable: {}", e);
                None
            }
        }
    }

    /// Price in the buyer's currency for `gateway`. Falls back to the USD
    /// price when no rate is available.
    pub async fn quote(
        &self,
        usd_price: f64,
        country: Option<&str>,
        gateway: PaymentGateway,
    ) -> (f64, String) {
        let currency = charge_currency(country, gateway.supported_currencies());
        match self.usd_rate(currency).await {
            Some(rate) => (convert_usd(usd_price, rate), currency.to_string()),
            None => {
                tracing::warn!("No USD->{} rate, charging in USD", currency);
                (convert_usd(usd_price, 1.0), "USD".to_string())
            }
        }
    }

    pub async fn create_checkout(
        &self,
        gateway: PaymentGateway,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        match gateway {
            PaymentGateway::Paystack => self.paystack_checkout(request).await,
            PaymentGateway::Flutterwave => self.flutterwave_checkout(request).await,
        }
    }

    async fn paystack_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, ServiceError> {
        let secret = self
            .paystack_secret_key
            .as_deref()
            .ok_or(ServiceError::GatewayNotConfigured("Paystack"))?;

        let payload = serde_json::json!({
            "email": request.email,
            "amount": to_minor_units(request.amount),
            "currency": request.currency,
            "reference": request.reference,
            "callback_url": self.redirect_url,
            "metadata": request.metadata,
        });

        let response_body: Value = self
            .client
            .post(format!("{}/transaction/initialize", PAYSTACK_BASE_URL))
            .bearer_auth(secret)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Paystack request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Paystack response unreadable: {}", e)))?;

        match response_body["data"]["authorization_url"].as_str() {
            Some(url) if response_body["status"].as_bool().unwrap_or(false) => Ok(CheckoutSession {
                payment_url: url.to_string(),
                reference: request.reference.clone(),
            }),
            _ => {
                tracing::error!("Paystack initialize failed: {}", response_body);
                Err(ServiceError::Gateway(
                    "Paystack did not return a checkout URL".to_string(),
                ))
            }
        }
    }

    async fn flutterwave_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let secret = self
            .flutterwave_secret_key
            .as_deref()
            .ok_or(ServiceError::GatewayNotConfigured("Flutterwave"))?;

        let payload = serde_json::json!({
            "tx_ref": request.reference,
            "amount": request.amount,
            "currency": request.currency,
            "redirect_url": self.redirect_url,
            "customer": { "email": request.email },
            "customizations": { "title": request.title },
            "meta": request.metadata,
        });

        let response_body: Value = self
            .client
            .post(format!("{}/v3/payments", FLUTTERWAVE_BASE_URL))
            .bearer_auth(secret)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Flutterwave request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Flutterwave response unreadable: {}", e)))?;

        match response_body["data"]["link"].as_str() {
            Some(link) if response_body["status"].as_str() == Some("success") => {
                Ok(CheckoutSession {
                    payment_url: link.to_string(),
                    reference: request.reference.clone(),
                })
            }
            _ => {
                tracing::error!("Flutterwave payment init failed: {}", response_body);
                Err(ServiceError::Gateway(
                    "Flutterwave did not return a payment link".to_string(),
                ))
            }
        }
    }

    pub async fn flutterwave_verify_transaction(
        &self,
        transaction_id: i64,
    ) -> Result<VerifiedTransaction, ServiceError> {
        let secret = self
            .flutterwave_secret_key
            .as_deref()
            .ok_or(ServiceError::GatewayNotConfigured("Flutterwave"))?;

        let response_body: Value = self
            .client
            .get(format!(
                "{}/v3/transactions/{}/verify",
                FLUTTERWAVE_BASE_URL, transaction_id
            ))
            .bearer_auth(secret)
            .send()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Flutterwave verify failed: {}", e)))?
            .json()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Flutterwave verify unreadable: {}", e)))?;

        if response_body["status"].as_str() != Some("success") {
            return Err(ServiceError::Gateway(format!(
                "Flutterwave could not verify transaction {}",
                transaction_id
            )));
        }

        let data = &response_body["data"];
        Ok(VerifiedTransaction {
            status: data["status"].as_str().unwrap_or_default().to_string(),
            tx_ref: data["tx_ref"].as_str().unwrap_or_default().to_string(),
            amount: data["amount"].as_f64().unwrap_or_default(),
            currency: data["currency"].as_str().unwrap_or("USD").to_string(),
            meta: data["meta"].clone(),
        })
    }
}

impl PaymentGateway {
    pub fn supported_currencies(&self) -> &'static [&'static str] {
        match self {
            PaymentGateway::Paystack => crate::utils::currency::PAYSTACK_CURRENCIES,
            PaymentGateway::Flutterwave => crate::utils::currency::FLUTTERWAVE_CURRENCIES,
        }
    }
}

pub fn generate_reference(gateway: PaymentGateway) -> String {
    let prefix = match gateway {
        PaymentGateway::Paystack => "GH-PS",
        PaymentGateway::Flutterwave => "GH-FW",
    };
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// HMAC-SHA512 of the raw request body, hex encoded, compared in constant time.
pub fn verify_paystack_signature(raw_body: &[u8], signature: &str, secret: &str) -> bool {
    let mut mac = match Hmac::<Sha512>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(raw_body);
    let expected = hex::encode(mac.finalize().into_bytes());

    ConstantTimeEq::ct_eq(signature.trim().as_bytes(), expected.as_bytes()).into()
}

pub fn verify_flutterwave_hash(header: &str, expected: &str) -> bool {
    ConstantTimeEq::ct_eq(header.trim().as_bytes(), expected.as_bytes()).into()
}
