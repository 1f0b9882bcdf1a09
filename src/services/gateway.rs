// SPDX-License-Identifier: MIT

//! Payment gateway client.
//!
//! Wraps the gateway's initialize / verify / refund REST API. Built with a
//! mock mode for tests and offline development: the mock returns canned
//! successes without touching the network.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

/// Checkout session returned by `initialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub reference: String,
}

/// Charge state returned by `verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeStatus {
    /// "success", "failed" or "pending"
    pub status: String,
    pub amount_cents: i64,
}

impl ChargeStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Deserialize)]
struct GatewayEnvelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Deserialize)]
struct VerifyData {
    status: String,
    amount: i64,
}

/// HTTP client for the payment gateway.
#[derive(Clone)]
pub struct PaymentGateway {
    secret_key: String,
    base_url: String,
    /// None in mock mode
    http: Option<reqwest::Client>,
}

impl PaymentGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Some(reqwest::Client::new()),
        }
    }

    /// Mock gateway: every charge succeeds, no network involved.
    pub fn new_mock() -> Self {
        Self {
            secret_key: "sk_test_mock".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: None,
        }
    }

    /// Start a checkout session for a charge.
    pub async fn initialize(
        &self,
        email: &str,
        amount_cents: i64,
        currency: &str,
        reference: &str,
    ) -> Result<CheckoutSession, AppError> {
        let Some(http) = &self.http else {
            return Ok(CheckoutSession {
                authorization_url: format!("https://checkout.test/{}", reference),
                reference: reference.to_string(),
            });
        };

        let body = serde_json::json!({
            "email": email,
            "amount": amount_cents,
            "currency": currency,
            "reference": reference,
        });

        let envelope: GatewayEnvelope<InitializeData> = http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        let data = envelope.data.filter(|_| envelope.status).ok_or_else(|| {
            AppError::Gateway(
                envelope
                    .message
                    .unwrap_or_else(|| "initialize rejected".to_string()),
            )
        })?;

        Ok(CheckoutSession {
            authorization_url: data.authorization_url,
            reference: data.reference,
        })
    }

    /// Verify a charge by reference.
    pub async fn verify(&self, reference: &str) -> Result<ChargeStatus, AppError> {
        let Some(http) = &self.http else {
            return Ok(ChargeStatus {
                status: "success".to_string(),
                amount_cents: 0,
            });
        };

        let envelope: GatewayEnvelope<VerifyData> = http
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        let data = envelope.data.filter(|_| envelope.status).ok_or_else(|| {
            AppError::Gateway(
                envelope
                    .message
                    .unwrap_or_else(|| "verify rejected".to_string()),
            )
        })?;

        Ok(ChargeStatus {
            status: data.status,
            amount_cents: data.amount,
        })
    }

    /// Refund a charge (full or partial).
    pub async fn refund(&self, reference: &str, amount_cents: i64) -> Result<(), AppError> {
        let Some(http) = &self.http else {
            return Ok(());
        };

        let body = serde_json::json!({
            "transaction": reference,
            "amount": amount_cents,
        });

        let envelope: GatewayEnvelope<serde_json::Value> = http
            .post(format!("{}/refund", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        if !envelope.status {
            return Err(AppError::Gateway(
                envelope
                    .message
                    .unwrap_or_else(|| "refund rejected".to_string()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_initialize() {
        let gateway = PaymentGateway::new_mock();
        let session = gateway
            .initialize("user@test.com", 999, "USD", "fs-ref-1")
            .await
            .unwrap();
        assert_eq!(session.reference, "fs-ref-1");
        assert!(session.authorization_url.contains("fs-ref-1"));
    }

    #[tokio::test]
    async fn test_mock_verify_succeeds() {
        let gateway = PaymentGateway::new_mock();
        let status = gateway.verify("fs-ref-1").await.unwrap();
        assert!(status.is_success());
    }

    #[tokio::test]
    async fn test_mock_refund_succeeds() {
        let gateway = PaymentGateway::new_mock();
        assert!(gateway.refund("fs-ref-1", 999).await.is_ok());
    }
}
