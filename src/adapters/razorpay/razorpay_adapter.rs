//! Razorpay payment gateway adapter.
//!
//! Implements the `PaymentGateway` port over the Razorpay REST API.
//!
//! # Error mapping
//!
//! - connect errors, timeouts, 5xx and 429 -> `Unavailable` (retryable)
//! - any other non-success status -> `Rejected`, carrying Razorpay's
//!   `error.code` and `error.description`
//!
//! # Configuration
//!
//! ```ignore
//! let gateway = RazorpayGateway::new(&config.gateway)?;
//! ```

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::config::GatewayConfig;
use crate::domain::billing::{PaymentType, WebhookSignatureVerifier};
use crate::domain::foundation::PlanId;
use crate::ports::{
    CreateGatewaySubscriptionRequest, CreateOrderRequest, GatewayCustomer, GatewayError,
    GatewayErrorKind, GatewayOrder, GatewaySubscription, OwnerProfile, PaymentGateway,
    PlanMapping,
};

use super::wire_types::{CancelBody, CustomerBody, ErrorEnvelope, OrderBody, SubscriptionBody};

/// Razorpay gateway client.
pub struct RazorpayGateway {
    key_id: SecretString,
    key_secret: SecretString,
    api_base_url: String,
    http_client: reqwest::Client,
    plans: PlanMapping,
    verifier: WebhookSignatureVerifier,
}

impl RazorpayGateway {
    /// Builds a client from gateway configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GatewayError::unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http_client,
            plans: config.plan_mapping(),
            verifier: WebhookSignatureVerifier::new(config.webhook_secret.clone()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(
            self.key_id.expose_secret(),
            Some(self.key_secret.expose_secret()),
        )
    }

    /// Sends a request and decodes a success body.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        if !response.status().is_success() {
            return Err(status_error(operation, response).await);
        }

        response.json().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Razorpay returned an unreadable body");
            GatewayError::unavailable(format!("Failed to parse Razorpay response: {}", e))
        })
    }

    /// Fetches a customer by id; `None` when Razorpay has no such customer.
    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<GatewayCustomer>, GatewayError> {
        let response = self
            .authorized(self.http_client.get(self.url(&format!("/customers/{}", customer_id))))
            .send()
            .await
            .map_err(|e| transport_error("fetch_customer", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error("fetch_customer", response).await);
        }

        let customer = response.json().await.map_err(|e| {
            GatewayError::unavailable(format!("Failed to parse Razorpay response: {}", e))
        })?;
        Ok(Some(customer))
    }

    async fn create_customer(&self, owner: &OwnerProfile) -> Result<GatewayCustomer, GatewayError> {
        let body = CustomerBody {
            name: &owner.name,
            email: &owner.email,
            contact: owner.phone.as_deref(),
            fail_existing: "0",
        };
        self.send(
            "create_customer",
            self.http_client.post(self.url("/customers")).json(&body),
        )
        .await
    }
}

fn transport_error(operation: &'static str, err: reqwest::Error) -> GatewayError {
    let reason = if err.is_timeout() { "timed out" } else { "failed" };
    tracing::error!(operation, error = %err, "Razorpay request {}", reason);
    GatewayError::unavailable(format!("Razorpay {} {}: {}", operation, reason, err))
}

async fn status_error(operation: &'static str, response: reqwest::Response) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let (provider_code, description) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (envelope.error.code, envelope.error.description),
        Err(_) => (None, None),
    };
    let message = description.unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), body));

    tracing::error!(
        operation,
        status = status.as_u16(),
        provider_code = provider_code.as_deref().unwrap_or(""),
        error = %message,
        "Razorpay request failed"
    );

    let kind = if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        GatewayErrorKind::Unavailable
    } else {
        GatewayErrorKind::Rejected
    };

    let error = GatewayError::new(kind, message);
    match provider_code {
        Some(code) => error.with_provider_code(code),
        None => error,
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let body = OrderBody {
            amount: request.amount,
            currency: &request.currency,
            receipt: &request.receipt,
        };
        let order: GatewayOrder = self
            .send("create_order", self.http_client.post(self.url("/orders")).json(&body))
            .await?;

        tracing::info!(order_id = %order.id, amount = order.amount, "Razorpay order created");
        Ok(order)
    }

    async fn get_or_create_customer(
        &self,
        owner: &OwnerProfile,
    ) -> Result<GatewayCustomer, GatewayError> {
        if let Some(customer_id) = owner.gateway_customer_id.as_deref() {
            match self.fetch_customer(customer_id).await {
                Ok(Some(customer)) => return Ok(customer),
                Ok(None) => {
                    tracing::warn!(owner_id = %owner.owner_id, customer_id, "linked customer missing, creating a new one");
                }
                Err(err) if err.kind == GatewayErrorKind::Rejected => {
                    tracing::warn!(owner_id = %owner.owner_id, customer_id, error = %err, "linked customer rejected, creating a new one");
                }
                Err(err) => return Err(err),
            }
        }

        self.create_customer(owner).await
    }

    fn resolve_plan(
        &self,
        plan_id: &PlanId,
        payment_type: PaymentType,
    ) -> Result<String, GatewayError> {
        self.plans.resolve(plan_id, payment_type)
    }

    async fn create_subscription(
        &self,
        request: CreateGatewaySubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError> {
        let body = SubscriptionBody {
            plan_id: &request.gateway_plan_id,
            customer_id: &request.customer_id,
            total_count: request.total_count,
            customer_notify: u8::from(request.notify_customer),
        };
        let subscription: GatewaySubscription = self
            .send(
                "create_subscription",
                self.http_client.post(self.url("/subscriptions")).json(&body),
            )
            .await?;

        tracing::info!(
            gateway_subscription_id = %subscription.id,
            gateway_plan_id = %request.gateway_plan_id,
            "Razorpay subscription created"
        );
        Ok(subscription)
    }

    async fn cancel_subscription(&self, gateway_subscription_id: &str) -> Result<(), GatewayError> {
        let url = self.url(&format!("/subscriptions/{}/cancel", gateway_subscription_id));
        let _cancelled: GatewaySubscription = self
            .send(
                "cancel_subscription",
                self.http_client
                    .post(url)
                    .json(&CancelBody { cancel_at_cycle_end: 0 }),
            )
            .await?;

        tracing::info!(gateway_subscription_id, "Razorpay subscription cancelled");
        Ok(())
    }

    fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        self.verifier.verify(payload, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::sign_for_test;
    use crate::ports::GatewayPlanIds;

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::new("rzp_test_key", "secret");
        config.plans.insert(
            "plan-003".to_string(),
            GatewayPlanIds {
                monthly: "plan_LgWB3F9fPBzPRV".to_string(),
                yearly: "plan_LgWB7dBSP7iUf7".to_string(),
            },
        );
        config
    }

    #[test]
    fn resolve_plan_uses_configured_table() {
        let gateway = RazorpayGateway::new(&config()).unwrap();
        let plan = PlanId::new("plan-003").unwrap();

        assert_eq!(
            gateway.resolve_plan(&plan, PaymentType::Monthly).unwrap(),
            "plan_LgWB3F9fPBzPRV"
        );
        let err = gateway
            .resolve_plan(&PlanId::new("plan-999").unwrap(), PaymentType::Monthly)
            .unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::UnknownPlan);
    }

    #[test]
    fn verify_signature_enforces_configured_secret() {
        let mut config = config();
        config.webhook_secret = Some(SecretString::new("whsec".to_string()));
        let gateway = RazorpayGateway::new(&config).unwrap();
        let body = br#"{"event":"payment.authorized"}"#;

        assert!(gateway.verify_signature(body, &sign_for_test("whsec", body)));
        assert!(!gateway.verify_signature(body, &sign_for_test("other", body)));
    }

    #[test]
    fn verify_signature_fails_open_without_secret() {
        let gateway = RazorpayGateway::new(&config()).unwrap();
        assert!(gateway.verify_signature(b"{}", "not-even-hex"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let mut config = config();
        config.api_base_url = "http://localhost:9999/v1/".to_string();
        let gateway = RazorpayGateway::new(&config).unwrap();
        assert_eq!(gateway.url("/orders"), "http://localhost:9999/v1/orders");
    }
}
