//! Mock payment gateway for testing.
//!
//! Provides a configurable implementation of `PaymentGateway` for unit and
//! integration tests. Supports:
//! - Known customers and a plan table
//! - Error injection, per method or for the next call
//! - Artificial latency for timeout tests
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::billing::{PaymentType, WebhookSignatureVerifier};
use crate::domain::foundation::PlanId;
use crate::ports::{
    CreateGatewaySubscriptionRequest, CreateOrderRequest, GatewayCustomer, GatewayError,
    GatewayOrder, GatewaySubscription, OwnerProfile, PaymentGateway, PlanMapping,
};

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentGateway::new().with_plans(mapping);
///
/// mock.set_method_error("create_order", GatewayError::unavailable("down"));
///
/// assert!(!mock.was_called("create_subscription"));
/// ```
#[derive(Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Customers known to the "gateway" by id.
    customers: HashMap<String, GatewayCustomer>,

    /// Gateway subscription ids that were cancelled.
    cancelled: Vec<String>,

    plans: PlanMapping,

    /// `None` accepts every signature.
    verifier: Option<WebhookSignatureVerifier>,

    /// Error to return on next call.
    next_error: Option<GatewayError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, GatewayError>,

    /// Delay applied before each async call returns.
    delay: Option<Duration>,

    call_log: Vec<MethodCall>,

    sequence: u32,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Use this plan table for `resolve_plan`.
    pub fn with_plans(self, plans: PlanMapping) -> Self {
        self.inner.lock().unwrap().plans = plans;
        self
    }

    /// Verify webhook signatures against this secret.
    pub fn with_webhook_secret(self, secret: &str) -> Self {
        self.inner.lock().unwrap().verifier = Some(WebhookSignatureVerifier::new(Some(
            SecretString::new(secret.to_string()),
        )));
        self
    }

    /// Add a customer to the "gateway".
    pub fn add_customer(&self, customer_id: &str) {
        self.inner.lock().unwrap().customers.insert(
            customer_id.to_string(),
            GatewayCustomer {
                id: customer_id.to_string(),
            },
        );
    }

    /// Set an error to return on the next call to any async method.
    pub fn set_error(&self, error: GatewayError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    /// Delay every async call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().delay = Some(delay);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Arguments of the most recent call to a method.
    pub fn last_args(&self, method: &str) -> Option<Vec<String>> {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .rev()
            .find(|c| c.method == method)
            .map(|c| c.args.clone())
    }

    /// Total number of async gateway calls made.
    pub fn total_calls(&self) -> usize {
        self.inner.lock().unwrap().call_log.len()
    }

    /// Gateway subscription ids cancelled so far.
    pub fn cancelled(&self) -> Vec<String> {
        self.inner.lock().unwrap().cancelled.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    /// Records the call, applies latency and returns any injected error.
    async fn enter(&self, method: &str, args: Vec<String>) -> Result<(), GatewayError> {
        let delay = {
            let mut state = self.inner.lock().unwrap();
            state.call_log.push(MethodCall {
                method: method.to_string(),
                args,
            });
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.inner.lock().unwrap();
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.inner.lock().unwrap();
        state.sequence += 1;
        format!("{}_mock_{:04}", prefix, state.sequence)
    }
}

impl Clone for MockPaymentGateway {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError> {
        self.enter(
            "create_order",
            vec![
                request.amount.to_string(),
                request.currency.clone(),
                request.receipt.clone(),
            ],
        )
        .await?;

        Ok(GatewayOrder {
            id: self.next_id("order"),
            amount: request.amount,
            currency: request.currency,
            status: "created".to_string(),
        })
    }

    async fn get_or_create_customer(
        &self,
        owner: &OwnerProfile,
    ) -> Result<GatewayCustomer, GatewayError> {
        self.enter(
            "get_or_create_customer",
            vec![
                owner.owner_id.to_string(),
                owner.gateway_customer_id.clone().unwrap_or_default(),
            ],
        )
        .await?;

        if let Some(id) = owner.gateway_customer_id.as_deref() {
            if let Some(customer) = self.inner.lock().unwrap().customers.get(id) {
                return Ok(customer.clone());
            }
        }

        let customer = GatewayCustomer {
            id: self.next_id("cust"),
        };
        self.inner
            .lock()
            .unwrap()
            .customers
            .insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    fn resolve_plan(
        &self,
        plan_id: &PlanId,
        payment_type: PaymentType,
    ) -> Result<String, GatewayError> {
        self.inner.lock().unwrap().plans.resolve(plan_id, payment_type)
    }

    async fn create_subscription(
        &self,
        request: CreateGatewaySubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError> {
        self.enter(
            "create_subscription",
            vec![
                request.gateway_plan_id.clone(),
                request.customer_id.clone(),
                request.total_count.to_string(),
            ],
        )
        .await?;

        Ok(GatewaySubscription {
            id: self.next_id("sub"),
            status: "created".to_string(),
        })
    }

    async fn cancel_subscription(&self, gateway_subscription_id: &str) -> Result<(), GatewayError> {
        self.enter(
            "cancel_subscription",
            vec![gateway_subscription_id.to_string()],
        )
        .await?;

        self.inner
            .lock()
            .unwrap()
            .cancelled
            .push(gateway_subscription_id.to_string());
        Ok(())
    }

    fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        match &self.inner.lock().unwrap().verifier {
            Some(verifier) => verifier.verify(payload, signature),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::sign_for_test;
    use crate::domain::foundation::UserId;
    use crate::ports::GatewayErrorKind;

    fn owner(customer_id: Option<&str>) -> OwnerProfile {
        OwnerProfile {
            owner_id: UserId::new("user-1").unwrap(),
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
            gateway_customer_id: customer_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn records_calls_and_arguments() {
        let mock = MockPaymentGateway::new();
        mock.create_order(CreateOrderRequest {
            amount: 49_900,
            currency: "INR".to_string(),
            receipt: "sub-1".to_string(),
        })
        .await
        .unwrap();

        assert!(mock.was_called("create_order"));
        assert_eq!(
            mock.last_args("create_order").unwrap(),
            vec!["49900", "INR", "sub-1"]
        );
        assert_eq!(mock.total_calls(), 1);
    }

    #[tokio::test]
    async fn known_customer_is_reused() {
        let mock = MockPaymentGateway::new();
        mock.add_customer("cust_existing");

        let found = mock
            .get_or_create_customer(&owner(Some("cust_existing")))
            .await
            .unwrap();
        let created = mock.get_or_create_customer(&owner(None)).await.unwrap();

        assert_eq!(found.id, "cust_existing");
        assert_ne!(created.id, "cust_existing");
    }

    #[tokio::test]
    async fn method_error_persists_and_global_error_is_consumed() {
        let mock = MockPaymentGateway::new();
        mock.set_method_error("cancel_subscription", GatewayError::rejected("no"));
        mock.set_error(GatewayError::unavailable("blip"));

        let first = mock.create_subscription(CreateGatewaySubscriptionRequest {
            gateway_plan_id: "plan_x".to_string(),
            customer_id: "cust_1".to_string(),
            total_count: 12,
            notify_customer: true,
        });
        assert_eq!(first.await.unwrap_err().kind, GatewayErrorKind::Unavailable);

        for _ in 0..2 {
            let err = mock.cancel_subscription("sub_1").await.unwrap_err();
            assert_eq!(err.kind, GatewayErrorKind::Rejected);
        }

        mock.clear_errors();
        mock.cancel_subscription("sub_1").await.unwrap();
        assert_eq!(mock.cancelled(), vec!["sub_1"]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let mock = MockPaymentGateway::new();
        let clone = mock.clone();
        clone.cancel_subscription("sub_1").await.unwrap();
        assert_eq!(mock.call_count("cancel_subscription"), 1);
    }

    #[test]
    fn signature_checking_is_opt_in() {
        let open = MockPaymentGateway::new();
        assert!(open.verify_signature(b"{}", "anything"));

        let strict = MockPaymentGateway::new().with_webhook_secret("whsec");
        assert!(strict.verify_signature(b"{}", &sign_for_test("whsec", b"{}")));
        assert!(!strict.verify_signature(b"{}", "deadbeef"));
    }
}
