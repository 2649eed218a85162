//! Razorpay payment gateway adapters.
//!
//! - `RazorpayGateway` - REST client implementing `PaymentGateway`
//! - `MockPaymentGateway` - Recording mock for tests and local runs

mod mock_gateway;
mod razorpay_adapter;
mod wire_types;

pub use mock_gateway::{MethodCall, MockPaymentGateway};
pub use razorpay_adapter::RazorpayGateway;
