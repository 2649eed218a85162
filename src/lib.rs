//! Subscription Billing - Payment and Subscription Lifecycle Engine
//!
//! This crate stores payment cards, runs subscriptions against a card
//! payment gateway (Razorpay), and reconciles gateway webhooks into the
//! local subscription ledger.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
