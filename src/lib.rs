//! Collectdex - Billing and subscription backend for the card collection tracker
//!
//! This crate receives signed billing-provider webhooks, reconciles them into
//! one authoritative subscription record per user, and exposes the record the
//! rest of the application uses to gate premium features.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
