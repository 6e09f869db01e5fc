//! Outbound notification delivery.

pub mod webhook;

pub use webhook::WebhookClient;
