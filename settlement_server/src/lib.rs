//! # Marketplace settlement server
//! This crate hosts the HTTP side of the settlement pipeline. It is responsible for:
//! Listening for incoming webhook events from the payment gateway.
//! Verifying HMAC signatures before anything else touches the payload.
//! Handing the verified events to the settlement engine and reporting the outcome.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config] for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/gateway/webhook`: The signed webhook route for payment gateway events.
//! * `/gateway/verify`: The checkout callback route for client-side payment verification.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod gateway_events;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
