//! Marketplace Settlement Engine
//!
//! This library contains the core logic for settling marketplace orders once the payment gateway
//! reports on them. It is transport-agnostic: the HTTP server is a thin layer on top of this crate.
//!
//! The library is divided into three main sections:
//! 1. Database management and control. Currently Sqlite is the supported backend. You should
//!    never need to access the database directly. Instead, use the public API provided by the
//!    engine. The exception is the data types used in the database. These are defined in the
//!    `db_types` module and are public.
//! 2. The engine public API. This provides the public-facing functionality of the settlement
//!    engine: the payment ledger, per-seller shipment creation, and the orchestration flow that
//!    ties a gateway event to payments, shipments, stock and cart state. Backends need to
//!    implement the traits in [`mod@traits`] in order to drive these APIs.
//! 3. A set of events that can be subscribed to. When a checkout batch settles, an
//!    `OrderSettledEvent` is emitted. A simple actor framework lets you hook into these events and
//!    perform custom actions, such as sending the confirmation email.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod se_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use se_api::{
    ledger_api::LedgerApi,
    settlement_flow_api::SettlementFlowApi,
    settlement_objects,
    shipment_api::ShipmentApi,
};
pub use traits::{SettlementDatabase, SettlementError, ShipmentError, ShippingCarrier, StatusTransition};
