//! The traits that define the settlement engine's seams.
//!
//! The backend traits abstract the underlying database and the shipping carrier away from the
//! settlement logic, so that the flows in [`crate::SettlementFlowApi`] can be exercised against
//! mocks and the storage layer can be swapped without touching them.
//!
//! [`SettlementDatabase`] is the complete set of storage operations settlement needs, and is
//! implemented by [`crate::SqliteDatabase`]. [`ShippingCarrier`] is the slice of the carrier's
//! REST surface that shipment creation uses, implemented by `shiprocket_tools::ShiprocketApi`.

mod settlement_database;
mod shipping_carrier;

pub use settlement_database::{SettlementDatabase, SettlementError, StatusTransition};
pub use shipping_carrier::{ShipmentError, ShippingCarrier};
