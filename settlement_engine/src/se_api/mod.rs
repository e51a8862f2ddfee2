pub mod ledger_api;
pub mod settlement_flow_api;
pub mod settlement_objects;
pub mod shipment_api;
