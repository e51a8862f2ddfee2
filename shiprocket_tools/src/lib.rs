mod api;
mod config;
mod error;

pub mod data_objects;
pub mod helpers;

pub use api::ShiprocketApi;
pub use config::ShiprocketConfig;
pub use data_objects::{
    AwbAssignmentResponse,
    CarrierOrderItem,
    CarrierOrderRequest,
    CourierId,
    CreateOrderResponse,
    PickupLocation,
};
pub use error::ShiprocketApiError;
