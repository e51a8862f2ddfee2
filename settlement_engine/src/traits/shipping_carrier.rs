use shiprocket_tools::{
    data_objects::{AwbAssignmentResponse, CarrierOrderRequest, CreateOrderResponse, PickupLocation},
    ShiprocketApi,
    ShiprocketApiError,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ShipmentError {
    #[error("No draft shipment (and so no pickup location) exists for seller {0}")]
    NoPickupLocation(String),
    #[error("Pickup location '{0}' is not registered with the carrier")]
    InvalidPickupLocation(String),
    #[error("Customer phone number '{0}' contains no usable digits")]
    InvalidPhoneNumber(String),
    #[error("Could not assign an AWB to carrier shipment {shipment_id}: {reason}")]
    AwbAssignmentFailed { shipment_id: i64, reason: String },
    #[error("Carrier API error: {0}")]
    CarrierApi(String),
}

impl From<ShiprocketApiError> for ShipmentError {
    fn from(e: ShiprocketApiError) -> Self {
        ShipmentError::CarrierApi(e.to_string())
    }
}

/// The slice of the carrier's REST API that shipment creation needs.
#[allow(async_fn_in_trait)]
pub trait ShippingCarrier {
    /// The pickup addresses registered on the carrier account.
    async fn pickup_locations(&self) -> Result<Vec<PickupLocation>, ShiprocketApiError>;

    /// Register an order with the carrier, creating a shipment shell that an AWB can be assigned
    /// to.
    async fn create_order(&self, order: &CarrierOrderRequest) -> Result<CreateOrderResponse, ShiprocketApiError>;

    /// Assign an AWB to the shipment. `courier_id` of `None` lets the carrier pick the courier.
    async fn assign_awb(
        &self,
        shipment_id: i64,
        courier_id: Option<i64>,
    ) -> Result<AwbAssignmentResponse, ShiprocketApiError>;
}

impl ShippingCarrier for ShiprocketApi {
    async fn pickup_locations(&self) -> Result<Vec<PickupLocation>, ShiprocketApiError> {
        ShiprocketApi::pickup_locations(self).await
    }

    async fn create_order(&self, order: &CarrierOrderRequest) -> Result<CreateOrderResponse, ShiprocketApiError> {
        ShiprocketApi::create_order(self, order).await
    }

    async fn assign_awb(
        &self,
        shipment_id: i64,
        courier_id: Option<i64>,
    ) -> Result<AwbAssignmentResponse, ShiprocketApiError> {
        ShiprocketApi::assign_awb(self, shipment_id, courier_id).await
    }
}
