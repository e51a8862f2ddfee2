use mockall::mock;
use settlement_engine::{
    db_types::{
        DraftShipment,
        GatewayOrderId,
        NewAllocation,
        NewPaymentRecord,
        NewShipment,
        Order,
        OrderItemDetail,
        PaymentRecord,
        PaymentStatus,
        Shipment,
    },
    traits::{SettlementDatabase, SettlementError, ShippingCarrier, StatusTransition},
};
use shiprocket_tools::{
    data_objects::{AwbAssignmentResponse, CarrierOrderRequest, CreateOrderResponse, PickupLocation},
    ShiprocketApiError,
};

mock! {
    pub SettlementDb {}
    impl SettlementDatabase for SettlementDb {
        fn url(&self) -> &str;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, SettlementError>;
        async fn fetch_orders_by_gateway_ref(&self, gateway_order_id: &GatewayOrderId) -> Result<Vec<Order>, SettlementError>;
        async fn fetch_items_for_order(&self, order_id: i64) -> Result<Vec<OrderItemDetail>, SettlementError>;
        async fn update_payment_status(&self, order_id: i64, status: PaymentStatus) -> Result<StatusTransition, SettlementError>;
        async fn upsert_payment(&self, payment: NewPaymentRecord) -> Result<PaymentRecord, SettlementError>;
        async fn upsert_allocation(&self, allocation: NewAllocation) -> Result<(), SettlementError>;
        async fn fetch_payment_for_order(&self, order_id: i64, gateway_order_id: &GatewayOrderId) -> Result<Option<PaymentRecord>, SettlementError>;
        async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<PaymentRecord>, SettlementError>;
        async fn insert_refund_payment(&self, refund: NewPaymentRecord) -> Result<PaymentRecord, SettlementError>;
        async fn fetch_draft_shipments(&self, ids: &[i64]) -> Result<Vec<DraftShipment>, SettlementError>;
        async fn create_shipment(&self, shipment: NewShipment) -> Result<Shipment, SettlementError>;
        async fn attach_items_to_shipment(&self, item_ids: &[i64], shipment_id: i64) -> Result<(), SettlementError>;
        async fn delete_draft_shipments(&self, ids: &[i64]) -> Result<(), SettlementError>;
        async fn decrement_stock(&self, variant_id: i64, quantity: i64) -> Result<(), SettlementError>;
        async fn delete_cart(&self, cart_id: &str) -> Result<(), SettlementError>;
    }
}

mock! {
    pub Carrier {}
    impl ShippingCarrier for Carrier {
        async fn pickup_locations(&self) -> Result<Vec<PickupLocation>, ShiprocketApiError>;
        async fn create_order(&self, order: &CarrierOrderRequest) -> Result<CreateOrderResponse, ShiprocketApiError>;
        async fn assign_awb(&self, shipment_id: i64, courier_id: Option<i64>) -> Result<AwbAssignmentResponse, ShiprocketApiError>;
    }
}
