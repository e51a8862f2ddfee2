use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
        Mutex,
    },
};

use mss_common::Money;
use settlement_engine::{
    db_types::{GatewayOrderId, NewDraftShipment, NewOrder, NewOrderItem, NewProductVariant},
    events::EventProducers,
    LedgerApi,
    SettlementFlowApi,
    ShipmentApi,
    ShippingCarrier,
    SqliteDatabase,
};
use shiprocket_tools::{
    data_objects::{
        AwbAssignmentResponse,
        AwbData,
        CarrierOrderRequest,
        CourierId,
        CreateOrderResponse,
        PickupLocation,
    },
    ShiprocketApiError,
};

pub fn init_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
}

/// An in-memory database. The pool is capped at one connection, since every new connection to
/// `sqlite::memory:` would otherwise open its own empty database.
pub async fn memory_db() -> SqliteDatabase {
    SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating database")
}

pub fn flow_api(db: SqliteDatabase, carrier: FakeCarrier) -> SettlementFlowApi<SqliteDatabase, FakeCarrier> {
    flow_api_with_producers(db, carrier, EventProducers::default())
}

pub fn flow_api_with_producers(
    db: SqliteDatabase,
    carrier: FakeCarrier,
    producers: EventProducers,
) -> SettlementFlowApi<SqliteDatabase, FakeCarrier> {
    let ledger = LedgerApi::new(db.clone());
    let shipments = ShipmentApi::new(carrier);
    SettlementFlowApi::new(db, ledger, shipments, producers)
}

//--------------------------------------    FakeCarrier      ---------------------------------------------------------

/// In-process stand-in for the carrier API. Clones share state, so tests can hold one copy and
/// hand another to the api under test.
#[derive(Clone, Default)]
pub struct FakeCarrier {
    state: Arc<CarrierState>,
}

#[derive(Default)]
struct CarrierState {
    pickups: Vec<String>,
    failing_couriers: HashSet<i64>,
    fail_auto: bool,
    suggested_courier: Option<i64>,
    next_shipment_id: AtomicI64,
    assignments: Mutex<Vec<Option<i64>>>,
    orders: Mutex<Vec<CarrierOrderRequest>>,
}

impl FakeCarrier {
    pub fn new(pickups: &[&str]) -> Self {
        let state = CarrierState {
            pickups: pickups.iter().map(|s| s.to_string()).collect(),
            next_shipment_id: AtomicI64::new(5000),
            ..CarrierState::default()
        };
        Self { state: Arc::new(state) }
    }

    fn state_mut(&mut self) -> &mut CarrierState {
        Arc::get_mut(&mut self.state).expect("FakeCarrier must be configured before it is shared")
    }

    /// AWB assignment with this courier id will come back without an AWB code.
    pub fn with_failing_courier(mut self, courier_id: i64) -> Self {
        self.state_mut().failing_couriers.insert(courier_id);
        self
    }

    /// Courier auto-selection (no courier id) will also fail.
    pub fn with_auto_assign_failure(mut self) -> Self {
        self.state_mut().fail_auto = true;
        self
    }

    /// Order creation responses will name this courier as the carrier's suggestion.
    pub fn with_suggested_courier(mut self, courier_id: i64) -> Self {
        self.state_mut().suggested_courier = Some(courier_id);
        self
    }

    /// Every courier id tried so far, in order. `None` is an auto-assignment attempt.
    pub fn assignment_attempts(&self) -> Vec<Option<i64>> {
        self.state.assignments.lock().unwrap().clone()
    }

    pub fn booked_orders(&self) -> Vec<CarrierOrderRequest> {
        self.state.orders.lock().unwrap().clone()
    }
}

impl ShippingCarrier for FakeCarrier {
    async fn pickup_locations(&self) -> Result<Vec<PickupLocation>, ShiprocketApiError> {
        let locations = self
            .state
            .pickups
            .iter()
            .map(|p| PickupLocation { pickup_location: p.clone(), id: None, address: None, city: None, state: None })
            .collect();
        Ok(locations)
    }

    async fn create_order(&self, order: &CarrierOrderRequest) -> Result<CreateOrderResponse, ShiprocketApiError> {
        self.state.orders.lock().unwrap().push(order.clone());
        let shipment_id = self.state.next_shipment_id.fetch_add(1, Ordering::SeqCst);
        Ok(CreateOrderResponse {
            order_id: shipment_id + 4000,
            shipment_id,
            status: Some("NEW".to_string()),
            status_code: Some(1),
            awb_code: None,
            courier_company_id: self.state.suggested_courier.map(CourierId::Numeric),
            courier_name: None,
        })
    }

    async fn assign_awb(
        &self,
        shipment_id: i64,
        courier_id: Option<i64>,
    ) -> Result<AwbAssignmentResponse, ShiprocketApiError> {
        self.state.assignments.lock().unwrap().push(courier_id);
        let fails = match courier_id {
            Some(id) => self.state.failing_couriers.contains(&id),
            None => self.state.fail_auto,
        };
        if fails {
            return Ok(AwbAssignmentResponse::Flat(AwbData::default()));
        }
        Ok(AwbAssignmentResponse::Flat(AwbData {
            awb_code: Some(format!("AWB{shipment_id}")),
            courier_company_id: courier_id.map(CourierId::Numeric),
            courier_name: Some("Fake Express".to_string()),
            shipment_id: Some(shipment_id),
        }))
    }
}

//--------------------------------------     Seeding         ---------------------------------------------------------

pub struct SellerSpec<'a> {
    pub seller_id: &'a str,
    pub pickup: &'a str,
    pub courier: Option<i64>,
    /// Unit price in paise.
    pub unit_price: i64,
    pub quantity: i64,
}

pub struct SeededSeller {
    pub variant_id: i64,
    pub item_id: i64,
    pub draft_id: i64,
}

/// Seeds one order under `gateway_ref` with one item and one draft shipment per seller. Every
/// variant starts with a stock of 10.
pub async fn seed_order(db: &SqliteDatabase, gateway_ref: &str, sellers: &[SellerSpec<'_>]) -> (i64, Vec<SeededSeller>) {
    let total: i64 = sellers.iter().map(|s| s.unit_price * s.quantity).sum();
    let mut order =
        NewOrder::new(GatewayOrderId::from(gateway_ref.to_string()), "Asha Kumar".to_string(), Money::from(total));
    order.customer_email = "asha@example.com".to_string();
    order.customer_phone = "+91 98765 43210".to_string();
    order.shipping_address = "14 MG Road".to_string();
    order.shipping_city = "Bengaluru".to_string();
    order.shipping_state = "Karnataka".to_string();
    order.shipping_pincode = "560001".to_string();
    let order_id = db.insert_order(order).await.expect("Error inserting order");

    let mut seeded = Vec::with_capacity(sellers.len());
    for (n, seller) in sellers.iter().enumerate() {
        let variant = NewProductVariant {
            sku: format!("SKU-{order_id}-{n}"),
            product_name: format!("Product {n} from {}", seller.seller_id),
            seller_id: Some(seller.seller_id.to_string()),
            seller_name: Some(format!("{} Pvt Ltd", seller.seller_id)),
            unit_weight_kg: None,
            stock_quantity: 10,
        };
        let variant_id = db.insert_product_variant(variant).await.expect("Error inserting variant");

        let draft = NewDraftShipment {
            order_id,
            seller_id: Some(seller.seller_id.to_string()),
            pickup_location: seller.pickup.to_string(),
            courier_id: seller.courier,
            courier_name: seller.courier.map(|c| format!("Courier {c}")),
            shipping_charge: Money::default(),
        };
        let draft_id = db.insert_draft_shipment(draft).await.expect("Error inserting draft shipment");

        let mut item = NewOrderItem::new(order_id, variant_id, seller.quantity, Money::from(seller.unit_price));
        item.product_name = format!("Product {n} from {}", seller.seller_id);
        item.sku = format!("SKU-{order_id}-{n}");
        item.seller_id = Some(seller.seller_id.to_string());
        item.seller_name = Some(format!("{} Pvt Ltd", seller.seller_id));
        item.draft_shipment_id = Some(draft_id);
        let item_id = db.insert_order_item(item).await.expect("Error inserting order item");

        seeded.push(SeededSeller { variant_id, item_id, draft_id });
    }
    (order_id, seeded)
}
