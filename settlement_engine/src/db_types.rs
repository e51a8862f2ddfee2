use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use mss_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   GatewayOrderId    ---------------------------------------------------------
/// The checkout reference assigned by the payment gateway. Several order records can share one
/// reference when a multi-seller cart is split into separate orders at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct GatewayOrderId(pub String);

impl FromStr for GatewayOrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for GatewayOrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for GatewayOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl GatewayOrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
/// The payment state of an order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// The order has been created but the gateway has not reported anything yet.
    Pending,
    /// The gateway has authorized the payment, but funds have not been captured.
    Authorized,
    /// Funds have been captured. Settlement treats this as final.
    Paid,
    /// The payment attempt failed.
    Failed,
    /// The payment was refunded following a dispute.
    Refunded,
}

impl PaymentStatus {
    /// Payment state never walks backwards. A replayed event that would repeat or undo a
    /// transition is a no-op; a later successful attempt may supersede a `Failed` one.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (*self, next) {
            (a, b) if a == b => false,
            (Refunded, _) => false,
            (Paid, Refunded) => true,
            (Paid, _) => false,
            (Failed, Authorized | Paid) => true,
            (Failed, _) => false,
            (Pending, _) | (Authorized, _) => true,
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Authorized => write!(f, "Authorized"),
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Authorized" => Ok(Self::Authorized),
            "Paid" => Ok(Self::Paid),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//------------------------------------  FulfillmentStatus    ---------------------------------------------------------
/// The fulfillment state of a single order item. Settlement only ever reads this; the courier
/// pickup flow owns the transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum FulfillmentStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentStatus::Pending => write!(f, "Pending"),
            FulfillmentStatus::Shipped => write!(f, "Shipped"),
            FulfillmentStatus::Delivered => write!(f, "Delivered"),
            FulfillmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for FulfillmentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid fulfillment status: {s}"))),
        }
    }
}

impl From<String> for FulfillmentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid fulfillment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            FulfillmentStatus::Pending
        })
    }
}

//------------------------------------ PaymentRecordStatus   ---------------------------------------------------------
/// The state of a row in the payment ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentRecordStatus {
    Authorized,
    Completed,
    Failed,
    Refunded,
}

impl Display for PaymentRecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentRecordStatus::Authorized => write!(f, "Authorized"),
            PaymentRecordStatus::Completed => write!(f, "Completed"),
            PaymentRecordStatus::Failed => write!(f, "Failed"),
            PaymentRecordStatus::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentRecordStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Authorized" => Ok(Self::Authorized),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment record status: {s}"))),
        }
    }
}

impl From<String> for PaymentRecordStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment record status: {value}. But this conversion cannot fail. Defaulting to Failed");
            PaymentRecordStatus::Failed
        })
    }
}

//--------------------------------------  ShipmentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ShipmentStatus {
    AwbAssigned,
    PickupScheduled,
    InTransit,
    Delivered,
    Cancelled,
}

impl Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShipmentStatus::AwbAssigned => write!(f, "AwbAssigned"),
            ShipmentStatus::PickupScheduled => write!(f, "PickupScheduled"),
            ShipmentStatus::InTransit => write!(f, "InTransit"),
            ShipmentStatus::Delivered => write!(f, "Delivered"),
            ShipmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for ShipmentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AwbAssigned" => Ok(Self::AwbAssigned),
            "PickupScheduled" => Ok(Self::PickupScheduled),
            "InTransit" => Ok(Self::InTransit),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid shipment status: {s}"))),
        }
    }
}

impl From<String> for ShipmentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid shipment status: {value}. But this conversion cannot fail. Defaulting to AwbAssigned");
            ShipmentStatus::AwbAssigned
        })
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
/// An order as stored, with the customer identity and shipping address snapshotted at checkout.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub gateway_order_id: GatewayOrderId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub shipping_address_2: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub shipping_country: String,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub gateway_order_id: GatewayOrderId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub shipping_address_2: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_pincode: String,
    pub shipping_country: String,
    pub total_amount: Money,
}

impl NewOrder {
    pub fn new(gateway_order_id: GatewayOrderId, customer_name: String, total_amount: Money) -> Self {
        Self {
            gateway_order_id,
            customer_name,
            customer_email: String::default(),
            customer_phone: String::default(),
            shipping_address: String::default(),
            shipping_address_2: String::default(),
            shipping_city: String::default(),
            shipping_state: String::default(),
            shipping_pincode: String::default(),
            shipping_country: "India".to_string(),
            total_amount,
        }
    }
}

//--------------------------------------   OrderItemDetail   ---------------------------------------------------------
/// An order item joined with its product variant, as the settlement flow consumes it. The
/// `variant_*` columns are the grouping fallback for items that never captured a direct seller
/// reference.
///
/// `price_at_purchase` is a unit price; `discount_at_purchase`, `gst_at_purchase` and
/// `shipping_charge` are line totals, all snapshotted at checkout.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItemDetail {
    pub id: i64,
    pub order_id: i64,
    pub variant_id: i64,
    pub product_name: String,
    pub sku: String,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub price_at_purchase: Money,
    pub discount_at_purchase: Money,
    pub gst_at_purchase: Money,
    pub shipping_charge: Money,
    pub seller_id: Option<String>,
    pub seller_name: Option<String>,
    pub fulfillment_status: FulfillmentStatus,
    pub shipment_id: Option<i64>,
    pub draft_shipment_id: Option<i64>,
    pub variant_seller_id: Option<String>,
    pub variant_seller_name: Option<String>,
    pub unit_weight_kg: Option<f64>,
}

impl OrderItemDetail {
    /// The seller this item belongs to: the direct reference wins, else the variant's seller.
    pub fn effective_seller_id(&self) -> Option<&str> {
        self.seller_id.as_deref().filter(|s| !s.is_empty()).or(self.variant_seller_id.as_deref())
    }

    pub fn effective_seller_name(&self) -> Option<&str> {
        self.seller_name.as_deref().filter(|s| !s.is_empty()).or(self.variant_seller_name.as_deref())
    }

    pub fn line_total(&self) -> Money {
        self.price_at_purchase * self.quantity
    }
}

//--------------------------------------    NewOrderItem     ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub variant_id: i64,
    pub product_name: String,
    pub sku: String,
    pub hsn_code: Option<String>,
    pub quantity: i64,
    pub price_at_purchase: Money,
    pub discount_at_purchase: Money,
    pub gst_at_purchase: Money,
    pub shipping_charge: Money,
    pub seller_id: Option<String>,
    pub seller_name: Option<String>,
    pub draft_shipment_id: Option<i64>,
}

impl NewOrderItem {
    pub fn new(order_id: i64, variant_id: i64, quantity: i64, price_at_purchase: Money) -> Self {
        Self {
            order_id,
            variant_id,
            product_name: String::default(),
            sku: String::default(),
            hsn_code: None,
            quantity,
            price_at_purchase,
            discount_at_purchase: Money::default(),
            gst_at_purchase: Money::default(),
            shipping_charge: Money::default(),
            seller_id: None,
            seller_name: None,
            draft_shipment_id: None,
        }
    }
}

//------------------------------------  NewProductVariant    ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewProductVariant {
    pub sku: String,
    pub product_name: String,
    pub seller_id: Option<String>,
    pub seller_name: Option<String>,
    pub unit_weight_kg: Option<f64>,
    pub stock_quantity: i64,
}

//--------------------------------------   PaymentRecord     ---------------------------------------------------------
/// A row in the payment ledger. At most one non-refund row exists per
/// `(order_id, gateway_order_id)`; refunds are appended as new rows and never mutate the original.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub order_id: i64,
    pub gateway_order_id: GatewayOrderId,
    pub gateway: String,
    pub transaction_id: String,
    pub amount: Money,
    pub status: PaymentRecordStatus,
    pub payment_method: Option<String>,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//------------------------------------  NewPaymentRecord     ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
    pub order_id: i64,
    pub gateway_order_id: GatewayOrderId,
    pub gateway: String,
    /// The gateway's payment id (or refund id for refund rows).
    pub transaction_id: String,
    pub amount: Money,
    pub status: PaymentRecordStatus,
    pub payment_method: Option<String>,
    pub payment_date: DateTime<Utc>,
}

impl NewPaymentRecord {
    pub fn new(order_id: i64, gateway_order_id: GatewayOrderId, transaction_id: String, amount: Money) -> Self {
        Self {
            order_id,
            gateway_order_id,
            gateway: "razorpay".to_string(),
            transaction_id,
            amount,
            status: PaymentRecordStatus::Completed,
            payment_method: None,
            payment_date: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: PaymentRecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_method(mut self, method: Option<&str>) -> Self {
        self.payment_method = method.map(|m| m.to_string());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.payment_date = date;
        self
    }
}

//--------------------------------------   AllocationId      ---------------------------------------------------------
/// The natural key of a per-item payment allocation. The composite format is the idempotency
/// mechanism: a replayed event recomputes the same id and upserts instead of duplicating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct AllocationId(String);

impl AllocationId {
    /// `{item_id}_{gateway_payment_id}` for a payment allocation.
    pub fn new(order_item_id: i64, gateway_payment_id: &str) -> Self {
        Self(format!("{order_item_id}_{gateway_payment_id}"))
    }

    /// `refund_{item_id}_{gateway_refund_id}` for a refund allocation.
    pub fn refund(order_item_id: i64, gateway_refund_id: &str) -> Self {
        Self(format!("refund_{order_item_id}_{gateway_refund_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AllocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------  NewAllocation      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewAllocation {
    pub id: AllocationId,
    pub payment_id: i64,
    pub order_item_id: i64,
    pub amount: Money,
    pub status: PaymentRecordStatus,
}

//--------------------------------------  ItemAllocation     ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ItemAllocation {
    pub id: AllocationId,
    pub payment_id: i64,
    pub order_item_id: i64,
    pub amount: Money,
    pub status: PaymentRecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------  DraftShipment      ---------------------------------------------------------
/// The checkout's provisional shipping selection for one seller's items. Consumed (deleted) when
/// the real shipment is created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DraftShipment {
    pub id: i64,
    pub order_id: i64,
    pub seller_id: Option<String>,
    pub pickup_location: String,
    pub courier_id: Option<i64>,
    pub courier_name: Option<String>,
    pub shipping_charge: Money,
    pub created_at: DateTime<Utc>,
}

//------------------------------------  NewDraftShipment     ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewDraftShipment {
    pub order_id: i64,
    pub seller_id: Option<String>,
    pub pickup_location: String,
    pub courier_id: Option<i64>,
    pub courier_name: Option<String>,
    pub shipping_charge: Money,
}

//--------------------------------------     Shipment        ---------------------------------------------------------
/// A shipment registered with the carrier. Exactly one per (order, seller group); the carrier
/// identifiers are immutable once written.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Shipment {
    pub id: i64,
    pub order_id: i64,
    pub seller_id: String,
    pub carrier_shipment_id: i64,
    pub carrier_order_id: i64,
    pub carrier_order_ref: String,
    pub awb_code: String,
    pub courier_id: Option<i64>,
    pub courier_name: Option<String>,
    pub pickup_location: String,
    pub status: ShipmentStatus,
    pub label_url: Option<String>,
    pub manifest_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    NewShipment      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewShipment {
    pub order_id: i64,
    pub seller_id: String,
    pub carrier_shipment_id: i64,
    pub carrier_order_id: i64,
    pub carrier_order_ref: String,
    pub awb_code: String,
    pub courier_id: Option<i64>,
    pub courier_name: Option<String>,
    pub pickup_location: String,
}
