//! Deserialization types for the payment gateway's webhook envelope.
//!
//! Every webhook carries an `event` name and a `payload` whose members depend on the event.
//! Payment events wrap a [`PaymentEntity`], dispute events additionally wrap a
//! [`DisputeEntity`]. Fields the settlement flow does not consume are simply not declared, so
//! newly added gateway fields never break parsing.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use mss_common::Money;
use serde::{Deserialize, Serialize};

pub const PAYMENT_AUTHORIZED: &str = "payment.authorized";
pub const PAYMENT_CAPTURED: &str = "payment.captured";
pub const PAYMENT_FAILED: &str = "payment.failed";
pub const DISPUTE_CREATED: &str = "payment.dispute.created";

//--------------------------------------   GatewayEvent      ---------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    #[serde(default)]
    pub payload: GatewayPayload,
    pub created_at: Option<i64>,
}

impl GatewayEvent {
    pub fn payment(&self) -> Option<&PaymentEntity> {
        self.payload.payment.as_ref().map(|w| &w.entity)
    }

    pub fn dispute(&self) -> Option<&DisputeEntity> {
        self.payload.dispute.as_ref().map(|w| &w.entity)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub payment: Option<EntityWrapper<PaymentEntity>>,
    pub dispute: Option<EntityWrapper<DisputeEntity>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

//--------------------------------------   PaymentEntity     ---------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEntity {
    /// The gateway's payment (transaction) id, e.g. `pay_N8kZ1aBcD`.
    pub id: String,
    /// The gateway's order reference. All marketplace orders of the checkout share it.
    pub order_id: String,
    /// Amount in paise.
    pub amount: Money,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    #[serde(default)]
    pub notes: PaymentNotes,
    /// Unix timestamp of the payment, when the gateway supplies one.
    pub created_at: Option<i64>,
}

impl PaymentEntity {
    pub fn cart_id(&self) -> Option<&str> {
        self.notes.get("cart_id")
    }

    /// The payment time as reported by the gateway, falling back to the current time when the
    /// event does not carry one.
    pub fn date(&self) -> DateTime<Utc> {
        self.created_at.and_then(|t| Utc.timestamp_opt(t, 0).single()).unwrap_or_else(Utc::now)
    }
}

/// The gateway serializes notes as a key-value map when present, but as an empty array `[]` when
/// the merchant attached none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentNotes {
    Map(HashMap<String, String>),
    List(Vec<String>),
}

impl Default for PaymentNotes {
    fn default() -> Self {
        Self::Map(HashMap::new())
    }
}

impl PaymentNotes {
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            Self::Map(map) => map.get(key).map(String::as_str),
            Self::List(_) => None,
        }
    }
}

//--------------------------------------   DisputeEntity     ---------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeEntity {
    /// The gateway's dispute id. Refund ledger rows are keyed on it.
    pub id: String,
    pub payment_id: String,
    /// Disputed amount in paise, when the gateway discloses it.
    pub amount: Option<Money>,
    pub currency: Option<String>,
    pub reason_code: Option<String>,
    pub status: Option<String>,
}
