use serde::{Deserialize, Serialize};

/// Courier company ids arrive as numbers, numeric strings, or empty strings depending on the
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourierId {
    Numeric(i64),
    Text(String),
}

impl CourierId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CourierId::Numeric(n) => Some(*n),
            CourierId::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CarrierOrderItem {
    pub name: String,
    pub sku: String,
    pub units: i64,
    pub selling_price: f64,
    pub discount: f64,
    pub tax: f64,
    pub hsn: String,
}

/// Payload for the adhoc order-creation endpoint. Amounts are rupee decimals, weight is in kg.
#[derive(Debug, Clone, Serialize)]
pub struct CarrierOrderRequest {
    pub order_id: String,
    pub order_date: String,
    pub pickup_location: String,
    pub billing_customer_name: String,
    pub billing_last_name: String,
    pub billing_address: String,
    pub billing_address_2: String,
    pub billing_city: String,
    pub billing_pincode: String,
    pub billing_state: String,
    pub billing_country: String,
    pub billing_email: String,
    pub billing_phone: String,
    pub shipping_is_billing: bool,
    pub order_items: Vec<CarrierOrderItem>,
    pub payment_method: String,
    pub shipping_charges: f64,
    pub total_discount: f64,
    pub sub_total: f64,
    pub length: f64,
    pub breadth: f64,
    pub height: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: i64,
    pub shipment_id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub awb_code: Option<String>,
    #[serde(default)]
    pub courier_company_id: Option<CourierId>,
    #[serde(default)]
    pub courier_name: Option<String>,
}

impl CreateOrderResponse {
    /// The courier the carrier pre-selected for this shipment, if any.
    pub fn suggested_courier(&self) -> Option<i64> {
        self.courier_company_id.as_ref().and_then(CourierId::as_i64)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwbData {
    #[serde(default)]
    pub awb_code: Option<String>,
    #[serde(default)]
    pub courier_company_id: Option<CourierId>,
    #[serde(default)]
    pub courier_name: Option<String>,
    #[serde(default)]
    pub shipment_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwbEnvelope {
    pub data: AwbData,
}

/// The AWB assignment endpoint has shipped at least three envelope shapes over time. All of them
/// carry the same data block; absence of a non-empty `awb_code` means the assignment failed.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AwbAssignmentResponse {
    Wrapped {
        #[serde(default)]
        awb_assign_status: Option<i64>,
        response: AwbEnvelope,
    },
    Nested {
        data: AwbData,
    },
    Flat(AwbData),
}

impl AwbAssignmentResponse {
    fn data(&self) -> &AwbData {
        match self {
            AwbAssignmentResponse::Wrapped { response, .. } => &response.data,
            AwbAssignmentResponse::Nested { data } => data,
            AwbAssignmentResponse::Flat(data) => data,
        }
    }

    pub fn awb_code(&self) -> Option<&str> {
        self.data().awb_code.as_deref().filter(|s| !s.is_empty())
    }

    pub fn courier_id(&self) -> Option<i64> {
        self.data().courier_company_id.as_ref().and_then(CourierId::as_i64)
    }

    pub fn courier_name(&self) -> Option<&str> {
        self.data().courier_name.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickupLocation {
    pub pickup_location: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickupAddressBook {
    #[serde(default)]
    pub shipping_address: Vec<PickupLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickupLocationsResponse {
    pub data: PickupAddressBook,
}
