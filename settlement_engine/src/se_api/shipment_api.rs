use std::fmt::Debug;

use chrono::Utc;
use log::*;
use shiprocket_tools::{
    data_objects::{CarrierOrderItem, CarrierOrderRequest},
    helpers::{carrier_order_ref, carrier_price, sanitize_hsn, sanitize_phone},
};

use crate::{
    db_types::{DraftShipment, Order},
    helpers::SellerGroup,
    se_api::settlement_objects::CarrierShipment,
    traits::{ShipmentError, ShippingCarrier},
};

/// Package dimensions reported to the carrier when no measurement is on file.
const DEFAULT_PACKAGE_DIMS_CM: f64 = 10.0;

/// `ShipmentApi` turns one seller's slice of a paid order into a carrier shipment with an AWB
/// attached.
pub struct ShipmentApi<C> {
    carrier: C,
}

impl<C> Debug for ShipmentApi<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShipmentApi")
    }
}

impl<C> ShipmentApi<C> {
    pub fn new(carrier: C) -> Self {
        Self { carrier }
    }
}

impl<C> ShipmentApi<C>
where C: ShippingCarrier
{
    /// Register the seller group with the carrier and assign an AWB.
    ///
    /// The pickup location comes from the group's first draft shipment and must match an address
    /// registered on the carrier account. Courier selection tries the draft's preferred courier
    /// first, then the courier the carrier suggested at order creation, then falls back to letting
    /// the carrier choose.
    pub async fn create_seller_shipment(
        &self,
        order: &Order,
        group: &SellerGroup,
        drafts: &[DraftShipment],
    ) -> Result<CarrierShipment, ShipmentError> {
        let pickup = drafts
            .first()
            .map(|d| d.pickup_location.clone())
            .ok_or_else(|| ShipmentError::NoPickupLocation(group.seller_id.clone()))?;
        self.validate_pickup_location(&pickup).await?;
        let phone = sanitize_phone(&order.customer_phone);
        if phone.is_empty() {
            return Err(ShipmentError::InvalidPhoneNumber(order.customer_phone.clone()));
        }
        let order_ref = carrier_order_ref(order.id, &group.seller_id, Utc::now());
        let request = build_carrier_request(order, group, &pickup, &order_ref, &phone);
        let created = self.carrier.create_order(&request).await?;
        debug!(
            "🔄️🚚️ Carrier accepted order {order_ref} for seller {} as shipment {}",
            group.seller_id, created.shipment_id
        );

        let preferred = drafts.iter().find_map(|d| d.courier_id);
        let mut attempts: Vec<Option<i64>> = Vec::new();
        if let Some(courier) = preferred {
            attempts.push(Some(courier));
        }
        if let Some(courier) = created.suggested_courier() {
            if Some(courier) != preferred {
                attempts.push(Some(courier));
            }
        }
        attempts.push(None);

        let mut last_reason = String::new();
        for courier in attempts {
            match self.carrier.assign_awb(created.shipment_id, courier).await {
                Ok(response) => {
                    if let Some(awb) = response.awb_code() {
                        let courier_name = response
                            .courier_name()
                            .map(String::from)
                            .or_else(|| drafts.iter().find_map(|d| d.courier_name.clone()))
                            .or_else(|| created.courier_name.clone());
                        info!("🔄️🚚️ AWB {awb} assigned to shipment {}", created.shipment_id);
                        return Ok(CarrierShipment {
                            carrier_shipment_id: created.shipment_id,
                            carrier_order_id: created.order_id,
                            carrier_order_ref: order_ref,
                            awb_code: awb.to_string(),
                            courier_id: response.courier_id().or(courier),
                            courier_name,
                            pickup_location: pickup,
                        });
                    }
                    last_reason = "carrier returned no AWB code".to_string();
                    warn!(
                        "🔄️🚚️ No AWB on shipment {} with courier {courier:?}. Trying the next courier.",
                        created.shipment_id
                    );
                },
                Err(e) => {
                    last_reason = e.to_string();
                    warn!(
                        "🔄️🚚️ AWB assignment failed for shipment {} with courier {courier:?}: {e}",
                        created.shipment_id
                    );
                },
            }
        }
        Err(ShipmentError::AwbAssignmentFailed { shipment_id: created.shipment_id, reason: last_reason })
    }

    async fn validate_pickup_location(&self, pickup: &str) -> Result<(), ShipmentError> {
        let registered = self.carrier.pickup_locations().await?;
        let known = registered
            .iter()
            .any(|loc| loc.pickup_location.trim().eq_ignore_ascii_case(pickup.trim()));
        if known {
            Ok(())
        } else {
            Err(ShipmentError::InvalidPickupLocation(pickup.to_string()))
        }
    }
}

fn build_carrier_request(
    order: &Order,
    group: &SellerGroup,
    pickup: &str,
    order_ref: &str,
    phone: &str,
) -> CarrierOrderRequest {
    let mut names = order.customer_name.split_whitespace();
    let first_name = names.next().unwrap_or("Customer").to_string();
    let last_name = names.collect::<Vec<_>>().join(" ");
    let order_items = group
        .items
        .iter()
        .map(|item| CarrierOrderItem {
            name: item.product_name.clone(),
            sku: item.sku.clone(),
            units: item.quantity,
            selling_price: carrier_price(item.price_at_purchase),
            discount: carrier_price(item.discount_at_purchase),
            tax: carrier_price(item.gst_at_purchase),
            hsn: sanitize_hsn(item.hsn_code.as_deref()),
        })
        .collect();
    CarrierOrderRequest {
        order_id: order_ref.to_string(),
        order_date: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        pickup_location: pickup.to_string(),
        billing_customer_name: first_name,
        billing_last_name: last_name,
        billing_address: order.shipping_address.clone(),
        billing_address_2: order.shipping_address_2.clone(),
        billing_city: order.shipping_city.clone(),
        billing_pincode: order.shipping_pincode.clone(),
        billing_state: order.shipping_state.clone(),
        billing_country: order.shipping_country.clone(),
        billing_email: order.customer_email.clone(),
        billing_phone: phone.to_string(),
        shipping_is_billing: true,
        order_items,
        payment_method: "Prepaid".to_string(),
        shipping_charges: carrier_price(group.shipping_total()),
        total_discount: carrier_price(group.discount_total()),
        sub_total: carrier_price(group.subtotal()),
        length: DEFAULT_PACKAGE_DIMS_CM,
        breadth: DEFAULT_PACKAGE_DIMS_CM,
        height: DEFAULT_PACKAGE_DIMS_CM,
        weight: group.total_weight_kg(),
    }
}
