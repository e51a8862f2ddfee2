use std::collections::HashMap;

use mss_common::Money;

use crate::db_types::OrderItemDetail;

/// Weight assumed for a variant whose catalogue entry never recorded one.
pub const DEFAULT_UNIT_WEIGHT_KG: f64 = 0.5;

/// Grouping key for items that carry no seller reference at all, directly or via their variant.
/// Such items still ship; they are simply packed together under this sentinel.
pub const UNATTRIBUTED_SELLER_ID: &str = "unattributed";

/// One seller's slice of an order, with the aggregates the carrier request needs.
#[derive(Debug, Clone)]
pub struct SellerGroup {
    pub seller_id: String,
    pub seller_name: String,
    pub items: Vec<OrderItemDetail>,
}

impl SellerGroup {
    /// Sum of unit price times quantity over the group.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|i| i.line_total()).sum()
    }

    pub fn discount_total(&self) -> Money {
        self.items.iter().map(|i| i.discount_at_purchase).sum()
    }

    pub fn gst_total(&self) -> Money {
        self.items.iter().map(|i| i.gst_at_purchase).sum()
    }

    pub fn shipping_total(&self) -> Money {
        self.items.iter().map(|i| i.shipping_charge).sum()
    }

    /// Total package weight, falling back to [`DEFAULT_UNIT_WEIGHT_KG`] per unit where the
    /// catalogue has no weight.
    pub fn total_weight_kg(&self) -> f64 {
        self.items.iter().map(|i| i.unit_weight_kg.unwrap_or(DEFAULT_UNIT_WEIGHT_KG) * i.quantity as f64).sum()
    }

    pub fn item_ids(&self) -> Vec<i64> {
        self.items.iter().map(|i| i.id).collect()
    }

    /// The distinct draft shipments the group's items point at, in first-seen order.
    pub fn draft_shipment_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for item in &self.items {
            if let Some(id) = item.draft_shipment_id {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}

/// Partitions the order's items by seller. The item's direct seller reference wins; items without
/// one inherit their variant's seller; items with neither land under the
/// [`UNATTRIBUTED_SELLER_ID`] sentinel.
pub fn group_by_seller(items: &[OrderItemDetail]) -> HashMap<String, SellerGroup> {
    let mut groups: HashMap<String, SellerGroup> = HashMap::new();
    for item in items {
        let seller_id = item.effective_seller_id().unwrap_or(UNATTRIBUTED_SELLER_ID).to_string();
        let seller_name = item.effective_seller_name().unwrap_or(UNATTRIBUTED_SELLER_ID).to_string();
        groups
            .entry(seller_id.clone())
            .or_insert_with(|| SellerGroup { seller_id, seller_name, items: Vec::new() })
            .items
            .push(item.clone());
    }
    groups
}
