use crate::settlement_objects::OrderConfirmation;

/// Fired once per settled gateway checkout, after payments are recorded and shipments have been
/// attempted. Carries the flattened confirmation that notification channels render.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSettledEvent {
    pub confirmation: OrderConfirmation,
}

impl OrderSettledEvent {
    pub fn new(confirmation: OrderConfirmation) -> Self {
        Self { confirmation }
    }
}
