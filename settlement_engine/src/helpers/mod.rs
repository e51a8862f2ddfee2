mod seller_groups;

pub use seller_groups::{group_by_seller, SellerGroup, DEFAULT_UNIT_WEIGHT_KG, UNATTRIBUTED_SELLER_ID};
