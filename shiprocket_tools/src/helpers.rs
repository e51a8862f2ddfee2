use chrono::{DateTime, Utc};
use mss_common::Money;
use regex::Regex;

/// Fallback HSN code (generic apparel chapter) for items that never had one captured.
pub const DEFAULT_HSN: &str = "610900";
pub const MAX_HSN_LEN: usize = 15;
pub const MAX_ORDER_REF_LEN: usize = 50;

/// The carrier wants bare subscriber numbers. Strips everything that is not a digit, then any
/// leading zeros.
pub fn sanitize_phone(raw: &str) -> String {
    let re = Regex::new(r"\D").unwrap();
    let digits = re.replace_all(raw, "");
    digits.trim_start_matches('0').to_string()
}

/// HSN codes must be numeric and at most [MAX_HSN_LEN] characters. Anything unusable collapses to
/// [DEFAULT_HSN].
pub fn sanitize_hsn(raw: Option<&str>) -> String {
    let re = Regex::new(r"\D").unwrap();
    let digits = raw.map(|s| re.replace_all(s, "").to_string()).unwrap_or_default();
    if digits.is_empty() {
        return DEFAULT_HSN.to_string();
    }
    digits.chars().take(MAX_HSN_LEN).collect()
}

/// Builds the carrier-side order reference from the order id, the seller and a timestamp.
/// The carrier rejects references longer than [MAX_ORDER_REF_LEN] characters, so the seller
/// segment gives way when the reference would overflow.
pub fn carrier_order_ref(order_id: i64, seller_id: &str, at: DateTime<Utc>) -> String {
    let suffix = at.timestamp().to_string();
    let full = format!("{order_id}_{seller_id}_{suffix}");
    if full.len() <= MAX_ORDER_REF_LEN {
        return full;
    }
    let keep = MAX_ORDER_REF_LEN.saturating_sub(order_id.to_string().len() + suffix.len() + 2);
    let seller = seller_id.chars().take(keep).collect::<String>();
    format!("{order_id}_{seller}_{suffix}")
}

/// Carrier payloads carry rupee decimals rather than paise.
pub fn carrier_price(amount: Money) -> f64 {
    amount.value() as f64 / 100.0
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use mss_common::Money;

    use super::*;

    #[test]
    fn phone_sanitizer_strips_noise() {
        assert_eq!(sanitize_phone("+91 98765-43210"), "919876543210");
        assert_eq!(sanitize_phone("098 7654 3210"), "9876543210");
        assert_eq!(sanitize_phone("00000"), "");
        assert_eq!(sanitize_phone("(022) 4096-1111"), "2240961111");
    }

    #[test]
    fn hsn_sanitizer_enforces_numeric_limit() {
        assert_eq!(sanitize_hsn(Some("6109.10")), "610910");
        assert_eq!(sanitize_hsn(Some("HSN-998877")), "998877");
        assert_eq!(sanitize_hsn(Some("12345678901234567890")), "123456789012345");
        assert_eq!(sanitize_hsn(Some("n/a")), DEFAULT_HSN);
        assert_eq!(sanitize_hsn(None), DEFAULT_HSN);
    }

    #[test]
    fn order_ref_stays_within_carrier_limit() {
        let now = Utc::now();
        let short = carrier_order_ref(42, "seller-7", now);
        assert!(short.starts_with("42_seller-7_"));
        assert!(short.len() <= MAX_ORDER_REF_LEN);
        let long = carrier_order_ref(987654321, &"x".repeat(80), now);
        assert!(long.len() <= MAX_ORDER_REF_LEN);
        assert!(long.starts_with("987654321_x"));
        assert!(long.ends_with(&now.timestamp().to_string()));
    }

    #[test]
    fn prices_convert_to_rupee_decimals() {
        assert_eq!(carrier_price(Money::from(12_550)), 125.5);
        assert_eq!(carrier_price(Money::from(0)), 0.0);
    }
}
