use actix_web::{http::StatusCode, web, web::ServiceConfig, ResponseError};
use chrono::{TimeZone, Utc};
use mss_common::{Money, Secret};
use serde_json::{json, Value};
use settlement_engine::{
    db_types::{GatewayOrderId, NewPaymentRecord, Order, PaymentRecord, PaymentStatus},
    events::EventProducers,
    LedgerApi,
    SettlementError,
    SettlementFlowApi,
    ShipmentApi,
    StatusTransition,
};

use super::{
    helpers::post_request,
    mocks::{MockCarrier, MockSettlementDb},
};
use crate::{
    config::{GatewayConfig, ServerOptions},
    helpers::calculate_hmac,
    webhook_routes::GatewayWebhookRoute,
};

const WEBHOOK_SECRET: &str = "whsec_test_4pQ9";

#[actix_web::test]
async fn webhook_without_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let err = post_request("/gateway/webhook", captured_event_body(), None, configure_untouched)
        .await
        .expect_err("Request should have been rejected");
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "No gateway signature found.");
}

#[actix_web::test]
async fn webhook_with_a_bad_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = captured_event_body();
    let sig = calculate_hmac("not-the-webhook-secret", body.as_bytes());
    let err = post_request("/gateway/webhook", body, Some(&sig), configure_untouched)
        .await
        .expect_err("Request should have been rejected");
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Invalid gateway signature.");
}

#[actix_web::test]
async fn webhook_with_a_valid_signature_settles_the_order() {
    let _ = env_logger::try_init().ok();
    let body = captured_event_body();
    let sig = calculate_hmac(WEBHOOK_SECRET, body.as_bytes());
    let (status, body) =
        post_request("/gateway/webhook", body, Some(&sig), configure_settlement).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["message"], json!("Payment settled."));
}

#[actix_web::test]
async fn unknown_events_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "event": "refund.processed", "payload": {}, "created_at": 1_713_100_002 }).to_string();
    let sig = calculate_hmac(WEBHOOK_SECRET, body.as_bytes());
    let (status, body) =
        post_request("/gateway/webhook", body, Some(&sig), configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["message"], json!("Event refund.processed ignored."));
}

#[actix_web::test]
async fn malformed_payment_events_are_flagged() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "event": "payment.captured", "payload": {}, "created_at": 1_713_100_003 }).to_string();
    let sig = calculate_hmac(WEBHOOK_SECRET, body.as_bytes());
    let (status, body) =
        post_request("/gateway/webhook", body, Some(&sig), configure_untouched).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["success"], json!(false));
    assert_eq!(response["message"], json!("Malformed payment.captured payload."));
}

#[actix_web::test]
async fn signature_checks_can_be_disabled_for_development() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "event": "payment.authorized",
        "payload": {
            "payment": { "entity": { "id": "pay_dev1", "order_id": "order_dev1", "amount": 9900 } }
        },
        "created_at": 1_713_100_004
    })
    .to_string();
    let (status, body) = post_request("/gateway/webhook", body, None, configure_unchecked).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["message"], json!("Authorization recorded."));
}

#[actix_web::test]
async fn backend_failures_are_reported_but_still_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = captured_event_body();
    let sig = calculate_hmac(WEBHOOK_SECRET, body.as_bytes());
    let (status, body) =
        post_request("/gateway/webhook", body, Some(&sig), configure_db_failure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["success"], json!(false));
    assert_eq!(response["message"], json!("Could not settle the payment."));
}

/// The capture notification the gateway delivers for `test_order`.
fn captured_event_body() -> String {
    json!({
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": "pay_N8kZ1aBcD",
                    "order_id": "order_set1",
                    "amount": 250_000,
                    "currency": "INR",
                    "status": "captured",
                    "method": "upi",
                    "notes": { "cart_id": "cart_77frT" },
                    "created_at": 1_713_100_000
                }
            }
        },
        "created_at": 1_713_100_001
    })
    .to_string()
}

fn strict_config() -> GatewayConfig {
    GatewayConfig {
        webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
        api_secret: Secret::new("unused-here".to_string()),
        hmac_checks: true,
    }
}

fn wire(cfg: &mut ServiceConfig, db: MockSettlementDb, ledger_db: MockSettlementDb, gateway: GatewayConfig) {
    let api = SettlementFlowApi::new(
        db,
        LedgerApi::new(ledger_db),
        ShipmentApi::new(MockCarrier::new()),
        EventProducers::default(),
    );
    cfg.service(GatewayWebhookRoute::<MockSettlementDb, MockCarrier>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway))
        .app_data(web::Data::new(ServerOptions::default()));
}

// App whose mocks expect no calls at all. Any touch of the database fails the test.
fn configure_untouched(cfg: &mut ServiceConfig) {
    wire(cfg, MockSettlementDb::new(), MockSettlementDb::new(), strict_config());
}

fn configure_settlement(cfg: &mut ServiceConfig) {
    let mut db = MockSettlementDb::new();
    db.expect_fetch_orders_by_gateway_ref().returning(|_| Ok(vec![test_order()]));
    db.expect_fetch_order().returning(|_| Ok(Some(test_order())));
    db.expect_update_payment_status().returning(|_, _| Ok(StatusTransition::Applied));
    db.expect_fetch_items_for_order().returning(|_| Ok(vec![]));
    db.expect_delete_cart().returning(|_| Ok(()));
    let mut ledger_db = MockSettlementDb::new();
    ledger_db.expect_upsert_payment().returning(|p| Ok(stored_payment(p)));
    wire(cfg, db, ledger_db, strict_config());
}

fn configure_db_failure(cfg: &mut ServiceConfig) {
    let mut db = MockSettlementDb::new();
    db.expect_fetch_orders_by_gateway_ref()
        .returning(|_| Err(SettlementError::DatabaseError("connection reset".to_string())));
    wire(cfg, db, MockSettlementDb::new(), strict_config());
}

fn configure_unchecked(cfg: &mut ServiceConfig) {
    let mut db = MockSettlementDb::new();
    db.expect_fetch_orders_by_gateway_ref().returning(|_| Ok(vec![]));
    let gateway = GatewayConfig { hmac_checks: false, ..strict_config() };
    wire(cfg, db, MockSettlementDb::new(), gateway);
}

// Mock response to `fetch_order` and `fetch_orders_by_gateway_ref` calls
fn test_order() -> Order {
    Order {
        id: 42,
        gateway_order_id: GatewayOrderId("order_set1".to_string()),
        customer_name: "Asha Kumar".to_string(),
        customer_email: "asha@example.com".to_string(),
        customer_phone: "+91 98765 43210".to_string(),
        shipping_address: "14 MG Road".to_string(),
        shipping_address_2: String::new(),
        shipping_city: "Bengaluru".to_string(),
        shipping_state: "Karnataka".to_string(),
        shipping_pincode: "560001".to_string(),
        shipping_country: "India".to_string(),
        total_amount: Money::from(250_000),
        payment_status: PaymentStatus::Pending,
        created_at: Utc.with_ymd_and_hms(2024, 4, 14, 10, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 4, 14, 10, 30, 0).unwrap(),
    }
}

fn stored_payment(p: NewPaymentRecord) -> PaymentRecord {
    PaymentRecord {
        id: 1,
        order_id: p.order_id,
        gateway_order_id: p.gateway_order_id,
        gateway: p.gateway,
        transaction_id: p.transaction_id,
        amount: p.amount,
        status: p.status,
        payment_method: p.payment_method,
        payment_date: p.payment_date,
        created_at: p.payment_date,
        updated_at: p.payment_date,
    }
}
