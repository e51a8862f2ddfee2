use actix_web::{http::StatusCode, web, web::ServiceConfig, ResponseError};
use chrono::{TimeZone, Utc};
use mss_common::{Money, Secret};
use serde_json::{json, Value};
use settlement_engine::{
    db_types::{GatewayOrderId, NewPaymentRecord, Order, PaymentRecord, PaymentStatus},
    events::EventProducers,
    LedgerApi,
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
    webhook_routes::VerifyPaymentRoute,
};

const API_SECRET: &str = "rzs_test_k3y";

#[actix_web::test]
async fn callback_with_a_valid_signature_settles_the_order() {
    let _ = env_logger::try_init().ok();
    let sig = calculate_hmac(API_SECRET, b"order_ver1|pay_ver1");
    let body = json!({
        "gatewayOrderId": "order_ver1",
        "gatewayPaymentId": "pay_ver1",
        "signature": sig,
        "orderDbId": 42,
        "cartId": "cart_93Xw1"
    })
    .to_string();
    let (status, body) = post_request("/gateway/verify", body, None, configure_single).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["message"], json!("1 order(s) settled."));
    assert_eq!(response["data"]["processedOrders"][0]["orderId"], json!(42));
    assert_eq!(response["data"]["processedOrders"][0]["gatewayOrderId"], json!("order_ver1"));
    assert_eq!(response["data"]["processedOrders"][0]["status"], json!("Completed"));
    assert_eq!(response["data"]["shiprocketResults"], json!([]));
    assert_eq!(response["data"]["failedItems"], json!([]));
}

#[actix_web::test]
async fn callback_with_a_bad_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let sig = calculate_hmac("wrong-secret", b"order_ver1|pay_ver1");
    let body = json!({
        "gatewayOrderId": "order_ver1",
        "gatewayPaymentId": "pay_ver1",
        "signature": sig,
        "orderDbId": 42
    })
    .to_string();
    let err = post_request("/gateway/verify", body, None, configure_untouched)
        .await
        .expect_err("Request should have been rejected");
    assert_eq!(err.as_response_error().status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "The payment signature does not match the payload");
}

#[actix_web::test]
async fn the_whole_checkout_batch_is_settled() {
    let _ = env_logger::try_init().ok();
    let sig = calculate_hmac(API_SECRET, b"order_ver1|pay_ver1");
    let body = json!({
        "gatewayOrderId": "order_ver1",
        "gatewayPaymentId": "pay_ver1",
        "signature": sig,
        "orderDbId": 42,
        "allOrderIds": [42, 43]
    })
    .to_string();
    let (status, body) = post_request("/gateway/verify", body, None, configure_batch).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["success"], json!(true));
    assert_eq!(response["message"], json!("2 order(s) settled."));
    assert_eq!(response["data"]["processedOrders"][0]["orderId"], json!(42));
    assert_eq!(response["data"]["processedOrders"][1]["orderId"], json!(43));
}

#[actix_web::test]
async fn unknown_orders_are_reported_without_failing_the_request() {
    let _ = env_logger::try_init().ok();
    let sig = calculate_hmac(API_SECRET, b"order_ver1|pay_ver1");
    let body = json!({
        "gatewayOrderId": "order_ver1",
        "gatewayPaymentId": "pay_ver1",
        "signature": sig,
        "orderDbId": 999
    })
    .to_string();
    let (status, body) = post_request("/gateway/verify", body, None, configure_missing).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["success"], json!(true));
    assert!(response["message"].as_str().unwrap().contains("need attention"));
    assert_eq!(response["data"]["processedOrders"], json!([]));
    assert_eq!(response["data"]["failedItems"][0]["orderId"], json!(999));
    assert!(response["data"]["failedItems"][0]["reason"].as_str().unwrap().contains("does not exist"));
}

fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        webhook_secret: Secret::new("unused-here".to_string()),
        api_secret: Secret::new(API_SECRET.to_string()),
        hmac_checks: true,
    }
}

fn wire(cfg: &mut ServiceConfig, db: MockSettlementDb, ledger_db: MockSettlementDb) {
    let api = SettlementFlowApi::new(
        db,
        LedgerApi::new(ledger_db),
        ShipmentApi::new(MockCarrier::new()),
        EventProducers::default(),
    );
    cfg.service(VerifyPaymentRoute::<MockSettlementDb, MockCarrier>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway_config()))
        .app_data(web::Data::new(ServerOptions::default()));
}

fn configure_untouched(cfg: &mut ServiceConfig) {
    wire(cfg, MockSettlementDb::new(), MockSettlementDb::new());
}

fn configure_single(cfg: &mut ServiceConfig) {
    let mut db = MockSettlementDb::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id))));
    db.expect_update_payment_status().returning(|_, _| Ok(StatusTransition::Applied));
    db.expect_fetch_items_for_order().returning(|_| Ok(vec![]));
    db.expect_delete_cart().returning(|_| Ok(()));
    let mut ledger_db = MockSettlementDb::new();
    ledger_db.expect_upsert_payment().returning(|p| Ok(stored_payment(p)));
    wire(cfg, db, ledger_db);
}

fn configure_batch(cfg: &mut ServiceConfig) {
    let mut db = MockSettlementDb::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id))));
    db.expect_update_payment_status().returning(|_, _| Ok(StatusTransition::Applied));
    db.expect_fetch_items_for_order().returning(|_| Ok(vec![]));
    let mut ledger_db = MockSettlementDb::new();
    ledger_db.expect_upsert_payment().returning(|p| Ok(stored_payment(p)));
    wire(cfg, db, ledger_db);
}

fn configure_missing(cfg: &mut ServiceConfig) {
    let mut db = MockSettlementDb::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    wire(cfg, db, MockSettlementDb::new());
}

// Mock response to `fetch_order` calls
fn order(id: i64) -> Order {
    Order {
        id,
        gateway_order_id: GatewayOrderId("order_ver1".to_string()),
        customer_name: "Asha Kumar".to_string(),
        customer_email: "asha@example.com".to_string(),
        customer_phone: "+91 98765 43210".to_string(),
        shipping_address: "14 MG Road".to_string(),
        shipping_address_2: String::new(),
        shipping_city: "Bengaluru".to_string(),
        shipping_state: "Karnataka".to_string(),
        shipping_pincode: "560001".to_string(),
        shipping_country: "India".to_string(),
        total_amount: Money::from(120_000),
        payment_status: PaymentStatus::Pending,
        created_at: Utc.with_ymd_and_hms(2024, 4, 14, 10, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 4, 14, 10, 30, 0).unwrap(),
    }
}

fn stored_payment(p: NewPaymentRecord) -> PaymentRecord {
    PaymentRecord {
        id: p.order_id * 10,
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
