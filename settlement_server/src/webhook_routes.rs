//----------------------------------------------   Gateway  ----------------------------------------------------
//
// The two entry points the payment gateway drives. `gateway_webhook` receives server-to-server
// event notifications and is wrapped in the HMAC body-signature middleware. `verify_payment` is
// the storefront's checkout callback, authenticated by the signature inside the body.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{debug, info, trace, warn};
use settlement_engine::{
    db_types::GatewayOrderId,
    traits::{SettlementDatabase, ShippingCarrier},
    SettlementFlowApi,
};

use crate::{
    config::{GatewayConfig, ServerOptions},
    data_objects::{JsonResponse, VerifyPaymentRequest, VerifyPaymentResponse},
    errors::ServerError,
    gateway_events::{
        DisputeEntity,
        GatewayEvent,
        PaymentEntity,
        DISPUTE_CREATED,
        PAYMENT_AUTHORIZED,
        PAYMENT_CAPTURED,
        PAYMENT_FAILED,
    },
    helpers::{get_remote_ip, verify_callback_signature},
    route,
};

route!(gateway_webhook => Post "/gateway/webhook" impl SettlementDatabase, ShippingCarrier where signed);
pub async fn gateway_webhook<B, C>(
    req: HttpRequest,
    body: web::Json<GatewayEvent>,
    api: web::Data<SettlementFlowApi<B, C>>,
    options: web::Data<ServerOptions>,
) -> HttpResponse
where
    B: SettlementDatabase,
    C: ShippingCarrier,
{
    let event = body.into_inner();
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    trace!("📬️ Received '{}' webhook from {peer:?}", event.event);
    // Webhook responses must always be in the 200 range, otherwise the gateway keeps retrying
    let result = match event.event.as_str() {
        PAYMENT_AUTHORIZED => match event.payment() {
            Some(payment) => on_payment_authorized(payment, &api).await,
            None => malformed_event(&event),
        },
        PAYMENT_CAPTURED => match event.payment() {
            Some(payment) => on_payment_captured(payment, &api).await,
            None => malformed_event(&event),
        },
        PAYMENT_FAILED => match event.payment() {
            Some(payment) => on_payment_failed(payment, &api).await,
            None => malformed_event(&event),
        },
        DISPUTE_CREATED => match (event.payment(), event.dispute()) {
            (Some(payment), Some(dispute)) => on_dispute_created(payment, dispute, &api).await,
            _ => malformed_event(&event),
        },
        other => {
            debug!("📬️ Ignoring '{other}' webhook. No settlement action is associated with it.");
            JsonResponse::success(format!("Event {other} ignored."))
        },
    };
    HttpResponse::Ok().json(result)
}

fn malformed_event(event: &GatewayEvent) -> JsonResponse {
    warn!("📬️ '{}' webhook did not carry the entities the event requires.", event.event);
    JsonResponse::failure(format!("Malformed {} payload.", event.event))
}

async fn on_payment_authorized<B, C>(payment: &PaymentEntity, api: &SettlementFlowApi<B, C>) -> JsonResponse
where
    B: SettlementDatabase,
    C: ShippingCarrier,
{
    let gateway_order_id = GatewayOrderId(payment.order_id.clone());
    match api.process_authorization(&gateway_order_id, &payment.id, payment.method.as_deref(), payment.date()).await {
        Ok(orders) => {
            info!("📬️ Payment {} authorized against {} order(s) of {gateway_order_id}.", payment.id, orders.len());
            JsonResponse::success("Authorization recorded.")
        },
        Err(e) => {
            warn!("📬️ Could not record authorization {}. {e}", payment.id);
            JsonResponse::failure("Could not record the authorization.")
        },
    }
}

async fn on_payment_captured<B, C>(payment: &PaymentEntity, api: &SettlementFlowApi<B, C>) -> JsonResponse
where
    B: SettlementDatabase,
    C: ShippingCarrier,
{
    let gateway_order_id = GatewayOrderId(payment.order_id.clone());
    match api
        .process_capture(&gateway_order_id, &payment.id, payment.method.as_deref(), payment.date(), payment.cart_id())
        .await
    {
        Ok(outcome) => {
            info!(
                "📬️ Capture {} settled {} order(s) of {gateway_order_id} with {} shipment(s) and {} failure(s).",
                payment.id,
                outcome.processed_orders.len(),
                outcome.shipment_results.len(),
                outcome.failed_items.len()
            );
            JsonResponse::success("Payment settled.")
        },
        Err(e) => {
            warn!("📬️ Could not settle capture {}. {e}", payment.id);
            JsonResponse::failure("Could not settle the payment.")
        },
    }
}

async fn on_payment_failed<B, C>(payment: &PaymentEntity, api: &SettlementFlowApi<B, C>) -> JsonResponse
where
    B: SettlementDatabase,
    C: ShippingCarrier,
{
    let gateway_order_id = GatewayOrderId(payment.order_id.clone());
    match api.process_failure(&gateway_order_id, &payment.id, payment.method.as_deref(), payment.date()).await {
        Ok(orders) => {
            info!("📬️ Failure of {} recorded against {} order(s) of {gateway_order_id}.", payment.id, orders.len());
            JsonResponse::success("Failed payment recorded.")
        },
        Err(e) => {
            warn!("📬️ Could not record failed payment {}. {e}", payment.id);
            JsonResponse::failure("Could not record the failed payment.")
        },
    }
}

async fn on_dispute_created<B, C>(
    payment: &PaymentEntity,
    dispute: &DisputeEntity,
    api: &SettlementFlowApi<B, C>,
) -> JsonResponse
where
    B: SettlementDatabase,
    C: ShippingCarrier,
{
    let gateway_order_id = GatewayOrderId(payment.order_id.clone());
    match api.process_dispute(&gateway_order_id, &dispute.id, dispute.amount, Utc::now()).await {
        Ok(orders) => {
            info!("📬️ Dispute {} refunded {} order(s) of {gateway_order_id}.", dispute.id, orders.len());
            JsonResponse::success("Dispute refund recorded.")
        },
        Err(e) => {
            warn!("📬️ Could not process dispute {}. {e}", dispute.id);
            JsonResponse::failure("Could not process the dispute.")
        },
    }
}

route!(verify_payment => Post "/gateway/verify" impl SettlementDatabase, ShippingCarrier);
pub async fn verify_payment<B, C>(
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<SettlementFlowApi<B, C>>,
    config: web::Data<GatewayConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    C: ShippingCarrier,
{
    let request = body.into_inner();
    trace!("📬️ Checkout callback for {} / {}", request.gateway_order_id, request.gateway_payment_id);
    let genuine = verify_callback_signature(
        config.api_secret.reveal(),
        &request.gateway_order_id,
        &request.gateway_payment_id,
        &request.signature,
    );
    if !genuine {
        warn!("📬️ Checkout callback for {} carried an invalid signature.", request.gateway_order_id);
        return Err(ServerError::InvalidSignature);
    }
    let order_ids = request.order_ids();
    let gateway_order_id = GatewayOrderId(request.gateway_order_id.clone());
    let outcome = api
        .settle_orders(
            &order_ids,
            &gateway_order_id,
            &request.gateway_payment_id,
            None,
            Utc::now(),
            request.cart_id.as_deref(),
        )
        .await?;
    let message = if outcome.failed_items.is_empty() {
        format!("{} order(s) settled.", outcome.processed_orders.len())
    } else {
        format!(
            "{} order(s) settled. {} seller group(s) could not be shipped and need attention.",
            outcome.processed_orders.len(),
            outcome.failed_items.len()
        )
    };
    info!("📬️ {message} ({gateway_order_id})");
    let response = VerifyPaymentResponse { success: true, message, data: outcome.into() };
    Ok(HttpResponse::Ok().json(response))
}
