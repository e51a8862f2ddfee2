use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use settlement_engine::{events::EventProducers, LedgerApi, SettlementFlowApi, ShipmentApi, SqliteDatabase};
use shiprocket_tools::ShiprocketApi;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::notifications::create_notification_event_handlers,
    routes::health,
    webhook_routes::{GatewayWebhookRoute, VerifyPaymentRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let carrier =
        ShiprocketApi::new(config.shiprocket.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_notification_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, carrier, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    carrier: ShiprocketApi,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let ledger_api = LedgerApi::new(db.clone());
        let shipment_api = ShipmentApi::new(carrier.clone());
        let flow_api = SettlementFlowApi::new(db.clone(), ledger_api, shipment_api, producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mss::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(config.gateway.clone()))
            .app_data(web::Data::new(ServerOptions::from_config(&config)))
            .service(health)
            .service(GatewayWebhookRoute::<SqliteDatabase, ShiprocketApi>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, ShiprocketApi>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
