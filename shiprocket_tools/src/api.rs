use std::sync::{Arc, RwLock};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::ShiprocketConfig,
    data_objects::{AwbAssignmentResponse, CarrierOrderRequest, CreateOrderResponse, PickupLocation, PickupLocationsResponse},
    ShiprocketApiError,
};

#[derive(Clone)]
pub struct ShiprocketApi {
    config: ShiprocketConfig,
    client: Arc<Client>,
    // Bearer token issued by the login endpoint. Guard must never be held across an await.
    token: Arc<RwLock<Option<String>>>,
}

impl ShiprocketApi {
    pub fn new(config: ShiprocketConfig) -> Result<Self, ShiprocketApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShiprocketApiError::Initialization(e.to_string()))?;
        let token = config.api_token.as_ref().map(|t| t.reveal().clone());
        Ok(Self { config, client: Arc::new(client), token: Arc::new(RwLock::new(token)) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1/external{path}", self.config.base_url)
    }

    fn cached_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn store_token(&self, token: &str) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.to_string());
        }
    }

    fn clear_token(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }

    /// Logs in with the configured credentials and caches the bearer token for subsequent calls.
    pub async fn authenticate(&self) -> Result<String, ShiprocketApiError> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            email: &'a str,
            password: &'a str,
        }
        #[derive(Deserialize)]
        struct LoginResponse {
            token: String,
        }
        debug!("Logging in to the carrier as {}", self.config.email);
        let body = LoginRequest { email: &self.config.email, password: self.config.password.reveal() };
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ShiprocketApiError::Authentication(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ShiprocketApiError::Authentication(format!("Login rejected ({status}): {message}")));
        }
        let login = response.json::<LoginResponse>().await.map_err(|e| ShiprocketApiError::JsonError(e.to_string()))?;
        self.store_token(&login.token);
        info!("Carrier login for {} succeeded", self.config.email);
        Ok(login.token)
    }

    async fn ensure_token(&self) -> Result<String, ShiprocketApiError> {
        match self.cached_token() {
            Some(token) => Ok(token),
            None => self.authenticate().await,
        }
    }

    /// Sends an authenticated request, logging in first when no token is cached. An expired token
    /// triggers exactly one re-login and retry.
    pub async fn api_call<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ShiprocketApiError> {
        let token = self.ensure_token().await?;
        let response = self.send_request(method.clone(), path, body, &token).await?;
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Carrier token expired, logging in again");
            self.clear_token();
            let token = self.authenticate().await?;
            self.send_request(method, path, body, &token).await?
        } else {
            response
        };
        if response.status().is_success() {
            trace!("Carrier call successful. {}", response.status());
            response.json::<T>().await.map_err(|e| ShiprocketApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| ShiprocketApiError::RestResponseError(e.to_string()))?;
            Err(ShiprocketApiError::QueryError { status, message })
        }
    }

    async fn send_request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: &str,
    ) -> Result<reqwest::Response, ShiprocketApiError> {
        let url = self.url(path);
        trace!("Sending carrier request: {url}");
        let mut req = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send().await.map_err(|e| ShiprocketApiError::RestResponseError(e.to_string()))
    }

    /// The pickup addresses registered on the carrier account.
    pub async fn pickup_locations(&self) -> Result<Vec<PickupLocation>, ShiprocketApiError> {
        debug!("Fetching pickup locations");
        let result = self
            .api_call::<PickupLocationsResponse, ()>(Method::GET, "/settings/company/pickup", None)
            .await?;
        info!("Fetched {} pickup locations", result.data.shipping_address.len());
        Ok(result.data.shipping_address)
    }

    /// Registers a new adhoc order with the carrier and returns its shipment handle.
    pub async fn create_order(&self, order: &CarrierOrderRequest) -> Result<CreateOrderResponse, ShiprocketApiError> {
        debug!("Creating carrier order {}", order.order_id);
        let result = self
            .api_call::<CreateOrderResponse, CarrierOrderRequest>(Method::POST, "/orders/create/adhoc", Some(order))
            .await?;
        info!("Created carrier order {} (shipment {})", result.order_id, result.shipment_id);
        Ok(result)
    }

    /// Requests an AWB for the given shipment. `courier_id` pins a specific courier; `None` lets
    /// the carrier pick one.
    pub async fn assign_awb(
        &self,
        shipment_id: i64,
        courier_id: Option<i64>,
    ) -> Result<AwbAssignmentResponse, ShiprocketApiError> {
        #[derive(Serialize)]
        struct AwbRequest {
            shipment_id: i64,
            #[serde(skip_serializing_if = "Option::is_none")]
            courier_id: Option<i64>,
        }
        let body = AwbRequest { shipment_id, courier_id };
        debug!("Requesting AWB for shipment {shipment_id} (courier: {courier_id:?})");
        let result = self
            .api_call::<AwbAssignmentResponse, AwbRequest>(Method::POST, "/courier/assign/awb", Some(&body))
            .await?;
        match result.awb_code() {
            Some(awb) => info!("Assigned AWB {awb} to shipment {shipment_id}"),
            None => debug!("No AWB in assignment response for shipment {shipment_id}"),
        }
        Ok(result)
    }
}
