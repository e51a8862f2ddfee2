use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShiprocketApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Carrier login failed: {0}")]
    Authentication(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Carrier call failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}
