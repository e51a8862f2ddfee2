use actix_web::{body::MessageBody, error::InternalError, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;

use crate::middleware::GATEWAY_SIGNATURE_HEADER;

/// Posts a JSON body to an app assembled by `configure`, optionally attaching a gateway signature
/// header. Responses the handler produced come back as `(status, body)`; rejections — whether from
/// the middleware chain or an error the handler returned — surface as `Err`.
pub async fn post_request(
    path: &str,
    body: String,
    signature: Option<&str>,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), actix_web::Error> {
    let mut req = TestRequest::post().uri(path).insert_header(("content-type", "application/json"));
    if let Some(sig) = signature {
        req = req.insert_header((GATEWAY_SIGNATURE_HEADER, sig));
    }
    let req = req.set_payload(body).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::try_call_service(&service, req).await?;
    // Handler errors are folded into the response by actix; pull them back out into the Err channel.
    if let Some(err) = res.response().error() {
        return Err(InternalError::new(err.to_string(), err.as_response_error().status_code()).into());
    }
    let (_, res) = res.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
