//! Gateway response serialization and error formatting.

use docgate_model::DataError;

use crate::body::DataResponseBody;

/// Content type for gateway JSON responses.
pub const CONTENT_TYPE: &str = "application/json";

/// Serialize a gateway error into a JSON response body.
///
/// ```json
/// {
///   "error": "document_not_found",
///   "message": "document 123 not found in songs",
///   "correlationId": "6f1c2c8e-..."
/// }
/// ```
#[must_use]
pub fn error_to_json(error: &DataError, correlation_id: &str) -> Vec<u8> {
    serde_json::json!({
        "error": error.code.as_str(),
        "message": error.message,
        "correlationId": correlation_id,
    })
    .to_string()
    .into_bytes()
}

/// Convert a `DataError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(
    error: &DataError,
    correlation_id: &str,
) -> http::Response<DataResponseBody> {
    json_response(error.status_code, error_to_json(error, correlation_id))
}

/// Build a response carrying a JSON payload.
#[must_use]
pub fn json_response(status: http::StatusCode, json: Vec<u8>) -> http::Response<DataResponseBody> {
    let mut response = http::Response::new(DataResponseBody::from_bytes(json));
    *response.status_mut() = status;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static(CONTENT_TYPE),
    );
    response
}

/// Build a bodiless acknowledgement.
#[must_use]
pub fn empty_response(status: http::StatusCode) -> http::Response<DataResponseBody> {
    let mut response = http::Response::new(DataResponseBody::empty());
    *response.status_mut() = status;
    response
}
