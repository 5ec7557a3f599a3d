//! Error normalization.
//!
//! Every failure path of the access layer ends here and produces exactly one
//! [`ApiError`]. Classification of a failed response:
//!
//! 1. No response received: `NETWORK_ERROR` with a fixed user message.
//! 2. A structured body carrying a `validationErrors` list: `VALIDATION_ERROR`,
//!    with each `field: message` pair joined by `, `.
//! 3. A structured body with an `error` object: the backend code (or
//!    `HTTP_<status>` when omitted), user message looked up by code, then by
//!    status, then generic.
//! 4. Anything else: `HTTP_<status>` with the status text.

use serde_json::{Map, Value};

use crate::clients::errors::{codes, ApiError, TransportError};
use crate::clients::http_response::{canonical_reason, HttpResponse};

/// User message for network failures.
pub const NETWORK_USER_MESSAGE: &str =
    "No se pudo conectar con el servidor. Verifique su conexión.";

/// User message for validation failures.
pub const VALIDATION_USER_MESSAGE: &str = "Hay errores en el formulario. Por favor, corríjalos.";

/// User message when nothing more specific is known.
pub const GENERIC_USER_MESSAGE: &str = "Ha ocurrido un error inesperado.";

/// Returns the user message for an HTTP status.
#[must_use]
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "Los datos enviados no son válidos.",
        401 => "No tiene permisos para realizar esta acción.",
        403 => "Acceso prohibido.",
        404 => "El recurso solicitado no fue encontrado.",
        409 => "El recurso ya existe o hay un conflicto.",
        422 => "Los datos no pudieron ser procesados.",
        429 => "Demasiadas peticiones. Intente más tarde.",
        500 => "Error interno del servidor.",
        502 => "Servidor no disponible.",
        503 => "Servicio temporalmente no disponible.",
        504 => "Tiempo de espera agotado.",
        _ => GENERIC_USER_MESSAGE,
    }
}

/// Returns the user message for a backend error code, falling back to the
/// status table.
#[must_use]
pub fn localized_message(code: &str, status: u16) -> &'static str {
    match code {
        "CUSTOMER_NOT_FOUND" => "Cliente no encontrado.",
        "INVALID_CREDENTIALS" => "Credenciales inválidas.",
        "TOKEN_EXPIRED" => "Su sesión ha expirado. Por favor, inicie sesión nuevamente.",
        "INSUFFICIENT_PERMISSIONS" => "No tiene permisos suficientes.",
        "RATE_LIMIT_EXCEEDED" => "Ha excedido el límite de peticiones.",
        _ => status_message(status),
    }
}

/// Normalizes a failure that happened before any response was received.
#[must_use]
pub fn normalize_transport(error: &TransportError) -> ApiError {
    match error {
        TransportError::Network(e) if e.is_builder() => {
            ApiError::new(codes::INVALID_REQUEST, e.to_string(), GENERIC_USER_MESSAGE)
        }
        TransportError::Network(_) => ApiError::new(
            codes::NETWORK_ERROR,
            "Network connection error",
            NETWORK_USER_MESSAGE,
        ),
        TransportError::InvalidRequest(_) | TransportError::Serialization(_) => {
            ApiError::new(codes::INVALID_REQUEST, error.to_string(), GENERIC_USER_MESSAGE)
        }
    }
}

/// Normalizes a non-2xx response.
#[must_use]
pub fn normalize_response(response: &HttpResponse) -> ApiError {
    normalize_body(response.code, response.status_text(), &response.body)
}

/// Normalizes a 2xx response whose wrapped envelope reported failure.
///
/// A structured error body is classified as usual; otherwise the record
/// carries [`codes::UNSUCCESSFUL_RESPONSE`].
#[must_use]
pub fn normalize_unsuccessful(status: u16, body: &Value) -> ApiError {
    if structured_error(body).is_some() {
        return normalize_body(status, canonical_reason(status), body);
    }
    ApiError::new(
        codes::UNSUCCESSFUL_RESPONSE,
        "The backend reported an unsuccessful result",
        GENERIC_USER_MESSAGE,
    )
    .with_status(Some(status))
}

/// Normalizes a 2xx payload that could not be decoded into the expected type.
#[must_use]
pub fn normalize_decode(status: u16, error: &serde_json::Error) -> ApiError {
    ApiError::new(
        codes::INVALID_RESPONSE,
        format!("Unexpected response payload: {error}"),
        GENERIC_USER_MESSAGE,
    )
    .with_status(Some(status))
}

/// Logs a normalized error for monitoring.
pub(crate) fn log_error(error: &ApiError, url: &str) {
    tracing::error!(
        code = %error.code,
        message = %error.message,
        user_message = %error.user_message,
        status = error.status.unwrap_or(0),
        url = %url,
        details = ?error.details,
        timestamp = %chrono::Utc::now().to_rfc3339(),
        "API Error"
    );
}

fn normalize_body(status: u16, status_text: &str, body: &Value) -> ApiError {
    if let Some(validation_errors) = validation_errors(body) {
        return normalize_validation(status, validation_errors);
    }

    if let Some(error) = structured_error(body) {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map_or_else(|| codes::http_status(status), str::to_string);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(status_text)
            .to_string();
        let details = error.get("details").and_then(Value::as_object).cloned();

        return ApiError::new(&code, message, localized_message(&code, status))
            .with_details(details)
            .with_status(Some(status));
    }

    let mut details = Map::new();
    details.insert("statusText".to_string(), Value::from(status_text));

    ApiError::new(
        codes::http_status(status),
        status_text,
        status_message(status),
    )
    .with_details(Some(details))
    .with_status(Some(status))
}

fn normalize_validation(status: u16, validation_errors: &[Value]) -> ApiError {
    let field_errors = validation_errors
        .iter()
        .map(|entry| {
            let field = entry.get("field").and_then(Value::as_str).unwrap_or("");
            let message = entry.get("message").and_then(Value::as_str).unwrap_or("");
            format!("{field}: {message}")
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut details = Map::new();
    details.insert(
        "validationErrors".to_string(),
        Value::Array(validation_errors.to_vec()),
    );

    ApiError::new(
        codes::VALIDATION_ERROR,
        format!("Validation failed: {field_errors}"),
        VALIDATION_USER_MESSAGE,
    )
    .with_details(Some(details))
    .with_status(Some(status))
}

/// Returns the `error` object of a structured API error body.
fn structured_error(body: &Value) -> Option<&Map<String, Value>> {
    body.get("error").and_then(Value::as_object)
}

/// Returns the validation list, nested under `error` or at the top level.
fn validation_errors(body: &Value) -> Option<&[Value]> {
    structured_error(body)
        .and_then(|error| error.get("validationErrors"))
        .or_else(|| body.get("validationErrors"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
}
