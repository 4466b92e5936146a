//! CSRF verification for state-changing form posts.

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

use crate::csrf::store::{TokenError, TokenRecord, TokenStore};
use crate::error::Error;
use crate::http::handler::Rejection;
use crate::services::SessionId;

/// Form field carrying the token.
pub const CSRF_FIELD: &str = "csrf";

/// Response header carrying a renewed token.
pub const CSRF_HEADER: &str = "x-csrf-token";

pub const HX_RETARGET: &str = "hx-retarget";
pub const HX_TRIGGER: &str = "hx-trigger";

/// Element the client swaps the renewed token into.
pub const RENEWAL_TARGET: &str = "#csrf";

/// Client event fired after a renewal so the action is resubmitted.
pub const RENEWAL_EVENT: &str = "csrf-renewed";

/// What a handler should do after checking a submitted token.
pub enum CsrfCheck {
    /// The token is valid and unexpired.
    Proceed,
    /// The token had expired and was renewed; send this response and stop.
    Renewed(Response),
}

impl fmt::Debug for CsrfCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsrfCheck::Proceed => f.write_str("Proceed"),
            CsrfCheck::Renewed(response) => f
                .debug_tuple("Renewed")
                .field(&response.status())
                .finish(),
        }
    }
}

/// Check the token submitted with a form against the session's record.
///
/// | Outcome            | Result                        |
/// |--------------------|-------------------------------|
/// | field missing      | `Err` with 400                |
/// | value mismatch     | `Err` with 401                |
/// | no record          | `Err` with 401                |
/// | store busy         | `Err` with 500                |
/// | valid, expired     | `Ok(Renewed)` with new token  |
/// | valid, fresh       | `Ok(Proceed)`                 |
pub fn check_form_token(
    store: &TokenStore,
    session_id: SessionId,
    presented: Option<&str>,
) -> Result<CsrfCheck, Rejection> {
    let presented = match presented {
        Some(value) if !value.is_empty() => value,
        _ => return Err(Rejection::bad_request(Error::MissingField(CSRF_FIELD))),
    };

    match store.verify_or_renew(session_id, presented) {
        Ok(None) => Ok(CsrfCheck::Proceed),
        Ok(Some(record)) => Ok(CsrfCheck::Renewed(renewal_response(&record))),
        Err(e @ (TokenError::Invalid(_) | TokenError::NotFound(_) | TokenError::Expired(_))) => {
            Err(Rejection::unauthorized(e))
        }
        Err(e) => Err(Rejection::internal(e)),
    }
}

/// Response handing a renewed token back to the client.
pub fn renewal_response(record: &TokenRecord) -> Response {
    let mut response = (
        StatusCode::OK,
        Json(json!({
            "csrf": record.value,
            "valid_until": record.valid_until,
        })),
    )
        .into_response();

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&record.value) {
        headers.insert(HeaderName::from_static(CSRF_HEADER), value);
    }
    headers.insert(
        HeaderName::from_static(HX_RETARGET),
        HeaderValue::from_static(RENEWAL_TARGET),
    );
    headers.insert(
        HeaderName::from_static(HX_TRIGGER),
        HeaderValue::from_static(RENEWAL_EVENT),
    );
    response
}
