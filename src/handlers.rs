//! Application pages.
//!
//! Handlers answer with small JSON documents instead of rendered templates.
//! Every state-changing form post checks its CSRF token first.

use axum::http::header::HeaderValue;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::csrf::{check_form_token, CsrfCheck, TokenStore, CSRF_FIELD};
use crate::error::Error;
use crate::http::handler::{HandlerResult, Rejection, RouteRequest};
use crate::http::response;

/// Header telling an htmx client where to navigate.
pub const HX_REDIRECT: &str = "hx-redirect";

/// Shared state of the page handlers.
pub struct Pages {
    pub store: Arc<TokenStore>,
    pub auth: Arc<AuthConfig>,
}

type Form = HashMap<String, String>;

fn required<'a>(form: &'a Form, field: &'static str) -> Result<&'a str, Rejection> {
    form.get(field)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Rejection::bad_request(Error::MissingField(field)))
}

fn path_id(request: &RouteRequest) -> Result<String, Rejection> {
    request
        .var("id")
        .map(str::to_string)
        .ok_or_else(|| Rejection::not_found(Error::BadRequest("path variable `id` missing".into())))
}

/// Read the form and run the CSRF check for the current session.
///
/// `Ok(Err(response))` means the token was renewed and `response` must be sent as is.
async fn guarded_form(pages: &Pages, request: &mut RouteRequest) -> Result<Result<Form, Response>, Rejection> {
    let session_id = request.ctx.session().map_err(Rejection::internal)?.id;
    let form = request.form().await.map_err(Rejection::bad_request)?;

    match check_form_token(&pages.store, session_id, form.get(CSRF_FIELD).map(String::as_str))? {
        CsrfCheck::Proceed => Ok(Ok(form)),
        CsrfCheck::Renewed(response) => Ok(Err(response)),
    }
}

pub async fn home(_request: RouteRequest) -> HandlerResult {
    Ok(Json(json!({ "page": "home" })).into_response())
}

/// GET /signin and /signup.
pub async fn auth_form(request: RouteRequest) -> HandlerResult {
    let redirect = request.ctx.redirect().map_err(Rejection::internal)?;
    Ok(Json(json!({
        "page": request.path().trim_start_matches('/'),
        "redirect": redirect.encoded(),
    }))
    .into_response())
}

/// POST /signin and /signup: start a session for `user_id` and issue its token.
pub async fn sign_in(pages: Arc<Pages>, mut request: RouteRequest) -> HandlerResult {
    let form = request.form().await.map_err(Rejection::bad_request)?;
    let user_id: i64 = required(&form, "user_id")?
        .parse()
        .map_err(|_| Rejection::bad_request(Error::BadRequest("`user_id` must be an integer".into())))?;

    let target = request.ctx.redirect().map_err(Rejection::internal)?.clone();
    let db = request.ctx.db().map_err(Rejection::internal)?.clone();

    let session = db
        .sessions()
        .create(user_id)
        .await
        .map_err(Rejection::internal)?;
    pages.store.create(session.id).map_err(Rejection::internal)?;

    tracing::info!(session_id = %session.id, user_id, "Signed in");
    Ok(response::with_cookie(
        response::redirect(target.path()),
        response::session_cookie(&pages.auth.session_cookie, session.id, pages.auth.secure_cookies),
    ))
}

/// POST /signout: drop the session and its token, clear the cookie.
pub async fn sign_out(pages: Arc<Pages>, request: RouteRequest) -> HandlerResult {
    let session_id = request.ctx.session().map_err(Rejection::internal)?.id;
    let db = request.ctx.db().map_err(Rejection::internal)?.clone();

    // Token first: a cookie without a token record is already signed out.
    pages.store.delete(session_id).map_err(Rejection::internal)?;
    db.sessions()
        .delete(session_id)
        .await
        .map_err(Rejection::internal)?;

    tracing::info!(session_id = %session_id, "Signed out");
    let mut response = response::with_cookie(
        StatusCode::OK.into_response(),
        response::expired_session_cookie(&pages.auth.session_cookie),
    );
    if let Ok(location) = HeaderValue::from_str(&pages.auth.signin_path) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(HX_REDIRECT), location);
    }
    Ok(response)
}

pub async fn dashboard(request: RouteRequest) -> HandlerResult {
    let session = request.ctx.session().map_err(Rejection::internal)?;
    let token = request.ctx.token().map_err(Rejection::internal)?;
    Ok(Json(json!({
        "page": "dashboard",
        "user_id": session.user_id,
        "csrf": token.value,
    }))
    .into_response())
}

pub async fn new_account_page(request: RouteRequest) -> HandlerResult {
    let token = request.ctx.token().map_err(Rejection::internal)?;
    Ok(Json(json!({ "page": "new-account", "csrf": token.value })).into_response())
}

pub async fn create_account(pages: Arc<Pages>, mut request: RouteRequest) -> HandlerResult {
    let form = match guarded_form(&pages, &mut request).await? {
        Ok(form) => form,
        Err(renewal) => return Ok(renewal),
    };
    let name = required(&form, "name")?;
    let currency = form.get("currency").map(String::as_str).unwrap_or("HUF");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "account": { "name": name, "currency": currency } })),
    )
        .into_response())
}

pub async fn account_page(request: RouteRequest) -> HandlerResult {
    let id = path_id(&request)?;
    let token = request.ctx.token().map_err(Rejection::internal)?;
    Ok(Json(json!({ "page": "account", "account_id": id, "csrf": token.value })).into_response())
}

pub async fn delete_account(pages: Arc<Pages>, mut request: RouteRequest) -> HandlerResult {
    let id = path_id(&request)?;
    if let Err(renewal) = guarded_form(&pages, &mut request).await? {
        return Ok(renewal);
    }

    tracing::info!(account_id = %id, "Account deleted");
    let mut response = StatusCode::OK.into_response();
    response.headers_mut().insert(
        HeaderName::from_static(HX_REDIRECT),
        HeaderValue::from_static("/dashboard"),
    );
    Ok(response)
}

pub async fn create_event(pages: Arc<Pages>, mut request: RouteRequest) -> HandlerResult {
    let form = match guarded_form(&pages, &mut request).await? {
        Ok(form) => form,
        Err(renewal) => return Ok(renewal),
    };
    let account_id = required(&form, "account_id")?;
    let name = required(&form, "name")?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "event": { "account_id": account_id, "name": name } })),
    )
        .into_response())
}

pub async fn edit_event(pages: Arc<Pages>, mut request: RouteRequest) -> HandlerResult {
    let id = path_id(&request)?;
    let form = match guarded_form(&pages, &mut request).await? {
        Ok(form) => form,
        Err(renewal) => return Ok(renewal),
    };
    let name = required(&form, "name")?;

    Ok(Json(json!({ "event": { "id": id, "name": name } })).into_response())
}

pub async fn delete_event(pages: Arc<Pages>, mut request: RouteRequest) -> HandlerResult {
    let id = path_id(&request)?;
    if let Err(renewal) = guarded_form(&pages, &mut request).await? {
        return Ok(renewal);
    }

    tracing::info!(event_id = %id, "Event deleted");
    Ok(StatusCode::OK.into_response())
}

/// GET /ui/check?user_id=N: whether the user currently has a live session.
pub async fn check_user(request: RouteRequest) -> HandlerResult {
    let user_id: i64 = request
        .query("user_id")
        .ok_or_else(|| Rejection::bad_request(Error::MissingField("user_id")))?
        .parse()
        .map_err(|_| Rejection::bad_request(Error::BadRequest("`user_id` must be an integer".into())))?;
    let db = request.ctx.db().map_err(Rejection::internal)?.clone();

    let active = db
        .sessions()
        .active_sessions()
        .await
        .map_err(Rejection::internal)?;
    let signed_in = active.iter().any(|s| s.user_id == user_id);

    Ok(Json(json!({ "user_id": user_id, "signed_in": signed_in })).into_response())
}
