//! Cookie authentication middlewares.
//!
//! # Responsibilities
//! - `token`: admit requests whose session cookie maps to a token record
//! - `auth_page`: keep signed-in users away from the sign-in/up pages
//!
//! # Design Decisions
//! - Both resolve the cookie the same way: cookie → session ID → token record
//! - Store contention is an Internal Error, never treated as "signed out"

use axum::http::{HeaderMap, Method};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::csrf::{TokenRecord, TokenStore};
use crate::error::Error;
use crate::http::context::RedirectTarget;
use crate::http::handler::{boxed, BoxHandler, BoxMiddleware, Middleware, Rejection, RouteRequest};
use crate::http::request::session_id_from_cookie;
use crate::http::response;

/// Resolve the session cookie to the session's token record.
pub fn token_from_cookie(
    store: &TokenStore,
    headers: &HeaderMap,
    cookie_name: &str,
) -> Result<TokenRecord, Error> {
    let session_id = session_id_from_cookie(headers, cookie_name)?;
    Ok(store.get(session_id)?)
}

/// Requires a signed-in user.
pub struct TokenAuth {
    store: Arc<TokenStore>,
    auth: Arc<AuthConfig>,
}

impl Middleware for TokenAuth {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        let store = self.store.clone();
        let auth = self.auth.clone();
        boxed(move |mut request: RouteRequest| {
            let store = store.clone();
            let auth = auth.clone();
            let next = next.clone();
            async move {
                match token_from_cookie(&store, request.headers(), &auth.session_cookie) {
                    Ok(token) => {
                        request.ctx.set_token(token);
                        next.call(request).await
                    }
                    Err(error) if error.is_contention() => Err(Rejection::internal(error)),
                    Err(error) => {
                        let response = if request.method() == Method::GET {
                            response::redirect_to_signin(&auth.signin_path, request.path())
                        } else {
                            response::unauthorized()
                        };
                        Err(Rejection::new(response, error))
                    }
                }
            }
        })
    }
}

pub fn token(store: Arc<TokenStore>, auth: Arc<AuthConfig>) -> BoxMiddleware {
    Arc::new(TokenAuth { store, auth })
}

/// Guards the sign-in and sign-up pages.
///
/// A signed-in user is sent straight to the `redirect` target. Everyone
/// else continues with the validated target in the context.
pub struct AuthPage {
    store: Arc<TokenStore>,
    auth: Arc<AuthConfig>,
}

impl Middleware for AuthPage {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        let store = self.store.clone();
        let auth = self.auth.clone();
        boxed(move |mut request: RouteRequest| {
            let store = store.clone();
            let auth = auth.clone();
            let next = next.clone();
            async move {
                let raw = request
                    .query("redirect")
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| auth.default_redirect.clone());
                let target = RedirectTarget::parse(&raw).map_err(Rejection::bad_request)?;

                match token_from_cookie(&store, request.headers(), &auth.session_cookie) {
                    Ok(token) => {
                        tracing::debug!(
                            session_id = %token.session_id,
                            target = %target.path(),
                            "Already signed in"
                        );
                        return Ok(response::redirect(target.path()));
                    }
                    Err(error) if error.is_contention() => return Err(Rejection::internal(error)),
                    Err(_) => {}
                }

                request.ctx.set_redirect(target);
                next.call(request).await
            }
        })
    }
}

pub fn auth_page(store: Arc<TokenStore>, auth: Arc<AuthConfig>) -> BoxMiddleware {
    Arc::new(AuthPage { store, auth })
}
