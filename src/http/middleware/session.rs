//! Session record resolution.

use std::sync::Arc;

use crate::http::handler::{boxed, BoxHandler, BoxMiddleware, Middleware, Rejection, RouteRequest};

/// Looks up the session behind the token record and injects it.
///
/// Must run after `token` and `db`; a missing input is an Internal Error,
/// never a silent pass.
pub struct SessionMiddleware;

impl Middleware for SessionMiddleware {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        boxed(move |mut request: RouteRequest| {
            let next = next.clone();
            async move {
                let session_id = request.ctx.token().map_err(Rejection::internal)?.session_id;
                let db = request.ctx.db().map_err(Rejection::internal)?.clone();

                let session = db
                    .sessions()
                    .get_by_id(session_id)
                    .await
                    .map_err(Rejection::internal)?;

                tracing::debug!(session_id = %session.id, user_id = session.user_id, "Session resolved");
                request.ctx.set_session(session);
                next.call(request).await
            }
        })
    }
}

pub fn session() -> BoxMiddleware {
    Arc::new(SessionMiddleware)
}
