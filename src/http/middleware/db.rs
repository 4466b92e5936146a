//! Database handle injection.

use std::sync::Arc;

use crate::http::handler::{boxed, BoxHandler, BoxMiddleware, Middleware, Rejection, RouteRequest};
use crate::services::Database;

/// Puts a database handle into the request context.
pub struct DbMiddleware {
    database: Arc<dyn Database>,
}

impl Middleware for DbMiddleware {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        let database = self.database.clone();
        boxed(move |mut request: RouteRequest| {
            let database = database.clone();
            let next = next.clone();
            async move {
                let db = database.handle().map_err(Rejection::internal)?;
                request.ctx.set_db(db);
                next.call(request).await
            }
        })
    }
}

pub fn db(database: Arc<dyn Database>) -> BoxMiddleware {
    Arc::new(DbMiddleware { database })
}
