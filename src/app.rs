//! Route table of the application.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::csrf::TokenStore;
use crate::handlers::{self, Pages};
use crate::http::handler::with_state;
use crate::http::middleware::{auth_page, db, session, token};
use crate::routing::Router;
use crate::services::Database;

/// Register every page with its middleware list.
pub fn build_router(config: &AppConfig, database: Arc<dyn Database>, store: Arc<TokenStore>) -> Router {
    let auth = Arc::new(config.auth.clone());
    let pages = Arc::new(Pages {
        store: store.clone(),
        auth: auth.clone(),
    });

    let db_handle = || db(database.clone());
    let guest = || auth_page(store.clone(), auth.clone());
    let signed_in = || vec![token(store.clone(), auth.clone()), db(database.clone()), session()];

    let mut router = Router::new();

    router.get("/", handlers::home, vec![]);

    router
        .get("/signup", handlers::auth_form, vec![guest()])
        .post("/signup", with_state(pages.clone(), handlers::sign_in), vec![guest(), db_handle()])
        .get("/signin", handlers::auth_form, vec![guest()])
        .post("/signin", with_state(pages.clone(), handlers::sign_in), vec![guest(), db_handle()])
        .post("/signout", with_state(pages.clone(), handlers::sign_out), signed_in());

    router.get("/dashboard", handlers::dashboard, signed_in());

    router
        .get("/account/new", handlers::new_account_page, signed_in())
        .post("/account", with_state(pages.clone(), handlers::create_account), signed_in())
        .get("/account/:id", handlers::account_page, signed_in())
        .delete("/account/:id", with_state(pages.clone(), handlers::delete_account), signed_in());

    router
        .post("/event", with_state(pages.clone(), handlers::create_event), signed_in())
        .patch("/event/:id", with_state(pages.clone(), handlers::edit_event), signed_in())
        .delete("/event/:id", with_state(pages, handlers::delete_event), signed_in());

    router.get("/ui/check", handlers::check_user, vec![db_handle()]);

    router.set_static_path(
        config.static_files.url_prefix.clone(),
        &config.static_files.root,
    );

    for line in router.describe() {
        tracing::debug!(route = %line, "Route registered");
    }
    router
}
