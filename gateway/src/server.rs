use std::sync::Arc;

use axum::Router;
use axum::response::Redirect;
use axum::routing::{get, post};
use backend::IBackendClient;

use crate::config::GatewayConfig;
use crate::{auth, kpis, me, proxy};

/// Shared state for all gateway handlers.
#[derive(Clone)]
pub(crate) struct Handler {
    pub backend: Arc<dyn IBackendClient>,
    pub config: GatewayConfig,
}

impl Handler {
    /// Creates a new [`Handler`].
    pub(crate) fn new(backend: Arc<dyn IBackendClient>, config: GatewayConfig) -> Self {
        Self { backend, config }
    }
}

/// Builds the gateway router.
pub(crate) fn router(handler: Handler) -> Router {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/api/me", get(me::me))
        .route("/api/kpis", get(kpis::kpis))
        .route(
            "/api/materiels",
            get(proxy::list_materiels)
                .post(proxy::create_materiel)
                .put(proxy::update_materiel)
                .delete(proxy::delete_materiel),
        )
        .route("/api/materiels/mine", get(proxy::my_materiels))
        .route(
            "/api/logiciels",
            get(proxy::list_logiciels)
                .post(proxy::create_logiciel)
                .put(proxy::update_logiciel)
                .delete(proxy::delete_logiciel),
        )
        .route(
            "/api/fournisseurs",
            get(proxy::list_fournisseurs)
                .post(proxy::create_fournisseur)
                .put(proxy::update_fournisseur)
                .delete(proxy::delete_fournisseur),
        )
        .route(
            "/api/tickets",
            get(proxy::get_tickets).post(proxy::create_ticket),
        )
        .route(
            "/api/chatbot",
            get(proxy::chatbot_health).post(proxy::chatbot),
        )
        .route("/dashboard", get(dashboard_entry))
        .with_state(handler)
}

/// The dashboard root forwards to the tickets overview.
async fn dashboard_entry() -> Redirect {
    Redirect::temporary("/dashboard/tickets/overview")
}
