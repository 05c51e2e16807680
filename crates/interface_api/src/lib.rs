//! HTTP API Layer
//!
//! REST surface of the billing ledger, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: billing documents, payments, login and health
//! - **Middleware**: JWT authentication and audit logging
//! - **DTOs**: request and response bodies
//! - **Error Handling**: one JSON error shape for every failure
//!
//! The router is generic over the [`LedgerStore`], so the same routes run
//! against PostgreSQL in production and the in-memory ledger in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(PostgresLedger::new(pool.clone()), staff, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::StaffDirectory;
use domain_billing::{BillingDocumentService, LedgerStore, PaymentService};

use crate::config::ApiConfig;
use crate::handlers::{auth as login, billing, health, payments};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S> {
    pub documents: BillingDocumentService<S>,
    pub payments: PaymentService<S>,
    pub store: S,
    pub staff: Arc<dyn StaffDirectory>,
    pub config: Arc<ApiConfig>,
}

impl<S: LedgerStore> AppState<S> {
    pub fn new(store: S, staff: Arc<dyn StaffDirectory>, config: ApiConfig) -> Self {
        Self {
            documents: BillingDocumentService::new(store.clone()),
            payments: PaymentService::new(store.clone()),
            store,
            staff,
            config: Arc::new(config),
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `store` - Ledger store backing both services
/// * `staff` - Staff directory used by login
/// * `config` - API configuration
pub fn create_router<S: LedgerStore>(
    store: S,
    staff: Arc<dyn StaffDirectory>,
    config: ApiConfig,
) -> Router {
    let state = AppState::new(store, staff, config);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check::<S>))
        .route("/auth/login", post(login::login::<S>));

    let billing_routes = Router::new()
        .route("/", get(billing::list_documents::<S>).post(billing::create_document::<S>))
        .route(
            "/:id",
            get(billing::get_document::<S>)
                .put(billing::update_document::<S>)
                .delete(billing::delete_document::<S>),
        )
        .route("/:id/reconcile", post(billing::reconcile_document::<S>))
        .route("/:id/payments", get(billing::list_document_payments::<S>));

    let payment_routes = Router::new()
        .route("/", get(payments::list_payments::<S>).post(payments::create_payment::<S>))
        .route(
            "/:id",
            put(payments::update_payment::<S>).delete(payments::delete_payment::<S>),
        );

    // Protected API routes
    let api_routes = Router::new()
        .nest("/billing", billing_routes)
        .nest("/payments", payment_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
