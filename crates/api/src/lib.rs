//! HTTP API server for the storefront.
//!
//! Provides REST endpoints for the catalog, orders, reviews and user
//! accounts, with bearer-token authentication, structured logging
//! (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod uploads;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use common::Role;
use document_store::DocumentStore;
use domain::catalog::{MAX_IMAGE_BYTES, MAX_IMAGES_PER_UPLOAD};
use domain::{
    CatalogService, DomainError, ImageStore, OrderService, ReviewService, User, UserService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::{IdentityProvider, InMemoryIdentityProvider};

/// Room for multipart framing on top of the image bytes themselves.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    pub catalog: CatalogService<S>,
    pub orders: OrderService<S>,
    pub reviews: ReviewService<S>,
    pub users: UserService<S>,
    pub identity: Arc<dyn IdentityProvider>,
    pub images: Arc<dyn ImageStore>,
}

impl<S: DocumentStore + Clone> AppState<S> {
    /// Builds every service over the same document store.
    pub fn new(
        store: S,
        identity: Arc<dyn IdentityProvider>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            reviews: ReviewService::new(store.clone()),
            users: UserService::new(store),
            identity,
            images,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let admin = Router::new()
        .route(
            "/products",
            get(routes::catalog::admin_list::<S>).post(routes::catalog::admin_create::<S>),
        )
        .route(
            "/products/{id}",
            put(routes::catalog::admin_update::<S>).delete(routes::catalog::admin_delete::<S>),
        )
        .route(
            "/products/images",
            post(routes::catalog::admin_upload_images::<S>).layer(DefaultBodyLimit::max(
                MAX_IMAGES_PER_UPLOAD * MAX_IMAGE_BYTES + MULTIPART_OVERHEAD,
            )),
        )
        .route("/orders", get(routes::orders::admin_list::<S>))
        .route(
            "/orders/{id}",
            get(routes::orders::admin_get::<S>).delete(routes::orders::admin_delete::<S>),
        )
        .route(
            "/orders/{id}/status",
            put(routes::orders::admin_transition::<S>),
        )
        .route("/reviews", get(routes::reviews::admin_list::<S>))
        .route(
            "/reviews/{id}",
            axum::routing::delete(routes::reviews::admin_delete::<S>),
        );

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", get(routes::catalog::search::<S>))
        .route("/products/{id}", get(routes::catalog::get::<S>))
        .route(
            "/products/{id}/reviews",
            get(routes::reviews::list_for_product::<S>).post(routes::reviews::create::<S>),
        )
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders/mine", get(routes::orders::mine::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/users", post(routes::users::register::<S>))
        .route("/users/login", post(routes::users::login::<S>))
        .route("/users/me", get(routes::users::me::<S>))
        .nest("/admin", admin)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state with an in-memory identity provider.
///
/// The provider is returned alongside so callers can bind tokens directly.
pub fn create_default_state<S: DocumentStore + Clone + 'static>(
    store: S,
    images: Arc<dyn ImageStore>,
) -> (Arc<AppState<S>>, InMemoryIdentityProvider) {
    let identity = InMemoryIdentityProvider::new();
    let state = Arc::new(AppState::new(store, Arc::new(identity.clone()), images));
    (state, identity)
}

/// Ensures an administrator account exists for `email` and binds `token` to it.
#[tracing::instrument(skip(state, identity, token))]
pub async fn bootstrap_admin<S: DocumentStore + Clone + 'static>(
    state: &AppState<S>,
    identity: &InMemoryIdentityProvider,
    email: &str,
    token: &str,
) -> Result<User, DomainError> {
    let user = match state.users.find_by_email(email).await? {
        Some(user) => user,
        None => state.users.register(email, Role::Admin).await?,
    };
    if user.role != Role::Admin {
        return Err(DomainError::Conflict(format!(
            "{email} is registered without the admin role"
        )));
    }

    identity.bind(token, user.caller()).await;
    tracing::info!(user_id = %user.id, "bootstrap administrator ready");
    Ok(user)
}
