use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{auth, catalog, crud, system};
use crate::middleware::{authenticate, require_admin, require_staff};
use crate::models::{Booking, Order, Payment, Product, Review, Service};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// The full HTTP surface. CORS and body limits are applied by the caller.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes())
        .merge(authenticated_routes(&state))
        .merge(staff_routes(&state))
        .merge(admin_routes(&state));

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest(API_PREFIX, api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        // Token acquisition
        .route("/auth/customer/register", post(auth::customer_register))
        .route("/auth/customer/login", post(auth::customer_login))
        .route("/auth/staff/register", post(auth::staff_register))
        .route("/auth/staff/login", post(auth::staff_login))
        // Catalog reads
        .route("/products", get(crud::list::<Product>))
        .route("/products/:id", get(crud::show::<Product>))
        .route("/products/o/:field/:dir", get(catalog::products_ordered))
        .route("/services", get(crud::list::<Service>))
        .route("/services/:id", get(crud::show::<Service>))
        .route("/reviews", get(crud::list::<Review>))
        .route("/reviews/:id", get(crud::show::<Review>))
        .route("/reviews/service/:serviceId", get(catalog::reviews_for_service))
}

fn authenticated_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/bookings", get(crud::list::<Booking>).post(crud::create::<Booking>))
        .route(
            "/bookings/:id",
            get(crud::show::<Booking>)
                .put(crud::update::<Booking>)
                .delete(crud::destroy::<Booking>),
        )
        .route("/payments", post(crud::create::<Payment>))
        .route("/payments/:id", get(crud::show::<Payment>))
        .route("/reviews", post(crud::create::<Review>))
        .route(
            "/reviews/:id",
            put(crud::update::<Review>).delete(crud::destroy::<Review>),
        )
        .route("/orders", post(crud::create::<Order>))
        .route("/orders/:id", get(crud::show::<Order>))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}

fn staff_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/products", post(crud::create::<Product>))
        .route(
            "/products/:id",
            put(crud::update::<Product>).delete(crud::destroy::<Product>),
        )
        .route("/services", post(crud::create::<Service>))
        .route(
            "/services/:id",
            put(crud::update::<Service>).delete(crud::destroy::<Service>),
        )
        .route("/payments", get(crud::list::<Payment>))
        .route("/payments/:id", put(crud::update::<Payment>))
        .route("/orders", get(crud::list::<Order>))
        .route(
            "/orders/:id",
            put(crud::update::<Order>).delete(crud::destroy::<Order>),
        )
        // The last layer added runs first: authenticate, then the role gate
        .route_layer(from_fn(require_staff))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/payments/:id", delete(crud::destroy::<Payment>))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}
