use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Shopfront API",
            "version": version,
            "description": "Storefront and booking API",
            "endpoints": {
                "auth": "/api/v1/auth/{customer,staff}/{register,login}, /api/v1/auth/me",
                "products": "/api/v1/products[/:id] (read public, write staff)",
                "services": "/api/v1/services[/:id] (read public, write staff)",
                "bookings": "/api/v1/bookings[/:id] (authenticated)",
                "payments": "/api/v1/payments[/:id] (list and update staff, delete admin)",
                "reviews": "/api/v1/reviews[/:id], /api/v1/reviews/service/:serviceId",
                "orders": "/api/v1/orders[/:id] (list, update and delete staff)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        )),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("Database temporarily unavailable"))
        }
    }
}
