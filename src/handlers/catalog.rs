//! Read routes beyond plain CRUD: product ordering by path and reviews per service

use axum::extract::{Path, State};

use super::crud::{list_with, parse_id};
use crate::database::Record;
use crate::error::ApiError;
use crate::filter::{FieldValue, Filter, FilterOrder};
use crate::middleware::ApiResult;
use crate::resources::{PRODUCTS, REVIEWS};
use crate::state::AppState;

/// `GET /products/o/:field/:dir`; an unsortable field falls back to the default order
pub async fn products_ordered(
    State(state): State<AppState>,
    Path((field, dir)): Path<(String, String)>,
) -> ApiResult<Vec<Record>> {
    let order = FilterOrder::resolve(Some(field.as_str()), Some(dir.as_str()), &PRODUCTS.sort);
    let filter = Filter::new(&PRODUCTS)?.order_by(order);
    list_with(&state, &PRODUCTS, filter).await
}

/// `GET /reviews/service/:serviceId`
pub async fn reviews_for_service(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> ApiResult<Vec<Record>> {
    let service_id = parse_id(&service_id).map_err(|_| ApiError::invalid_field("serviceId", "must be a positive integer"))?;
    let filter = Filter::new(&REVIEWS)?.where_equals(&REVIEWS, "serviceId", FieldValue::Integer(service_id))?;
    list_with(&state, &REVIEWS, filter).await
}
