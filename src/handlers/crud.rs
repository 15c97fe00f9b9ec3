//! List / show / create / update / delete, shared by every resource
//!
//! Handlers are generic over the create body; `T::resource()` picks the table and
//! the filter and sort whitelists.

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::Value;

use crate::database::Record;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{json_body, query_params, ApiResponse, ApiResult};
use crate::models::{self, NewRecord};
use crate::resources::Resource;
use crate::state::AppState;

/// Path ids are positive integers
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_field("id", "must be a positive integer")),
    }
}

pub async fn list_with(state: &AppState, resource: &Resource, filter: Filter) -> ApiResult<Vec<Record>> {
    let rows = state.store.find_all(resource, &filter).await?;
    tracing::debug!("Listed {} {}", rows.len(), resource.name);
    Ok(ApiResponse::success(
        rows.into_iter().map(|row| resource.present(row)).collect(),
    ))
}

pub async fn list<T: NewRecord>(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<Vec<Record>> {
    let resource = T::resource();
    let query = query_params(query)?;
    let filter = Filter::from_query(resource, &query)?;
    list_with(&state, resource, filter).await
}

pub async fn show<T: NewRecord>(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Record> {
    let resource = T::resource();
    let id = parse_id(&id)?;

    match state.store.find_by_id(resource, id).await? {
        Some(row) => Ok(ApiResponse::success(resource.present(row))),
        None => Err(ApiError::not_found(resource.not_found_message())),
    }
}

pub async fn create<T: NewRecord>(
    State(state): State<AppState>,
    body: Result<Json<T>, JsonRejection>,
) -> ApiResult<Record> {
    let resource = T::resource();
    let record = models::prepare(json_body(body)?)?;

    let row = state.store.create(resource, record).await?;
    let id = row.get(resource.primary_key).cloned().unwrap_or_default();
    tracing::info!("Created {} {}", resource.label.to_lowercase(), id);
    Ok(ApiResponse::created(resource.present(row)))
}

pub async fn update<T: NewRecord>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Record> {
    let resource = T::resource();
    let id = parse_id(&id)?;

    let body = match json_body(body)? {
        Value::Object(map) => map,
        _ => return Err(ApiError::bad_request("Request body must be a JSON object")),
    };
    let changes = models::prepare_changes::<T>(&body)?;

    match state.store.update(resource, id, changes).await? {
        Some(row) => Ok(ApiResponse::success(resource.present(row))),
        None => Err(ApiError::not_found(resource.not_found_message())),
    }
}

pub async fn destroy<T: NewRecord>(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let resource = T::resource();
    let id = parse_id(&id)?;

    if state.store.delete(resource, id).await? {
        tracing::info!("Deleted {} {}", resource.label.to_lowercase(), id);
        Ok(ApiResponse::no_content())
    } else {
        Err(ApiError::not_found(resource.not_found_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-1").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("1; DROP TABLE products").is_err());
    }
}
