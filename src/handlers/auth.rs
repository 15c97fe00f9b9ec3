use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::{Principal, Role, UserClaims};
use crate::database::{Record, StoreError};
use crate::error::ApiError;
use crate::filter::FieldValue;
use crate::middleware::{json_body, ApiResponse, ApiResult};
use crate::models::{CustomerRegistration, Login, StaffRegistration};
use crate::resources::{Resource, CUSTOMERS, STAFF};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid Credentials";
const ALREADY_REGISTERED: &str = "User already registered";

/// Which account table a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Customer,
    Staff,
}

impl AccountKind {
    pub fn resource(self) -> &'static Resource {
        match self {
            AccountKind::Customer => &CUSTOMERS,
            AccountKind::Staff => &STAFF,
        }
    }

    /// Build the `user` claim from a stored account row
    pub fn claims_for(self, row: &Record) -> Result<UserClaims, ApiError> {
        let resource = self.resource();
        let id = row.get(resource.primary_key).and_then(Value::as_i64).ok_or_else(|| {
            tracing::error!("{} row without a numeric {}", resource.table, resource.primary_key);
            ApiError::internal_server_error("Server Error")
        })?;
        let text = |key: &str| row.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        let role = row
            .get("role")
            .and_then(Value::as_str)
            .map(|r| Role::from(r.to_string()));

        let (cust_id, staff_id) = match self {
            AccountKind::Customer => (Some(id), None),
            AccountKind::Staff => (None, Some(id)),
        };

        Ok(UserClaims {
            cust_id,
            staff_id,
            name: text("name"),
            email: text("email"),
            role,
        })
    }
}

async fn ensure_email_free(state: &AppState, kind: AccountKind, email: &str) -> Result<(), ApiError> {
    let existing = state
        .store
        .find_one_by(kind.resource(), "email", FieldValue::Text(email.trim().to_string()))
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(ALREADY_REGISTERED));
    }
    Ok(())
}

/// Insert an account row; a racing duplicate still surfaces as a conflict
pub async fn create_account(state: &AppState, kind: AccountKind, record: Record) -> Result<Record, ApiError> {
    state
        .store
        .create(kind.resource(), record)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ApiError::conflict(ALREADY_REGISTERED),
            other => ApiError::from(other),
        })
}

fn token_response(state: &AppState, kind: AccountKind, row: &Record) -> Result<Value, ApiError> {
    let claims = kind.claims_for(row)?;
    let token = state.tokens.issue(&claims)?;
    Ok(json!({ "token": token }))
}

async fn login(state: &AppState, kind: AccountKind, body: Login) -> ApiResult<Value> {
    body.validate().finish()?;

    let row = state
        .store
        .find_one_by(kind.resource(), "email", FieldValue::Text(body.email.trim().to_string()))
        .await?;
    let Some(row) = row else {
        tracing::info!("Login for unknown {} account", kind.resource().name);
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    };

    let stored_hash = row
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if !verify_password_blocking(body.password, stored_hash).await? {
        tracing::info!("Wrong password for {} account", kind.resource().name);
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    Ok(ApiResponse::success(token_response(state, kind, &row)?))
}

pub async fn customer_register(
    State(state): State<AppState>,
    body: Result<Json<CustomerRegistration>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(body)?;
    body.validate().finish()?;
    ensure_email_free(&state, AccountKind::Customer, &body.email).await?;

    let hash = hash_password_blocking(body.password.clone()).await?;
    let row = create_account(&state, AccountKind::Customer, body.into_record(hash)).await?;
    let id = row.get("custId").cloned().unwrap_or_default();
    tracing::info!("Registered customer {}", id);

    Ok(ApiResponse::created(token_response(&state, AccountKind::Customer, &row)?))
}

pub async fn customer_login(
    State(state): State<AppState>,
    body: Result<Json<Login>, JsonRejection>,
) -> ApiResult<Value> {
    login(&state, AccountKind::Customer, json_body(body)?).await
}

pub async fn staff_register(
    State(state): State<AppState>,
    body: Result<Json<StaffRegistration>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(body)?;
    body.validate().finish()?;
    ensure_email_free(&state, AccountKind::Staff, &body.email).await?;

    let hash = hash_password_blocking(body.password.clone()).await?;
    let row = create_account(&state, AccountKind::Staff, body.into_record(hash, Role::Staff)).await?;
    let id = row.get("staffId").cloned().unwrap_or_default();
    tracing::info!("Registered staff {}", id);

    Ok(ApiResponse::created(token_response(&state, AccountKind::Staff, &row)?))
}

pub async fn staff_login(
    State(state): State<AppState>,
    body: Result<Json<Login>, JsonRejection>,
) -> ApiResult<Value> {
    login(&state, AccountKind::Staff, json_body(body)?).await
}

/// The principal the bearer token resolved to
pub async fn me(principal: Principal) -> ApiResult<Value> {
    Ok(ApiResponse::success(principal.to_json()))
}
