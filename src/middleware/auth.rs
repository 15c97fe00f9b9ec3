use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Principal, RoleGate};
use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the bearer token to a `Principal` and attach it to the request.
/// No role check happens here.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(|msg| {
        tracing::debug!("Rejected request to {}: {}", request.uri().path(), msg);
        ApiError::unauthenticated(msg)
    })?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::warn!("Token verification failed for {}: {}", request.uri().path(), e);
        ApiError::from(e)
    })?;

    let principal = Principal::try_from(claims.user).map_err(|e| {
        tracing::warn!("Token carried unusable identity: {}", e);
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Staff and admins only; must run after `authenticate`
pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    require_role(RoleGate::StaffOrAbove, request, next).await
}

/// Admins only; must run after `authenticate`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    require_role(RoleGate::AdminOnly, request, next).await
}

async fn require_role(gate: RoleGate, request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(principal) = request.extensions().get::<Principal>() else {
        return Err(ApiError::unauthenticated("Authentication required"));
    };

    if !gate.permits(principal.role) {
        tracing::warn!(
            "{:?} denied {} {} for account {} (role {:?})",
            gate,
            request.method(),
            request.uri().path(),
            principal.id(),
            principal.role
        );
        return Err(ApiError::forbidden("Access denied"));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty bearer token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

/// Handlers behind `authenticate` can take the resolved principal directly
#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))
    }
}
