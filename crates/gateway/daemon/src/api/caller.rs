//! Caller identity extraction.
//!
//! The organization and the acting user come from request headers; there is
//! no token verification at this layer.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use gateway_commit::RequestContext;

use crate::error::ApiError;

/// Header naming the caller's organization (required)
pub const ORG_HEADER: &str = "x-org-name";

/// Header naming the enrolled user to act as (optional)
pub const USER_HEADER: &str = "x-user-name";

/// The resolved caller of one request.
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let org = header(parts, ORG_HEADER).ok_or_else(|| {
            ApiError::Unauthorized("Missing organization header X-Org-Name".to_string())
        })?;

        let mut ctx = RequestContext::new(org);
        if let Some(user) = header(parts, USER_HEADER) {
            ctx = ctx.with_user(user);
        }
        Ok(Caller(ctx))
    }
}
