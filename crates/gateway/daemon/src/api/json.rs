//! JSON body extractor with API-shaped rejections

use crate::error::ApiError;
use axum::extract::FromRequest;

/// `axum::Json` whose rejection renders as an [`ApiError`] body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
