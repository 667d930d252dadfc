//! Extractors whose rejections render as [`AppError`] bodies.

use crate::api::models::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// JSON request body. See [`axum::Json`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// URI path parameters. See [`axum::extract::Path`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
