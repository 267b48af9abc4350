use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

pub const API_KEY_HEADER: &str = "X-API-Key";

pub struct AuthService {
    enabled: bool,
    api_keys: Arc<Vec<String>>,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            enabled: config.enabled,
            api_keys: Arc::new(config.api_keys.clone()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn validate_key(&self, key: &str) -> bool {
        // If authentication is disabled, allow all requests
        if !self.enabled {
            return true;
        }

        // A missing header never matches; with no configured keys nothing does
        if key.is_empty() {
            return false;
        }

        self.api_keys
            .iter()
            .any(|k| bool::from(k.as_bytes().ct_eq(key.as_bytes())))
    }
}

pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    request: Request,
    next: Next,
) -> Response {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if auth_service.validate_key(api_key) {
        next.run(request).await
    } else {
        (StatusCode::UNAUTHORIZED, "Invalid or missing API key").into_response()
    }
}
