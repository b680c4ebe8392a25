// =============================================================================
// Bearer Token Authentication — Axum extractor
// =============================================================================
//
// Guards the mutating endpoints.  The expected token comes from
// `ALPHA_VISION_ADMIN_TOKEN` at startup and lives on `AppState`; when it is
// unset every guarded request is refused.  Comparison runs in constant time.
//
//   async fn handler(_auth: AuthBearer, State(state): State<Arc<AppState>>, ...)
//
// A missing or wrong token short-circuits with 403 before the handler runs.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::app_state::AppState;

/// Environment variable holding the admin token.
pub const ADMIN_TOKEN_ENV: &str = "ALPHA_VISION_ADMIN_TOKEN";

/// Byte-wise equality that inspects every byte regardless of where the first
/// mismatch is. Lengths are compared up front.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Proof that the request carried the admin token.
pub struct AuthBearer;

pub struct AuthRejection {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthBearer {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            warn!("{ADMIN_TOKEN_ENV} is not set — rejecting authenticated request");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Server authentication not configured",
            });
        };

        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let Some(token) = token else {
            warn!("Missing or malformed Authorization header");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Missing or invalid authorization token",
            });
        };

        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            warn!("Invalid admin token presented");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Invalid authorization token",
            });
        }

        Ok(AuthBearer)
    }
}
