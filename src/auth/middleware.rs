use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::api_docs::ErrorResponse;
use crate::auth::jwt::{self, TokenType};

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Validates the bearer access token and stores its claims in the request
/// extensions for the `Caller` extractor.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    // Get authorization header
    let auth_header = match request.headers().get(header::AUTHORIZATION) {
        Some(header) => header,
        None => return unauthorized("Missing Authorization header"),
    };

    // Parse token from header
    let auth_header_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(_) => return unauthorized("Invalid Authorization header"),
    };

    // Extract token from "Bearer {token}"
    let token = match auth_header_str.strip_prefix("Bearer ") {
        Some(token) => token,
        None => return unauthorized("Invalid token format"),
    };

    match jwt::validate_token(token, TokenType::Access) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("Rejected access token: {}", e);
            unauthorized("Invalid or expired token")
        }
    }
}
