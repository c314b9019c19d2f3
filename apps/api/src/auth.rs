//! Caller identity plumbing.
//!
//! Token verification happens upstream; the gateway forwards the resolved
//! subject as `x-user-id` / `x-user-email` headers. This layer parses them
//! into a request extension, and the `Identity` extractor is the single
//! place handlers learn who is calling.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::errors::AppError;

/// One resolved caller per request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Parses the gateway identity headers into an `Identity` extension.
///
/// Requests without a parsable identity still pass through; extractors
/// reject them at the handler boundary, which keeps unauthenticated routes
/// like /health reachable.
pub async fn identity_layer(mut req: Request, next: Next) -> Response {
    if let Some(identity) = identity_from_headers(&req) {
        req.extensions_mut().insert(identity);
    }
    next.run(req).await
}

fn identity_from_headers(req: &Request) -> Option<Identity> {
    let user_id = req
        .headers()
        .get("x-user-id")?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let email = req.headers().get("x-user-email")?.to_str().ok()?.to_string();
    Some(Identity { user_id, email })
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_headers(headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_identity_parsed_from_headers() {
        let id = Uuid::new_v4();
        let req = request_with_headers(&[
            ("x-user-id", &id.to_string()),
            ("x-user-email", "user@example.com"),
        ]);
        let identity = identity_from_headers(&req).unwrap();
        assert_eq!(identity.user_id, id);
        assert_eq!(identity.email, "user@example.com");
    }

    #[test]
    fn test_malformed_user_id_yields_no_identity() {
        let req = request_with_headers(&[
            ("x-user-id", "not-a-uuid"),
            ("x-user-email", "user@example.com"),
        ]);
        assert!(identity_from_headers(&req).is_none());
    }

    #[test]
    fn test_missing_email_yields_no_identity() {
        let id = Uuid::new_v4();
        let req = request_with_headers(&[("x-user-id", &id.to_string())]);
        assert!(identity_from_headers(&req).is_none());
    }
}
