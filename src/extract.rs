//! Router attachment and request extractors.
//!
//! [`attach`] layers an [`OracleRegistry`] onto an axum `Router` as an
//! extension (the framework's decoration mechanism). Handlers then take
//! [`Oracle`] or [`OracleRegistry`] as extractor arguments; rejections
//! render through [`OracleError`]'s JSON response.

use axum::Router;
use axum::extract::{Extension, FromRequestParts};
use axum::http::request::Parts;

use crate::error::OracleError;
use crate::pool::Oracle;
use crate::registry::OracleRegistry;

/// Attaches the registry to a router.
///
/// Equivalent to `router.layer(Extension(registry))`; kept as a named
/// entry point so the attachment reads as the plugin registration it is.
#[must_use]
pub fn attach<S>(router: Router<S>, registry: OracleRegistry) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(Extension(registry))
}

impl<S> FromRequestParts<S> for OracleRegistry
where
    S: Send + Sync,
{
    type Rejection = OracleError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(OracleError::NotAttached)
    }
}

impl<S> FromRequestParts<S> for Oracle
where
    S: Send + Sync,
{
    type Rejection = OracleError;

    /// Resolves the default pool from the attached registry.
    ///
    /// Named pools are reached through the [`OracleRegistry`] extractor
    /// and [`OracleRegistry::get`].
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let registry = OracleRegistry::from_request_parts(parts, state).await?;
        registry.default_pool().await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn default_pool_handler(_db: Oracle) -> &'static str {
        "ok"
    }

    async fn registry_handler(registry: OracleRegistry) -> String {
        format!("{} pools", registry.len().await)
    }

    fn request() -> Request<Body> {
        let Ok(req) = Request::builder().uri("/").body(Body::empty()) else {
            panic!("request construction failed");
        };
        req
    }

    async fn body_string(response: axum::response::Response) -> String {
        let Ok(collected) = response.into_body().collect().await else {
            panic!("body read failed");
        };
        String::from_utf8_lossy(&collected.to_bytes()).into_owned()
    }

    #[tokio::test]
    async fn extractor_rejects_when_plugin_not_attached() {
        let app = Router::new().route("/", get(default_pool_handler));

        let Ok(response) = app.oneshot(request()).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains("has not been attached"));
        assert!(body.contains("3003"));
    }

    #[tokio::test]
    async fn extractor_rejects_when_no_default_pool_registered() {
        let app = attach(
            Router::new().route("/", get(default_pool_handler)),
            OracleRegistry::new(),
        );

        let Ok(response) = app.oneshot(request()).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(body.contains("no oracle pool registered"));
    }

    #[tokio::test]
    async fn registry_extractor_resolves_the_attached_registry() {
        let app = attach(
            Router::new().route("/", get(registry_handler)),
            OracleRegistry::new(),
        );

        let Ok(response) = app.oneshot(request()).await else {
            panic!("request failed");
        };
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "0 pools");
    }
}
