//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the signing handlers
//! - Wire up middleware (request ID, tracing, error envelope, timeout, body limit)
//! - Serve on a pre-bound listener until shutdown is signalled

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::authorizer::TransactionAuthorizer;
use crate::config::SecurityConfig;
use crate::http::handlers;
use crate::http::middleware::envelope_errors;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<TransactionAuthorizer>,
}

/// HTTP server for the signing API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around an authorizer whose key is unlocked.
    pub fn new(authorizer: Arc<TransactionAuthorizer>, security: &SecurityConfig) -> Self {
        let state = AppState { authorizer };
        let router = Self::build_router(security, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(security: &SecurityConfig, state: AppState) -> Router {
        Router::new()
            .route("/status", get(handlers::get_status))
            .route("/sign", post(handlers::post_sign))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn(envelope_errors))
                    .layer(RequestBodyLimitLayer::new(security.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        security.request_timeout_secs,
                    ))),
            )
    }

    /// The configured router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::NonceResolver;
    use crate::keystore::store::tests::unlocked_store;
    use crate::keystore::KeyStore;
    use crate::policy::{Network, TransferPolicy};
    use alloy::primitives::{Address, U256};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const ALLOWED: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn server_with(store: KeyStore) -> HttpServer {
        let policy = TransferPolicy::new(
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            [ALLOWED.parse::<Address>().unwrap()],
            U256::from(1000u64),
            41_000_000_000,
            Network::Sepolia,
        )
        .unwrap();
        let nonces = NonceResolver::new(
            "token".into(),
            Duration::from_secs(1),
            Some("http://127.0.0.1:9".parse().unwrap()),
        )
        .unwrap();
        let authorizer = TransactionAuthorizer::new(Arc::new(store), Arc::new(policy), nonces);
        HttpServer::new(Arc::new(authorizer), &SecurityConfig::default())
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sign_request(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/sign")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_when_unlocked() {
        let response = server_with(unlocked_store())
            .router()
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["message"], "Key is unlocked, ready to proceed");
        assert_eq!(json["data"]["network"], "sepolia");
    }

    #[tokio::test]
    async fn test_status_when_locked() {
        let response = server_with(KeyStore::new())
            .router()
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"][0], "Key is locked, something went really wrong");
    }

    #[tokio::test]
    async fn test_sign_with_supplied_nonce() {
        let body = format!(r#"{{"destination":"{}","wei":500,"nonce":7}}"#, ALLOWED);
        let response = server_with(unlocked_store())
            .router()
            .oneshot(sign_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Transaction successfully signed");
        assert!(json["data"]["transaction"].as_str().unwrap().starts_with("0x"));
        assert_eq!(json["data"]["hash"].as_str().unwrap().len(), 66);
    }

    #[tokio::test]
    async fn test_malformed_body_is_422() {
        let response = server_with(unlocked_store())
            .router()
            .oneshot(sign_request("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert!(json["message"][0]
            .as_str()
            .unwrap()
            .starts_with("Malformed JSON request"));
    }

    #[tokio::test]
    async fn test_over_cap_is_422() {
        let body = format!(r#"{{"destination":"{}","wei":"1500"}}"#, ALLOWED);
        let response = server_with(unlocked_store())
            .router()
            .oneshot(sign_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert_eq!(json["message"][0], "Amount cannot exceed 1000 wei");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_envelope() {
        let response = server_with(unlocked_store())
            .router()
            .oneshot(Request::get("/keys").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["status"], "error");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let body = vec![b' '; SecurityConfig::default().max_body_size + 1];
        let response = server_with(unlocked_store())
            .router()
            .oneshot(sign_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"status": "error", "message": ["Payload Too Large"]})
        );
    }

    #[tokio::test]
    async fn test_wrong_method_is_405_envelope() {
        let response = server_with(unlocked_store())
            .router()
            .oneshot(Request::get("/sign").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key("allow"));
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"status": "error", "message": ["Method Not Allowed"]})
        );
    }
}
