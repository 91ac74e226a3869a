//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each accepted
//! connection runs on its own task; requests share only the immutable
//! `AppState`.

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::auth::{CredentialVerifier, IdentityResolver, JwtVerifier};
use crate::config::Args;
use crate::routes::{self, error_response, CommentPath, FullBody};
use crate::services::EngagementService;
use crate::store::ItemStore;
use crate::types::{RatesvcError, Result};

/// Largest request body accepted
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Star and comment operations
    pub engagement: EngagementService,
    /// Caller identity from the session cookie
    pub identity: IdentityResolver,
}

impl AppState {
    /// Build state from configuration and a store
    ///
    /// Fails only if a configured JWT key is unusable. A missing key is
    /// allowed: reads still work and writes are rejected.
    pub fn new(args: Args, store: Arc<dyn ItemStore>) -> Result<Self> {
        let verifier: Option<Arc<dyn CredentialVerifier>> = match args.jwt_key.as_deref() {
            Some(key) => Some(Arc::new(JwtVerifier::new(key)?)),
            None => None,
        };

        Ok(Self::with_services(
            args,
            EngagementService::with_defaults(store),
            verifier,
        ))
    }

    /// Build state from already constructed collaborators
    pub fn with_services(
        args: Args,
        engagement: EngagementService,
        verifier: Option<Arc<dyn CredentialVerifier>>,
    ) -> Self {
        let identity = IdentityResolver::new(args.auth_cookie.clone(), verifier);
        Self {
            args,
            engagement,
            identity,
        }
    }
}

/// Start the HTTP server; returns on Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let addr = state.args.listen_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("ratesvc listening on {}", addr);

    loop {
        let (stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                return Ok(());
            }
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let io = TokioIo::new(stream);

            let service = service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { handle_request(state, addr, req).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection from {}: {:?}", addr, err);
            }
        });
    }
}

/// Read the body and hand the request to the router
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<FullBody>, Infallible> {
    let request_id = Uuid::new_v4();
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();
    let span = info_span!("request", %request_id, method = %parts.method, path = %path);

    async move {
        info!("[{}] {} {}", addr, parts.method, path);

        let body: Bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!("Request body error: {}", e);
                return Ok::<_, Infallible>(error_response(RatesvcError::BadRequest(
                    "could not read request body".into(),
                )));
            }
        };

        let response = dispatch(&state, &parts.method, &path, &parts.headers, &body).await;
        debug!(status = response.status().as_u16(), "Response sent");
        Ok(response)
    }
    .instrument(span)
    .await
}

/// Route a fully read request
pub async fn dispatch(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Response<FullBody> {
    match (method, path) {
        (&Method::GET, "/live") => routes::liveness_check(),
        (&Method::GET, "/ready") => routes::readiness_check(state).await,
        (&Method::GET, "/version") => routes::version_info(),

        (&Method::GET, "/v1/stars") => routes::handle_list_stars(state, headers).await,
        (&Method::PUT, "/v1/stars") => routes::handle_update_star(state, headers, body).await,
        (_, "/v1/stars") => method_not_allowed(method, path),

        (_, p) if p.starts_with(routes::comments::COMMENTS_PREFIX) => {
            match routes::parse_comment_path(p) {
                Some(CommentPath {
                    item_id,
                    comment_id: None,
                }) => match *method {
                    Method::GET => routes::handle_list_comments(state, &item_id).await,
                    Method::POST => {
                        routes::handle_create_comment(state, headers, &item_id, body).await
                    }
                    _ => method_not_allowed(method, path),
                },
                Some(CommentPath {
                    item_id,
                    comment_id: Some(comment_id),
                }) => match *method {
                    Method::DELETE => {
                        routes::handle_delete_comment(state, headers, &item_id, &comment_id).await
                    }
                    _ => method_not_allowed(method, path),
                },
                None => not_found(path),
            }
        }

        _ => not_found(path),
    }
}

fn not_found(path: &str) -> Response<FullBody> {
    error_response(RatesvcError::NotFound(format!("no route for {}", path)))
}

fn method_not_allowed(method: &Method, path: &str) -> Response<FullBody> {
    error_response(RatesvcError::MethodNotAllowed(format!(
        "{} not allowed on {}",
        method, path
    )))
}
