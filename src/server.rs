use crate::config::Config;
use crate::handler::{SubmissionHandler, SubmissionRequest};
use crate::submission::SubmissionInput;
use axum::body::Body;
use axum::extract::{ConnectInfo, DefaultBodyLimit, FromRequest, Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Form, Json, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    handler: Arc<SubmissionHandler>,
    trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(handler: SubmissionHandler, trust_forwarded_for: bool) -> Self {
        Self {
            handler: Arc::new(handler),
            trust_forwarded_for,
        }
    }
}

pub fn build_router(state: AppState, endpoint_path: &str, max_body_bytes: usize) -> Router {
    Router::new()
        .route(endpoint_path, any(submit_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(from_fn(cors_middleware))
        .with_state(state)
}

pub struct ContactServer {
    router: Router,
}

impl ContactServer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let handler = SubmissionHandler::new(config)?;
        Ok(Self::with_handler(config, handler))
    }

    pub fn with_handler(config: &Config, handler: SubmissionHandler) -> Self {
        let state = AppState::new(handler, config.server.trust_forwarded_for);
        let router = build_router(
            state,
            &config.server.endpoint_path,
            config.server.max_body_bytes,
        );
        Self { router }
    }

    pub async fn run(self, bind_address: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(bind_address).await?;
        log::info!("Contact endpoint listening on {}", listener.local_addr()?);
        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
            log::info!("Received shutdown signal, stopping");
        })
        .await
    }

    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
        Ok(())
    }
}

async fn cors_middleware(request: Request<Body>, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }
    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

async fn submit_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let method = request.method().clone();
    let headers = request.headers().clone();

    let client_id = state
        .trust_forwarded_for
        .then(|| forwarded_for(&headers))
        .flatten()
        .unwrap_or_else(|| peer.ip().to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let input = if method == Method::POST {
        read_form(request, &state).await
    } else {
        SubmissionInput::new()
    };

    let response = state
        .handler
        .handle(SubmissionRequest {
            method: method.to_string(),
            input,
            client_id,
            user_agent,
        })
        .await;
    Json(response).into_response()
}

/// Accepts both urlencoded and multipart bodies. Anything unreadable is
/// treated as an empty form and fails validation downstream.
async fn read_form(request: Request<Body>, state: &AppState) -> SubmissionInput {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        match Multipart::from_request(request, state).await {
            Ok(multipart) => read_multipart(multipart).await,
            Err(e) => {
                log::debug!("Rejected multipart body: {e}");
                SubmissionInput::new()
            }
        }
    } else {
        match Form::<HashMap<String, String>>::from_request(request, state).await {
            Ok(Form(fields)) => SubmissionInput::from_pairs(fields),
            Err(e) => {
                log::debug!("Rejected form body: {e}");
                SubmissionInput::new()
            }
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> SubmissionInput {
    let mut fields = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                // Lossy decode keeps a non-UTF-8 field present.
                match field.bytes().await {
                    Ok(bytes) => {
                        fields.push((name, String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    Err(e) => log::debug!("Unreadable multipart field {name}: {e}"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("Malformed multipart body: {e}");
                break;
            }
        }
    }
    SubmissionInput::from_pairs(fields)
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    if first
        .bytes()
        .all(|b| b.is_ascii_hexdigit() || b == b'.' || b == b':')
    {
        Some(first.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_takes_first_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(forwarded_for(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_forwarded_for_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("<script>"));
        assert_eq!(forwarded_for(&headers), None);
        assert_eq!(forwarded_for(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cors_headers() {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers);
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "POST");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    }
}
