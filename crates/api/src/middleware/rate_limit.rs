use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use biolens_core::client_identity::resolve_client_identity;

use crate::error::{rate_limit_headers, AppError};
use crate::state::AppState;

/// Admit or reject a request against its tier's sliding window.
///
/// Windows are keyed by client identity and request path. Admitted
/// responses carry `X-RateLimit-*` headers; rejected ones get a 429 with
/// `Retry-After`. Runs without `ConnectInfo` too, in which case the peer is
/// reported as unknown.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let config = &state.config.rate_limit;
    let path = request.uri().path().to_owned();
    if !config.enabled || config.is_exempt(&path) {
        return next.run(request).await;
    }

    let client = client_identity(&request);
    let policy = config.policy_for(request.method(), &path);

    let decision = match state.rate_limiter.check(&client, &path, policy).await {
        Ok(decision) => decision,
        Err(e) => return AppError::from(e).into_response(),
    };

    if !decision.allowed {
        return AppError::RateLimited(decision.quota).into_response();
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .extend(rate_limit_headers(&decision.quota));
    response
}

fn client_identity(request: &Request) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let headers: &HeaderMap = request.headers();

    resolve_client_identity(
        peer.as_deref(),
        header_str(headers, "x-forwarded-for"),
        header_str(headers, "x-real-ip"),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
