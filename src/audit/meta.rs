use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use ipnet::IpNet;

use crate::error::AppError;
use crate::state::SharedState;

/// Request-scoped context attached to audit events. The recorder never reads
/// ambient state; whatever it records comes through this struct, filled in by
/// the route handler.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Human label of the originating UI page, declared by the client via the
    /// `x-source-page` header.
    pub source_page: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(
        headers: &HeaderMap,
        peer_addr: Option<IpAddr>,
        trusted_proxies: &[IpNet],
    ) -> Self {
        let source_page = headers
            .get("x-source-page")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Self {
            source_page,
            ip_address: Some(extract_ip(headers, peer_addr, trusted_proxies)),
            user_agent,
            session_id: None,
        }
    }

    /// Attach the authenticated session id. Handlers call this after auth
    /// extraction since the session is not known at header level.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

impl FromRequestParts<SharedState> for RequestMeta {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());

        Ok(RequestMeta::from_headers(
            &parts.headers,
            peer,
            &state.config.trusted_proxies,
        ))
    }
}

fn extract_ip(headers: &HeaderMap, peer_addr: Option<IpAddr>, trusted_proxies: &[IpNet]) -> String {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));

    // Only trust X-Forwarded-For if the direct connection is from a trusted proxy
    if !trusted_proxies.is_empty() && trusted_proxies.iter().any(|net| net.contains(&peer)) {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            // Take the first (leftmost) IP that isn't a trusted proxy
            for ip_str in xff.split(',').map(|s| s.trim()) {
                if let Ok(ip) = ip_str.parse::<IpAddr>() {
                    if !trusted_proxies.iter().any(|net| net.contains(&ip)) {
                        return ip.to_string();
                    }
                }
            }
        }
    }

    peer.to_string()
}
