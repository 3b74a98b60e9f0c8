//! Client identity for admission keys.

use axum::http::HeaderMap;
use std::net::SocketAddr;

const UNKNOWN_CLIENT: &str = "unknown";

/// The parts of a request a key function may look at.
#[derive(Debug, Clone, Copy)]
pub struct RequestMeta<'a> {
    headers: &'a HeaderMap,
    remote_addr: Option<SocketAddr>,
}

impl<'a> RequestMeta<'a> {
    /// Wraps request headers and the peer address, if known.
    pub fn new(headers: &'a HeaderMap, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            headers,
            remote_addr,
        }
    }

    /// Request headers.
    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    /// Peer address of the connection.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Derives the admission key for a request.
///
/// An empty key means "no opinion"; the HTTP layer then falls back to
/// [`ForwardedClientKey`].
pub trait ClientKey: Send + Sync {
    /// Key identifying the client behind `request`.
    fn client_key(&self, request: &RequestMeta<'_>) -> String;
}

impl<F> ClientKey for F
where
    F: Fn(&RequestMeta<'_>) -> String + Send + Sync,
{
    fn client_key(&self, request: &RequestMeta<'_>) -> String {
        self(request)
    }
}

/// Client address from proxy headers, then the socket.
///
/// Order: first entry of `X-Forwarded-For`, then `X-Real-IP`, then the
/// remote address, then `"unknown"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedClientKey;

impl ClientKey for ForwardedClientKey {
    fn client_key(&self, request: &RequestMeta<'_>) -> String {
        if let Some(first) = request
            .header("x-forwarded-for")
            .and_then(|raw| raw.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return first.to_string();
        }
        if let Some(real_ip) = request.header("x-real-ip") {
            return real_ip.to_string();
        }
        request
            .remote_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
    }
}
