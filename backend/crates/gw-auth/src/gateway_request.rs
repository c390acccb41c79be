use std::net::SocketAddr;

use http::HeaderMap;
use http::header::AUTHORIZATION;

const BEARER_PREFIX: &str = "bearer";

/// The parts of an incoming request the authorization pipeline reads
#[derive(Debug, Clone, Copy)]
pub struct GatewayRequest<'a> {
    headers: &'a HeaderMap,
    remote_addr: Option<SocketAddr>,
}

impl<'a> GatewayRequest<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self {
            headers,
            remote_addr: None,
        }
    }

    /// Attach the socket peer address, used when no `X-Forwarded-For` is present
    pub fn with_remote_addr(mut self, remote_addr: Option<SocketAddr>) -> Self {
        self.remote_addr = remote_addr;
        self
    }

    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// First value of header `name`, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Token from `Authorization: Bearer <token>`; the scheme is case-insensitive
    pub fn bearer_token(&self) -> Option<&'a str> {
        let value = self
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())?
            .trim();

        let scheme = value.get(..BEARER_PREFIX.len())?;
        if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
            return None;
        }

        let rest = &value[BEARER_PREFIX.len()..];
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }

        let token = rest.trim();
        (!token.is_empty()).then_some(token)
    }
}
