//! `Client` extractor: network details of whoever sent the request.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use stashbox_service::ClientInfo;

/// Client IP and user agent, available with or without a bearer token.
#[derive(Debug, Clone, Default)]
pub struct Client(pub ClientInfo);

impl Client {
    /// Reads the client details from request headers.
    ///
    /// The first `X-Forwarded-For` hop wins over the socket address.
    pub fn from_parts(parts: &Parts) -> ClientInfo {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let ip_address = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });

        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        ClientInfo {
            ip_address,
            user_agent,
        }
    }
}

impl<S> FromRequestParts<S> for Client
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Client(Self::from_parts(parts)))
    }
}
