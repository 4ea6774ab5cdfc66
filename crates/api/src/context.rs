use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap};
use uuid::Uuid;

use nova_auth::{Permission, Principal};
use nova_core::{ActorContext, UserId};

/// Authenticated identity for a request, with its resolved permissions.
///
/// Inserted by the auth middleware alongside an [`ActorContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.principal.permissions
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}

/// Build the actor context for a request made by `actor`.
pub fn actor_context(actor: UserId, headers: &HeaderMap, extensions: &Extensions) -> ActorContext {
    let ctx = ActorContext::new(actor).with_remote_addr(client_addr(headers, extensions));
    match request_id(headers) {
        Some(id) => ctx.with_request_id(id),
        None => ctx,
    }
}

/// Caller address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
pub fn client_addr(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    };
    let peer = || {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };
    forwarded.or_else(real_ip).or_else(peer)
}

fn request_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.1.2.3, 172.16.0.1"));
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000))));

        assert_eq!(
            client_addr(&headers, &extensions),
            Some("10.1.2.3".parse().unwrap())
        );
        assert_eq!(
            client_addr(&HeaderMap::new(), &extensions),
            Some("127.0.0.1".parse().unwrap())
        );
    }

    #[test]
    fn request_id_header_is_propagated() {
        let id = Uuid::now_v7();
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_str(&id.to_string()).unwrap());
        let ctx = actor_context(UserId::new(), &headers, &Extensions::new());
        assert_eq!(ctx.request_id(), id);
        assert_eq!(ctx.remote_addr(), None);
    }
}
