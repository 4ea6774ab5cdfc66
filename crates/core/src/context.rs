//! Explicit per-request actor context.

use std::net::IpAddr;

use uuid::Uuid;

use crate::id::UserId;

/// Who is performing an operation, plus request metadata for audit trails.
///
/// Passed explicitly into every service/engine call; never stored in ambient
/// or global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor_id: UserId,
    request_id: Uuid,
    remote_addr: Option<IpAddr>,
}

impl ActorContext {
    pub fn new(actor_id: UserId) -> Self {
        Self {
            actor_id,
            request_id: Uuid::now_v7(),
            remote_addr: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: Option<IpAddr>) -> Self {
        self.remote_addr = addr;
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn actor_id(&self) -> UserId {
        self.actor_id
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr
    }
}
