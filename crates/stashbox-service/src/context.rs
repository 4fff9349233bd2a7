//! Request context carrying the authenticated user and client details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Network details of whoever issued the request.
///
/// Public share downloads carry only this; there is no user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    /// IP address of the request origin, when known.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
}

/// Context for the current authenticated request.
///
/// Extracted by the API layer and passed into service methods so that
/// every operation knows who is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for `user_id` with the given client details.
    pub fn new(user_id: Uuid, client: ClientInfo) -> Self {
        Self {
            user_id,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
            request_time: Utc::now(),
        }
    }

    /// Creates a context with no client details, for jobs and tests.
    pub fn for_user(user_id: Uuid) -> Self {
        Self::new(user_id, ClientInfo::default())
    }

    /// The client half of the context.
    pub fn client(&self) -> ClientInfo {
        ClientInfo {
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}
