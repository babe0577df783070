//! Request context carrying who is acting and when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current operation.
///
/// Passed into every mutating service method so that log events name the
/// actor and can be correlated by request id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Correlation id for log events.
    pub request_id: Uuid,
    /// Who is acting: a user name, or a tool name for batch work.
    pub actor: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor: actor.into(),
            request_time: Utc::now(),
        }
    }
}
