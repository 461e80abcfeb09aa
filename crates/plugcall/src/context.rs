//! Request-scoped identifiers threaded into every call.

use serde::{Deserialize, Serialize};

/// Identifies the orchestrator on whose behalf a call is made.
///
/// Serialised as `{"director_uuid":"<id>"}`; the key is the historical wire
/// name plugins expect.
///
/// # Example
///
/// ```
/// use plugcall::CallContext;
///
/// let context = CallContext::new("fake-director-id");
/// let json = serde_json::to_string(&context).expect("serialise");
/// assert_eq!(json, r#"{"director_uuid":"fake-director-id"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallContext {
    #[serde(rename = "director_uuid")]
    requester_id: String,
}

impl CallContext {
    /// Creates a context for the given requester.
    #[must_use]
    pub fn new(requester_id: impl Into<String>) -> Self {
        Self {
            requester_id: requester_id.into(),
        }
    }

    /// Returns the requester identifier.
    #[must_use]
    pub const fn requester_id(&self) -> &str {
        self.requester_id.as_str()
    }
}
