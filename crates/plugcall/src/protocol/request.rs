//! Request construction and encoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::CallContext;
use crate::error::PluginError;

/// Request written to a plugin's stdin.
///
/// Field order is part of the wire format: `method`, `arguments`, `context`.
///
/// # Example
///
/// ```
/// use plugcall::{CallContext, CallRequest};
///
/// let request = CallRequest::new(
///     "fake-method",
///     vec!["fake-argument-1".into(), "fake-argument-2".into()],
///     CallContext::new("fake-director-id"),
/// );
/// let bytes = request.encode().expect("encode");
/// assert_eq!(
///     String::from_utf8(bytes).expect("utf8"),
///     r#"{"method":"fake-method","arguments":["fake-argument-1","fake-argument-2"],"context":{"director_uuid":"fake-director-id"}}"#,
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    method: String,
    arguments: Vec<Value>,
    context: CallContext,
}

impl CallRequest {
    /// Creates a request from already converted JSON arguments.
    #[must_use]
    pub fn new(method: impl Into<String>, arguments: Vec<Value>, context: CallContext) -> Self {
        Self {
            method: method.into(),
            arguments,
            context,
        }
    }

    /// Creates a request by converting each argument to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::SerializeRequest`] if an argument cannot be
    /// represented as JSON.
    pub fn from_serializable<A: Serialize>(
        method: impl Into<String>,
        arguments: &[A],
        context: CallContext,
    ) -> Result<Self, PluginError> {
        let values = arguments
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PluginError::SerializeRequest)?;
        Ok(Self::new(method, values, context))
    }

    /// Returns the method name.
    #[must_use]
    pub const fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the ordered arguments.
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Returns the call context.
    #[must_use]
    pub const fn context(&self) -> &CallContext {
        &self.context
    }

    /// Encodes the request as compact JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::EmptyMethod`] if the method name is empty, or
    /// [`PluginError::SerializeRequest`] if encoding fails.
    pub fn encode(&self) -> Result<Vec<u8>, PluginError> {
        if self.method.is_empty() {
            return Err(PluginError::EmptyMethod);
        }
        serde_json::to_vec(self).map_err(PluginError::SerializeRequest)
    }
}
