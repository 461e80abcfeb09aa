//! Wire protocol between the runner and a provider plugin.
//!
//! One call is one exchange. The runner writes a compact JSON
//! [`CallRequest`] to the plugin's stdin and closes it; the plugin writes a
//! JSON [`CallOutput`] object to stdout and exits. Plugin stderr is captured
//! for diagnostics but is not part of the protocol.
//!
//! ```text
//! {"method":"<name>","arguments":[...],"context":{"director_uuid":"<id>"}}
//! {"result":<any>,"error":{"message":"..."},"log":"..."}
//! ```

mod request;
mod response;

pub use self::request::CallRequest;
pub use self::response::{CallError, CallOutput, decode_output};
