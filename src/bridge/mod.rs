//! Method-call bridge
//!
//! Decodes method calls from the host application, dispatches them to the
//! broker and encodes the replies.

pub mod dispatch;
pub mod method;

pub use dispatch::{bad_request_reply, handle_method_call};
pub use method::{MethodCall, MethodReply, decode_call};
