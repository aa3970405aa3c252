//! Wire messages exchanged with node handlers
//!
//! Hand-rolled prost messages; the shapes are small enough that a build-time
//! protoc pass would cost more than it buys. Handlers in other languages only
//! need the matching `.proto` definitions:
//!
//! ```proto
//! package weft;
//!
//! message Context      { map<string, google.protobuf.Any> data = 1; }
//! message HttpRequest  { string method = 2; string path = 3; bytes body = 4; }
//! message HttpResponse { string body = 1; }
//! ```
//!
//! `HttpRequest` deliberately starts its tags at 2: the origin node is the
//! only one invoked with an `HttpRequest` payload, and a handler that decodes
//! every invocation as `Context` then sees an empty map instead of garbage,
//! because unknown fields are skipped.

use std::collections::HashMap;

use prost::{DecodeError, EncodeError, Name};
use prost_types::Any;

/// Per-request execution context: output key -> packed handler reply
#[derive(Clone, PartialEq, prost::Message)]
pub struct Context {
    #[prost(map = "string, message", tag = "1")]
    pub data: HashMap<String, Any>,
}

/// The inbound HTTP request, handed to the origin node
#[derive(Clone, PartialEq, prost::Message)]
pub struct HttpRequest {
    #[prost(string, tag = "2")]
    pub method: String,
    #[prost(string, tag = "3")]
    pub path: String,
    #[prost(bytes = "vec", tag = "4")]
    pub body: Vec<u8>,
}

/// The terminal reply a traversal must produce under `http_response`
#[derive(Clone, PartialEq, prost::Message)]
pub struct HttpResponse {
    #[prost(string, tag = "1")]
    pub body: String,
}

impl Name for Context {
    const NAME: &'static str = "Context";
    const PACKAGE: &'static str = "weft";
}

impl Name for HttpRequest {
    const NAME: &'static str = "HttpRequest";
    const PACKAGE: &'static str = "weft";
}

impl Name for HttpResponse {
    const NAME: &'static str = "HttpResponse";
    const PACKAGE: &'static str = "weft";
}

impl Context {
    /// Pack `message` into an [`Any`] and store it under `key`
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        message: &impl Name,
    ) -> std::result::Result<(), EncodeError> {
        let packed = Any::from_msg(message)?;
        self.data.insert(key.into(), packed);
        Ok(())
    }

    /// Unpack the entry under `key`, if present
    pub fn get<M: Default + Name>(&self, key: &str) -> Option<std::result::Result<M, DecodeError>> {
        self.data.get(key).map(Any::to_msg)
    }
}
