//! Wire contract between the hadith reader and the catalog service.
//!
//! Catalog and account operations exchange protobuf-encoded messages
//! (see [`messages`]); telemetry submission and error bodies are JSON
//! (see [`json`]). Every message type is paired with exactly one
//! [`WireCodec`] implementation.

pub mod codec;
pub mod json;
pub mod messages;

pub use codec::{
    CONTENT_TYPE_JSON, CONTENT_TYPE_PROTOBUF, CodecError, JsonCodec, ProtobufCodec, WireCodec,
};
