//! Resilient RPC client and wire-format parsers for the third-party photo
//! provider: session bootstrap, batched `batchexecute` calls, retry with
//! backoff, and decoders for the ragged reply arrays the provider returns.

pub mod client;
pub mod cookies;
pub mod error;
pub mod node;
pub mod parsers;

pub use client::{parse_wrb_payload, RpcClient, RpcClientConfig, RpcResult};
pub use cookies::{cookie_header, parse_cookie_string, parse_netscape_cookie_file};
pub use error::RpcError;
pub use node::Node;
pub use parsers::parse_response;
