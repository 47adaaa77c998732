//! Model Context Protocol dispatch over JSON-RPC
//!
//! Envelope types live in `rpc`; method routing and audit logging in `server`.

pub mod rpc;
pub mod server;
