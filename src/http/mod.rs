//! HTTP transport for the gateway
//!
//! Exposes the MCP endpoint at `/` and the public health check.

pub mod handlers;
