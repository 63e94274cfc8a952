//! The stdio LSP transport for the semantic index (§5, §6): JSON-RPC
//! framing, the notification/request split, the worker pool, and the
//! per-method handlers.

pub mod handlers;
pub mod position;
pub mod server;
pub mod transport;

pub use server::run;
