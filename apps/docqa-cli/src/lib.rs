//! Delivery surfaces for the assistant: the `docqa` CLI and the
//! `docqa-server` HTTP API share logging setup and the axum router here.

pub mod logging;
pub mod server;
