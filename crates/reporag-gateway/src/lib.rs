//! HTTP front end: chat page, `/chat` endpoint, and health check.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;
