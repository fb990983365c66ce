//! Proxy gateway for the AI chat backend and the SideShift exchange API.

pub mod chat;
pub mod config;
pub mod error;
pub mod server;
pub mod sideshift;

pub use config::{ChatCredential, DEFAULT_CHAT_URL, DEFAULT_PORT, DEFAULT_SIDESHIFT_URL, GatewayConfig};
pub use error::ApiError;
/// HTTP server, router, and shared handler state.
pub use server::{GatewayServer, GatewayState, build_router};
pub use sideshift::{SideshiftClient, SideshiftError};
