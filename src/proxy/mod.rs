// proxy module - CORS/CSRF-aware relay to a single upstream origin

pub mod config;
pub mod server;

pub mod common; // Header, cookie and body rewriting
pub mod handlers; // Relay and diagnostics endpoints
pub mod middleware; // Axum middleware
pub mod upstream; // Upstream client

pub use config::ProxyConfig;
pub use server::{build_router, AppState, AxumServer};
