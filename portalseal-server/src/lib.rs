//! Portal backend: handshake negotiation, the response guard and the routes
//! that carry encrypted bundles.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod handshake;
pub mod middleware;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::ServerError;
pub use state::AppState;
