//! Secret Santa - gift exchange groups with randomized draws
//!
//! The draw core lives in [`draw`]; everything else is the HTTP and
//! persistence layer around it.

pub mod config;
pub mod db;
pub mod draw;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
