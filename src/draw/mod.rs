//! Secret Santa draw core
//!
//! - [`pairing`]: pure assignment generator
//! - [`store`]: transactional replace of a group's matches
//! - [`lock`]: per-group serialisation of draws
//! - [`service`]: the authorized draw trigger and the locked entry points
//!   used by handlers

pub mod lock;
pub mod pairing;
pub mod service;
pub mod store;

pub use lock::DrawLocks;
pub use pairing::{check_assignment, draw_assignment, Pairing, MIN_MEMBERS};
pub use service::{DrawAuthorizer, DrawOutcome, DrawService, GroupAdminOnly};
