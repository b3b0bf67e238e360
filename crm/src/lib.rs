//! Multi-user record-keeping backend: a user directory, a task board and a
//! login/logout ledger, each persisted as a flat CSV table and mediated by a
//! role-gated access controller.

pub mod access;
pub mod audit;
pub mod config;
pub mod error;
pub mod store;
pub mod tasks;
pub mod users;

pub use access::{AccessController, Session};
pub use config::Config;
pub use error::{Error, Result};
