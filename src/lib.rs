#![deny(missing_docs)]
//! A networked key/value store whose puts atomically swap in the new value
//! and report the one they replaced.

pub use error::{KvsError, Result};
pub use engines::{KvsEngine, MemKvsEngine, SledKvsEngine};
pub use coordinator::StoreCoordinator;
pub use session::{Outcome, Session};

mod error;
mod engines;
mod coordinator;
mod session;
/// raw wire client
pub mod client;
pub mod protocols;
/// tcp front end of the store
pub mod server;
/// pools the server runs store calls on
pub mod thread_pool;
