mod mem_engine;
mod sled_engine;

use crate::Result;

pub use mem_engine::MemKvsEngine;
pub use sled_engine::SledKvsEngine;


/// trait for the durable map underneath the store coordinator
///
/// Keys and values are opaque byte strings. Both operations must be durable
/// on return for engines that claim persistence; a failure is reported as an
/// error and never as an absent key.
pub trait KvsEngine: Clone + Send + 'static {
    /// Gets the value stored for `key`.
    ///
    /// Returns `None` if the given key does not exist.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;


    /// Stores `value` under `key`, fully replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;
}
