use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

use crate::{KvsEngine, Result};

/// Volatile engine backed by a lock-free skip map.
///
/// Nothing survives the process. Useful where the coordinator or the server
/// has to be exercised without touching the disk.
#[derive(Clone, Default)]
pub struct MemKvsEngine {
    index: Arc<SkipMap<Vec<u8>, Vec<u8>>>,
}

impl MemKvsEngine {
    /// create an empty in-memory engine
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvsEngine for MemKvsEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.index.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.index.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
