use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::{KvsEngine, Result};

/// Serializes puts against gets on top of a [`KvsEngine`].
///
/// Every key is guarded by one reader/writer lock (its stripe). Reads share
/// the stripe, a write holds it exclusively across the fetch of the old value
/// and the store of the new one, so concurrent writes on a key are totally
/// ordered and no read sees anything but the value before or after a write.
///
/// With a single stripe the lock covers the whole store.
///
/// ```rust
/// # use kvstore::{MemKvsEngine, Result, StoreCoordinator};
/// # fn try_main() -> Result<()> {
/// let store = StoreCoordinator::new(MemKvsEngine::new());
/// assert_eq!(store.write(b"k1", b"A")?, None);
/// assert_eq!(store.write(b"k1", b"B")?, Some(b"A".to_vec()));
/// assert_eq!(store.read(b"k1")?, Some(b"B".to_vec()));
/// # Ok(())
/// # }
/// ```
pub struct StoreCoordinator<E: KvsEngine> {
    engine: E,
    stripes: Arc<Vec<RwLock<()>>>,
}

impl<E: KvsEngine> Clone for StoreCoordinator<E> {
    fn clone(&self) -> Self {
        StoreCoordinator {
            engine: self.engine.clone(),
            stripes: self.stripes.clone(),
        }
    }
}

impl<E: KvsEngine> StoreCoordinator<E> {
    /// Wraps `engine` behind one store-wide reader/writer lock.
    pub fn new(engine: E) -> Self {
        Self::with_stripes(engine, 1)
    }

    /// Wraps `engine` behind `stripes` locks selected by key hash.
    ///
    /// A stripe count of zero is treated as one.
    pub fn with_stripes(engine: E, stripes: usize) -> Self {
        let stripes = (0..stripes.max(1)).map(|_| RwLock::new(())).collect();
        StoreCoordinator {
            engine,
            stripes: Arc::new(stripes),
        }
    }

    /// Number of lock stripes.
    pub fn stripes(&self) -> usize {
        self.stripes.len()
    }

    /// Reads the current value of `key`.
    ///
    /// Returns `None` if the key was never written.
    ///
    /// # Errors
    ///
    /// A fault of the underlying engine is returned as is, it is never
    /// reported as an absent key.
    pub fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let _guard = self.stripe(key).read()?;
        self.engine.get(key)
    }

    /// Replaces the value of `key` and returns the value it replaced.
    ///
    /// # Errors
    ///
    /// If either the fetch or the store fails, the captured old value is
    /// dropped and the engine error is returned. The new value may or may not
    /// have been persisted in that case.
    pub fn write(&self, key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>> {
        let _guard = self.stripe(key).write()?;
        let old_value = self.engine.get(key)?;
        self.engine.put(key, value)?;
        Ok(old_value)
    }

    fn stripe(&self, key: &[u8]) -> &RwLock<()> {
        if self.stripes.len() == 1 {
            return &self.stripes[0];
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let slot = (hasher.finish() % self.stripes.len() as u64) as usize;
        &self.stripes[slot]
    }
}
