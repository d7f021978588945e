use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kvstore::{KvsEngine, KvsError, MemKvsEngine, Result};

/// Engine whose reads or writes can be switched to fail.
#[derive(Clone, Default)]
pub struct FaultyEngine {
    inner: MemKvsEngine,
    fail_get: Arc<AtomicBool>,
    fail_put: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl FaultyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }
}

impl KvsEngine for FaultyEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(KvsError::StorageFault("injected read fault".to_owned()));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(KvsError::StorageFault("injected write fault".to_owned()));
        }
        self.inner.put(key, value)
    }
}
