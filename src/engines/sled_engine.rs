use crate::{KvsEngine, Result};
use {sled, sled::Db};
use std::path::PathBuf;

/// sled implemented durable map
#[derive(Clone)]
pub struct SledKvsEngine {
    sled_db: Db,
}

impl SledKvsEngine {
    /// open path to use as kv database, creating the directory if absent
    ///
    /// sled holds an exclusive file lock on the directory, so a second live
    /// process opening the same path fails here.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(SledKvsEngine {
            sled_db: sled::open(path.into())?
        })
    }
}


impl KvsEngine for SledKvsEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self.sled_db.get(key)?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.sled_db.insert(key, value)?;
        self.sled_db.flush()?;
        Ok(())
    }
}
