//! Persistence of the single live [Pool] of a run.

use crate::{pool::Pool, Error};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub trait PoolStore {
    /// The saved pool, or None when nothing was saved yet
    fn load_pool(&mut self) -> Result<Option<Pool>, Error>;
    fn save_pool(&mut self, pool: &Pool) -> Result<(), Error>;
}

/// Keeps the pool in memory, counting how often it was saved
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub pool: Option<Pool>,
    pub saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(pool: Pool) -> Self {
        Self {
            pool: Some(pool),
            saves: 0,
        }
    }
}

impl PoolStore for MemoryStore {
    fn load_pool(&mut self) -> Result<Option<Pool>, Error> {
        Ok(self.pool.clone())
    }

    fn save_pool(&mut self, pool: &Pool) -> Result<(), Error> {
        self.pool = Some(pool.clone());
        self.saves += 1;
        Ok(())
    }
}

/// Keeps the pool as JSON in a single file. Saves go through a sibling temporary file, so a
/// failed save never leaves a truncated pool behind
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PoolStore for JsonStore {
    fn load_pool(&mut self) -> Result<Option<Pool>, Error> {
        if !self.path.exists() {
            log::debug!("no pool saved at {}", self.path.display());
            return Ok(None);
        }
        Pool::from_file(&self.path).map(Some)
    }

    fn save_pool(&mut self, pool: &Pool) -> Result<(), Error> {
        let tmp = self.path.with_extension("tmp");
        pool.to_file(&tmp)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::Config, random::WyRng};

    fn pool() -> Pool {
        let config = Config {
            population: 5,
            ..Config::default()
        };
        Pool::init(2, 1, config, &mut WyRng::seeded(1)).unwrap()
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.load_pool().unwrap().is_none());
        let pool = pool();
        store.save_pool(&pool).unwrap();
        store.save_pool(&pool).unwrap();
        assert_eq!(store.saves, 2);
        assert_eq!(store.load_pool().unwrap(), Some(pool));
    }

    #[test]
    fn test_json_store() {
        let path = std::env::temp_dir().join(format!("neatpool-store-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        let mut store = JsonStore::new(&path);
        assert!(store.load_pool().unwrap().is_none());

        let pool = pool();
        store.save_pool(&pool).unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(JsonStore::new(&path).load_pool().unwrap(), Some(pool));

        fs::write(&path, "not a pool").unwrap();
        assert!(matches!(store.load_pool(), Err(Error::Json(_))));
        fs::remove_file(&path).unwrap();
    }
}
