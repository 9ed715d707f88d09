use crate::db_error::Result;
use crate::storage::engine::{SnapshotStore, StoreStatus};
use std::collections::BTreeMap;

// 实现内存存储
#[derive(Default)]
pub struct Memory(BTreeMap<Vec<u8>, Vec<u8>>);

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for Memory {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.0.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.0.get(key).cloned())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.0.remove(key);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn status(&self) -> Result<StoreStatus> {
        Ok(StoreStatus {
            name: "memory".to_string(),
            total_count: self.0.len() as u64,
            logical_size: self.0.iter().map(|(k, v)| k.len() + v.len()).sum::<usize>() as u64,
        })
    }
}
