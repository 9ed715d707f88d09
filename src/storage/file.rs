use fs4::fs_std::FileExt;

use crate::db_error::{Error, Result};
use crate::storage::engine::{SnapshotStore, StoreStatus};
use crate::utils::Raw;
use sha3::{Digest, Sha3_256};
use std::fs;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

/// 校验字段长度：Sha3-256摘要截取8字节
const CHECKSUM_LEN: usize = 8;
/// 目录独占锁文件名
const LOCK_FILE: &str = ".lock";

/// 文件快照存储
///
/// 一个键对应目录下的一个文件，文件名是键的hex编码。
/// 条目格式：
/// ------|--------|
///  crc  |payload |
/// ------|--------|
///  8    |...     |
/// ------|--------|
/// 写入先落临时文件再重命名，读取时校验crc，损坏的条目报Storage错误。
/// 打开目录时通过锁文件持有独占锁，阻止第二个进程打开同一目录。
pub struct FileStore {
    dir: PathBuf,
    _lock: fs::File,
}

impl FileStore {
    /// 打开（或初始化）一个存储目录
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;
        if !lock.try_lock_exclusive()? {
            return Err(Error::Storage(format!(
                "directory {} is locked by another process",
                dir.display()
            )));
        }
        Ok(Self { dir, _lock: lock })
    }

    fn path_for(&self, key: &[u8]) -> PathBuf {
        self.dir.join(hex::encode(key))
    }

    /// 构建完整性校验字段
    fn checksum(payload: &[u8]) -> Vec<u8> {
        let mut hasher = Sha3_256::new();
        hasher.update(payload);
        hasher.finalize()[15..15 + CHECKSUM_LEN].to_vec()
    }
}

impl SnapshotStore for FileStore {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        let entry = [Self::checksum(value).as_slice(), value].concat();
        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            let mut writer = BufWriter::with_capacity(entry.len(), &file);
            writer.write_all(&entry)?;
            writer.flush()?;
            drop(writer);
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        debug!("set {} ({} bytes)", Raw::bytes(key), value.len());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }
        let entry = fs::read(&path)?;
        if entry.len() < CHECKSUM_LEN {
            return Err(Error::Storage(format!(
                "entry {} is truncated",
                Raw::bytes(key)
            )));
        }
        let (crc, payload) = entry.split_at(CHECKSUM_LEN);
        // 检验完整性
        if crc != Self::checksum(payload).as_slice() {
            return Err(Error::Storage(format!(
                "checksum mismatch for {}",
                Raw::bytes(key)
            )));
        }
        Ok(Some(payload.to_vec()))
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        if path.is_file() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // set在重命名前已经sync过，这里无事可做
        Ok(())
    }

    fn status(&self) -> Result<StoreStatus> {
        let mut total_count = 0;
        let mut logical_size = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name == LOCK_FILE || name.ends_with(".tmp") {
                continue;
            }
            total_count += 1;
            logical_size += entry.metadata()?.len();
        }
        Ok(StoreStatus { name: "file".to_string(), total_count, logical_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;
        assert_eq!(store.get(b"snapshot")?, None);
        store.set(b"snapshot", br#"{"meta":{},"tables":{}}"#)?;
        assert_eq!(store.get(b"snapshot")?, Some(br#"{"meta":{},"tables":{}}"#.to_vec()));
        // 覆盖写
        store.set(b"snapshot", b"{}")?;
        assert_eq!(store.get(b"snapshot")?, Some(b"{}".to_vec()));
        Ok(())
    }

    #[test]
    fn test_checksum_mismatch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;
        store.set(b"snapshot", b"payload")?;
        // 篡改存储文件的最后一个字节
        let path = dir.path().join(hex::encode(b"snapshot"));
        let mut entry = fs::read(&path)?;
        let last = entry.len() - 1;
        entry[last] ^= 0xff;
        fs::write(&path, entry)?;
        assert!(matches!(store.get(b"snapshot"), Err(Error::Storage(_))));
        Ok(())
    }

    #[test]
    fn test_delete_and_status() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut store = FileStore::open(dir.path())?;
        store.set(b"a", b"1")?;
        store.set(b"b", b"22")?;
        let status = store.status()?;
        assert_eq!(status.name, "file");
        assert_eq!(status.total_count, 2);
        store.delete(b"a")?;
        store.delete(b"a")?; // 再删不报错
        assert_eq!(store.status()?.total_count, 1);
        Ok(())
    }
}
