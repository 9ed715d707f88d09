use crate::db_error::Result;
/// SnapshotStore trait
/// 定义快照存储的通用行为：面向字节的键值读写。
/// 数据库层把整个快照序列化后以固定键存取，这里不关心内容格式。
pub trait SnapshotStore: Send {
    // 为特定键值Key,设置一个值Value,替代原本已有的值
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    // 为特定键值Key,获取一个值Value
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    // 删除一个键值Key
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    // 把缓冲区的数据存储到磁盘上
    fn flush(&mut self) -> Result<()>;

    // 检查键是否存在
    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn status(&self) -> Result<StoreStatus>;
}

/// 定义存储状态
/// Store Status
#[derive(Debug, Clone)]
pub struct StoreStatus {
    /// 存储名称
    pub name: String,
    /// 所有的键值数量
    pub total_count: u64,
    /// 所有键值的逻辑大小，就是所有键值的长度之和
    pub logical_size: u64,
}
