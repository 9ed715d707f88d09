use std::time::{SystemTime, UNIX_EPOCH};

/// 当前时刻的epoch秒数。
/// 建表元数据的createdAt与date列的自动填充都用它。
pub fn get_timestamp() -> u64 {
    let start = SystemTime::now();
    let since_the_epoch = start
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards");
    since_the_epoch.as_secs()
}
