mod config;
mod watcher;

use std::sync::Mutex;

use lazy_static::lazy_static;

pub use config::{get_config_path, Config, ConfigWrapper};
pub use watcher::watch_config;

use crate::db_error::Result;

lazy_static! {
    /// 进程级配置实例，监听任务在配置文件变化时热更新它。
    /// 配置文件缺失或损坏时回退到默认配置。
    pub static ref CONFIG: Mutex<Config> =
        Mutex::new(Config::load_config().unwrap_or_default());
}

/// 拿一份当前配置的副本
pub fn current() -> Result<Config> {
    Ok(CONFIG.lock()?.clone())
}
