use serde::{Deserialize, Serialize};

use crate::cfg::Config;
/// 自定义错误信息
///
/// 错误分类与调用边界一一对应：
/// 解析期产生 `Parser`，存储层产生 `NotFound`/`Constraint`/`InvalidData`，
/// 快照读写产生 `Storage`/`IO`，求值期捕获的意外崩溃统一归为 `Internal`。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// 无效查询语句：子句缺失或无法解析
    Parser(String),
    /// 表或行不存在
    NotFound(String),
    /// 外键约束失败：引用缺失，或 restrict 策略阻止删除
    Constraint(String),
    /// 无效数据：值与列类型不匹配、JSON载荷格式错误
    InvalidData(String),
    /// 快照存储失败：写入失败或校验不通过
    Storage(String),
    /// 文件IO错误
    IO(String),
    /// 求值期间捕获到的意外崩溃
    Internal(String),
    /// 配置错误
    Config(String),
    /// 配置监听错误
    ConfigWatcher(String),
    /// Mutex 锁错误
    Mutex(String),
}

/// 自定义错误类型
pub type Result<T> = std::result::Result<T, Error>;

/// 实现标准库std::error::Error特征
impl std::error::Error for Error {}

/// 实现格式输出
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Parser(msg) => write!(f, "parser error: {msg}"),
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::Constraint(msg) => write!(f, "constraint violation: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::Storage(msg) => write!(f, "storage error: {msg}"),
            Error::IO(msg) => write!(f, "io error: {msg}"),
            Error::Internal(msg) => write!(f, "internal error: {msg}"),
            Error::Config(msg) => write!(f, "error: config error: {msg}"),
            Error::ConfigWatcher(msg) => write!(f, "error: config watcher error: {msg}"),
            Error::Mutex(msg) => write!(f, "error: mutex error: {msg}"),
        }
    }
}

/// 构建一个Err(Error::InvalidData)实例
/// an Error::InvalidData for the given format string.
#[macro_export]
macro_rules! errdata {
    ($($args:tt)*) => {
        Err($crate::db_error::Error::InvalidData(format!($($args)*)))
    };
}

/// 构建一个Err(Error::Parser)实例
/// an Error::Parser for the given format string.
#[macro_export]
macro_rules! errinput {
    ($($args:tt)*) => {
        Err($crate::db_error::Error::Parser(format!($($args)*)))
    };
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::ConfigWatcher(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}

impl From<std::sync::PoisonError<std::sync::MutexGuard<'_, Config>>> for Error {
    fn from(err: std::sync::PoisonError<std::sync::MutexGuard<'_, Config>>) -> Self {
        Error::Mutex(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errdata() {
        let err: Result<()> = errdata!("bad value {}", 42);
        assert_eq!(err, Err(Error::InvalidData("bad value 42".to_string())));
    }

    #[test]
    fn test_errinput() {
        let err: Result<()> = errinput!("unexpected token");
        assert_eq!(err, Err(Error::Parser("unexpected token".to_string())));
    }

    #[test]
    fn test_display() {
        let err = Error::NotFound("table users".to_string());
        assert_eq!(err.to_string(), "not found: table users");
    }
}
