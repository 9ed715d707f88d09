use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db_error::Result;

/// 配置文件路径：环境变量REL_DB_CONFIG优先，否则取工作目录下的config.toml
pub fn get_config_path() -> PathBuf {
    env::var("REL_DB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./config.toml"))
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigWrapper {
    pub config: Config,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // 快照存储目录
    pub storage_path: PathBuf,

    // 服务监听地址
    pub listen_addr: String,

    // 修改型命令成功后是否自动写回快照
    pub autosave: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./data"),
            listen_addr: "127.0.0.1:6606".to_string(),
            autosave: true,
        }
    }
}

pub struct ConfigBuilder {
    pub inner: Config,
}

impl ConfigBuilder {
    pub fn storage_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.inner.storage_path = path.into();
        self
    }
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.inner.listen_addr = addr.into();
        self
    }
    pub fn autosave(mut self, autosave: bool) -> Self {
        self.inner.autosave = autosave;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.inner.storage_path.as_os_str().is_empty() {
            return Err(crate::db_error::Error::Config(
                "storage_path must not be empty".to_string(),
            ));
        }
        if self.inner.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(crate::db_error::Error::Config(format!(
                "listen_addr {} is not a valid socket address",
                self.inner.listen_addr
            )));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Config> {
        self.validate()?;
        Ok(self.inner)
    }
}

impl Config {
    pub fn builder<P: Into<PathBuf>>(storage_path: P) -> ConfigBuilder {
        ConfigBuilder {
            inner: Config {
                storage_path: storage_path.into(),
                ..Default::default()
            },
        }
    }

    pub fn load_config() -> Result<Config> {
        let path = get_config_path();
        // 1、读取配置文件
        let content = std::fs::read_to_string(path)?;
        // 2、解析配置文件
        let wrapper: ConfigWrapper = toml::from_str(&content)?;
        // 3、返回实际的配置
        Ok(wrapper.config)
    }
}
