use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, error};

use crate::db_error::{Error, Result};
use crate::sql::{Executor, Parser, QueryOutcome};
use crate::storage::SnapshotStore;
use crate::store::Database;

/// 会话：一份数据库快照加上它的字节存储。
///
/// 这是查询文本的入口。单线程串行执行，一条查询跑完才轮到下一条；
/// 多线程调用方在外层用`Arc<Mutex<Session>>`做互斥，核心内部不加锁。
/// 求值期间的意外崩溃在这里被兜住，转成`Error::Internal`返回，
/// 不向调用方扩散。
pub struct Session<S: SnapshotStore> {
    db: Database,
    store: S,
    autosave: bool,
}

impl<S: SnapshotStore> Session<S> {
    /// 从字节存储恢复快照并建立会话，存储为空时从空库开始
    pub fn open(store: S) -> Result<Self> {
        let db = Database::load(&store)?;
        Ok(Self { db, store, autosave: false })
    }

    /// 修改型命令成功后自动写回快照
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// 一行查询文本进，一个结果或错误出
    pub fn execute(&mut self, query: &str) -> Result<QueryOutcome> {
        debug!("execute: {query}");
        let result = catch_unwind(AssertUnwindSafe(|| {
            let command = Parser::new(query).parse()?;
            Executor::new(&mut self.db).execute(command)
        }));
        let outcome = match result {
            Ok(outcome) => outcome?,
            Err(_) => {
                error!("query evaluation panicked: {query}");
                return Err(Error::Internal("query evaluation panicked".to_string()));
            }
        };
        // 带受影响行数的命令都动过快照
        if self.autosave && outcome.affected_row_count.is_some() {
            self.save()?;
        }
        Ok(outcome)
    }

    /// 整份快照写回存储
    pub fn save(&mut self) -> Result<()> {
        self.db.save(&mut self.store)
    }

    /// 导入快照文档，成功后按autosave策略落盘
    pub fn import(&mut self, document: serde_json::Value, overwrite: bool) -> Result<()> {
        self.db.import(document, overwrite)?;
        if self.autosave {
            self.save()?;
        }
        Ok(())
    }

    /// 导出当前快照
    pub fn export(&self) -> Result<serde_json::Value> {
        self.db.export()
    }
}
