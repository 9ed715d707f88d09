use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Row, Schema};

/// 表：模式加上按身份键索引的行集合。
///
/// 行不按插入序存储，身份键是进程内生成的tsid串，
/// 创建后不可变更。
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// 表名，全库唯一，统一小写
    pub name: String,
    /// 表的模式
    pub schema: Schema,
    /// 身份键到行的映射
    #[serde(default)]
    pub rows: BTreeMap<String, Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self { name: name.into(), schema, rows: BTreeMap::new() }
    }

    /// 按身份键取行
    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.get(id)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
