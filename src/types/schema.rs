use serde::{Deserialize, Serialize};

use crate::db_error::Result;
use crate::types::{DataType, Value};

/// 身份列的列名，建表时缺失会自动补上，且永远不允许删除
pub const ID_COLUMN: &str = "id";

/// 列定义
///
/// 字段名与快照文件的JSON形式对齐（`isPrimary` 等驼峰命名）。
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// 列名 不可为空
    pub name: String,

    /// 列类型
    #[serde(rename = "type")]
    pub data_type: DataType,

    /// 是否为主键列
    #[serde(default)]
    pub is_primary: bool,

    /// 列的默认值。如果为 None，缺失的值以 Null 落库。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self { name: name.into(), data_type, is_primary: false, default: None }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// 外键删除策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferentialAction {
    /// 存在引用时阻止删除（未声明策略时的默认值）
    #[default]
    Restrict,
    /// 连同引用行一起删除，递归生效
    Cascade,
    /// 把引用列写成 Null，不递归
    SetNull,
}

impl std::fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReferentialAction::Restrict => "restrict",
            ReferentialAction::Cascade => "cascade",
            ReferentialAction::SetNull => "set-null",
        })
    }
}

/// 外键声明：本表的 `column` 指向 `referencedTable.referencedColumn`
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    #[serde(default)]
    pub on_delete: ReferentialAction,
}

impl ForeignKey {
    /// 省略策略时采用 restrict
    pub fn new(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        on_delete: Option<ReferentialAction>,
    ) -> Self {
        Self {
            column: column.into(),
            referenced_table: referenced_table.into().to_lowercase(),
            referenced_column: ID_COLUMN.to_string(),
            on_delete: on_delete.unwrap_or_default(),
        }
    }
}

/// 表的模式：列声明加外键声明
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// 列集合，有序，列名表内唯一
    #[serde(default)]
    pub columns: Vec<Column>,

    /// 外键集合
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    pub fn new(columns: Vec<Column>, foreign_keys: Vec<ForeignKey>) -> Self {
        Self { columns, foreign_keys }
    }

    /// 按列名查找列定义
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// 查找以指定列为源的外键声明
    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    /// 调用方没给身份列时自动补一个uuid主键列到最前面
    pub fn ensure_id(&mut self) {
        if !self.has_column(ID_COLUMN) {
            let mut id = Column::new(ID_COLUMN, DataType::Uuid);
            id.is_primary = true;
            self.columns.insert(0, id);
        }
    }

    /// 定义期校验：列名唯一，外键源列必须是已声明的列。
    /// 引用表是否存在由 Database 在持有全部表时校验。
    pub fn validate(&self, table_name: &str) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return crate::errdata!(
                    "duplicate column {} in table {table_name}",
                    column.name
                );
            }
        }
        for fk in &self.foreign_keys {
            if !self.has_column(&fk.column) {
                return crate::errdata!(
                    "foreign key source column {} is not declared in table {table_name}",
                    fk.column
                );
            }
        }
        Ok(())
    }
}
