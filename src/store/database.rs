use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use tsid::create_tsid;

use crate::db_error::{Error, Result};
use crate::errdata;
use crate::store::constraint;
use crate::store::Table;
use crate::storage::SnapshotStore;
use crate::types::{Column, DataType, ForeignKey, Row, Schema, Value, ID_COLUMN};
use crate::utils::get_timestamp;

/// 快照在字节存储里的固定键
pub const SNAPSHOT_KEY: &[u8] = b"snapshot";

/// 快照元数据
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMeta {
    #[serde(default = "DatabaseMeta::default_version")]
    pub version: u32,
    #[serde(default)]
    pub created_at: u64,
    /// 外部写入的附加元数据原样保留
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for DatabaseMeta {
    fn default() -> Self {
        Self { version: 1, created_at: get_timestamp(), extra: BTreeMap::new() }
    }
}

impl DatabaseMeta {
    fn default_version() -> u32 {
        1
    }

    /// 浅合并：版本与附加键被导入方覆盖，createdAt保留本库的创建时刻
    fn merge(&mut self, incoming: DatabaseMeta) {
        self.version = incoming.version;
        self.extra.extend(incoming.extra);
    }
}

/// 数据库：全部表加元数据，即一份完整快照。
///
/// 所有操作都走显式的实例方法，没有全局状态；并发调用方自行在外层
/// 加锁（见 Session 与服务端的 `Arc<Mutex<_>>`）。每个修改操作要么
/// 完整提交要么报错返回，不留半成品。
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub meta: DatabaseMeta,
    #[serde(default)]
    pub(crate) tables: BTreeMap<String, Table>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按表名取表，名字统一小写匹配
    pub fn table(&self, name: &str) -> Result<&Table> {
        let name = name.to_lowercase();
        self.tables
            .get(&name)
            .ok_or_else(|| Error::NotFound(format!("table {name}")))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        let name = name.to_lowercase();
        self.tables
            .get_mut(&name)
            .ok_or_else(|| Error::NotFound(format!("table {name}")))
    }

    /// 全部表，按表名有序
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// 建表。身份列缺失时自动补上uuid主键列。
    ///
    /// 外键在定义期校验：源列必须已声明，引用表必须存在
    /// （自引用的表算存在），引用列必须在引用表里。
    pub fn define_table(
        &mut self,
        name: &str,
        columns: Vec<Column>,
        foreign_keys: Vec<ForeignKey>,
    ) -> Result<&Table> {
        let name = name.to_lowercase();
        if self.tables.contains_key(&name) {
            return errdata!("table {name} already exists");
        }
        let mut schema = Schema::new(columns, foreign_keys);
        schema.ensure_id();
        schema.validate(&name)?;
        for fk in &schema.foreign_keys {
            let referenced_schema = if fk.referenced_table == name {
                &schema
            } else {
                match self.tables.get(&fk.referenced_table) {
                    Some(table) => &table.schema,
                    None => {
                        return errdata!(
                            "foreign key {} references unknown table {}",
                            fk.column,
                            fk.referenced_table
                        )
                    }
                }
            };
            if !referenced_schema.has_column(&fk.referenced_column) {
                return errdata!(
                    "foreign key {} references unknown column {}.{}",
                    fk.column,
                    fk.referenced_table,
                    fk.referenced_column
                );
            }
        }
        info!("define table {name}");
        self.tables.insert(name.clone(), Table::new(name.clone(), schema));
        Ok(&self.tables[name.as_str()])
    }

    /// 删表。其他表里指向它的外键声明不随之清理，
    /// 约束解析遇到悬空声明时按不匹配处理。
    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        let name = name.to_lowercase();
        match self.tables.remove(&name) {
            Some(table) => {
                info!("drop table {name}");
                Ok(table)
            }
            None => Err(Error::NotFound(format!("table {name}"))),
        }
    }

    /// 加列。已有行回填Null，新行开始使用列默认值。
    pub fn add_column(
        &mut self,
        table: &str,
        column: Column,
        foreign_key: Option<ForeignKey>,
    ) -> Result<()> {
        let name = self.table(table)?.name.clone();
        if self.tables[name.as_str()].schema.has_column(&column.name) {
            return errdata!("column {} already exists in table {name}", column.name);
        }
        if let Some(default) = &column.default {
            if !default.matches_type(column.data_type) {
                return errdata!(
                    "default for column {} does not match type {}",
                    column.name,
                    column.data_type
                );
            }
        }
        if let Some(fk) = &foreign_key {
            if fk.column != column.name {
                return errdata!(
                    "foreign key source {} does not match new column {}",
                    fk.column,
                    column.name
                );
            }
            let referenced = match self.tables.get(&fk.referenced_table) {
                Some(table) => table,
                None => {
                    return errdata!(
                        "foreign key {} references unknown table {}",
                        fk.column,
                        fk.referenced_table
                    )
                }
            };
            if !referenced.schema.has_column(&fk.referenced_column) {
                return errdata!(
                    "foreign key {} references unknown column {}.{}",
                    fk.column,
                    fk.referenced_table,
                    fk.referenced_column
                );
            }
        }
        let table = self.table_mut(&name)?;
        for row in table.rows.values_mut() {
            row.insert(column.name.clone(), Value::Null);
        }
        table.schema.columns.push(column);
        if let Some(fk) = foreign_key {
            table.schema.foreign_keys.push(fk);
        }
        Ok(())
    }

    /// 删列。身份列受保护，同源的外键声明一并移除。
    pub fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        if column == ID_COLUMN {
            return errdata!("column {ID_COLUMN} is protected and cannot be dropped");
        }
        let table = self.table_mut(table)?;
        if !table.schema.has_column(column) {
            return Err(Error::NotFound(format!(
                "column {column} in table {}",
                table.name
            )));
        }
        table.schema.columns.retain(|c| c.name != column);
        table.schema.foreign_keys.retain(|fk| fk.column != column);
        for row in table.rows.values_mut() {
            row.remove(column);
        }
        Ok(())
    }

    /// 插入一行。
    ///
    /// 身份键由进程生成；声明过的列依次取载荷值、列默认值，
    /// date类型且名为created_at/createdAt的列在缺失时自动填充当前
    /// 时刻，其余缺失列落Null。载荷里未声明的键被忽略。全部类型
    /// 校验与外键校验通过后才落库，失败时行不会出现。
    pub fn insert(&mut self, table: &str, data: Row) -> Result<Row> {
        let name = self.table(table)?.name.clone();
        let schema = self.tables[name.as_str()].schema.clone();
        let id = create_tsid().number().to_string();
        let mut row = Row::new();
        for column in &schema.columns {
            let value = if column.name == ID_COLUMN {
                Value::String(id.clone())
            } else if let Some(value) = data.get(&column.name) {
                value.clone()
            } else if let Some(default) = &column.default {
                default.clone()
            } else if column.data_type == DataType::Date
                && (column.name == "created_at" || column.name == "createdAt")
            {
                Value::Number(get_timestamp() as f64)
            } else {
                Value::Null
            };
            if !value.matches_type(column.data_type) {
                return errdata!(
                    "column {} of table {name} expects {}, got {value}",
                    column.name,
                    column.data_type
                );
            }
            row.insert(column.name.clone(), value);
        }
        self.check_foreign_keys(&schema, &row)?;
        info!("insert into {name}: row {id}");
        self.table_mut(&name)?.rows.insert(id, row.clone());
        Ok(row)
    }

    /// 更新一行。
    ///
    /// 身份列不可变：载荷里带id时静默忽略而不报错，容忍调用方把
    /// 原样的行回传。其余变更列必须在模式里声明，外键值按插入
    /// 规则重新校验。
    pub fn update(&mut self, table: &str, id: &str, changes: Row) -> Result<Row> {
        let name = self.table(table)?.name.clone();
        let schema = self.tables[name.as_str()].schema.clone();
        if self.tables[name.as_str()].row(id).is_none() {
            return Err(Error::NotFound(format!("row {id} in table {name}")));
        }
        let mut validated = Row::new();
        for (column_name, value) in changes {
            if column_name == ID_COLUMN {
                continue;
            }
            let Some(column) = schema.column(&column_name) else {
                return Err(Error::NotFound(format!(
                    "column {column_name} in table {name}"
                )));
            };
            if !value.matches_type(column.data_type) {
                return errdata!(
                    "column {} of table {name} expects {}, got {value}",
                    column.name,
                    column.data_type
                );
            }
            validated.insert(column_name, value);
        }
        self.check_foreign_keys(&schema, &validated)?;
        let table = self.table_mut(&name)?;
        let Some(row) = table.rows.get_mut(id) else {
            return Err(Error::NotFound(format!("row {id} in table {name}")));
        };
        for (column_name, value) in validated {
            row.insert(column_name, value);
        }
        Ok(row.clone())
    }

    /// 删除一行。先由约束解析算出完整计划，restrict阻塞时零副作用
    /// 返回错误；否则按计划先置空引用再移除所有级联行。
    pub fn delete(&mut self, table: &str, id: &str) -> Result<()> {
        let plan = constraint::plan_delete(self, table, id)?;
        for (name, rid, column) in &plan.set_nulls {
            if let Some(row) = self.table_mut(name)?.rows.get_mut(rid) {
                row.insert(column.clone(), Value::Null);
            }
        }
        for (name, rid) in &plan.deletions {
            self.table_mut(name)?.rows.remove(rid);
        }
        info!(
            "delete from {table}: {} row(s) removed, {} reference(s) nulled",
            plan.deletions.len(),
            plan.set_nulls.len()
        );
        Ok(())
    }

    /// 列出一张表的全部行（无序快照，行按身份键存储）
    pub fn rows(&self, table: &str) -> Result<Vec<Row>> {
        Ok(self.table(table)?.rows.values().cloned().collect())
    }

    /// 校验行里出现的每个外键值都指向引用表的现存行。
    /// 行里没出现的外键列不在校验范围内（更新走部分载荷）。
    fn check_foreign_keys(&self, schema: &Schema, row: &Row) -> Result<()> {
        for fk in &schema.foreign_keys {
            let Some(value) = row.get(&fk.column) else { continue };
            if *value == Value::Null {
                continue;
            }
            let referenced = self.table(&fk.referenced_table).map_err(|_| {
                Error::Constraint(format!(
                    "foreign key {} references missing table {}",
                    fk.column, fk.referenced_table
                ))
            })?;
            let found = referenced
                .rows
                .values()
                .any(|r| r.get(&fk.referenced_column).map_or(false, |v| v == value));
            if !found {
                return Err(Error::Constraint(format!(
                    "foreign key {}={value} has no match in {}.{}",
                    fk.column, fk.referenced_table, fk.referenced_column
                )));
            }
        }
        Ok(())
    }

    /// 导入快照文档。
    /// overwrite为true时整库替换；否则同名表被导入表覆盖，元数据浅合并。
    pub fn import(&mut self, document: serde_json::Value, overwrite: bool) -> Result<()> {
        if document.get("meta").is_none() || document.get("tables").is_none() {
            return errdata!("snapshot document must contain meta and tables");
        }
        let incoming: Database = serde_json::from_value(document)?;
        if overwrite {
            *self = incoming;
        } else {
            self.meta.merge(incoming.meta);
            for (name, table) in incoming.tables {
                self.tables.insert(name, table);
            }
        }
        Ok(())
    }

    /// 导出当前快照为JSON文档
    pub fn export(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// 从字节存储读出快照；键不存在时给一个空库
    pub fn load<S: SnapshotStore>(store: &S) -> Result<Database> {
        match store.get(SNAPSHOT_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Database::new()),
        }
    }

    /// 整份快照写回字节存储
    pub fn save<S: SnapshotStore>(&self, store: &mut S) -> Result<()> {
        let bytes = serde_json::to_vec(self)?;
        store.set(SNAPSHOT_KEY, &bytes)?;
        store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Memory;
    use crate::types::ReferentialAction;

    fn row_id(row: &Row) -> String {
        match row.get(ID_COLUMN) {
            Some(Value::String(id)) => id.clone(),
            other => panic!("row id missing: {other:?}"),
        }
    }

    /// users表加posts表，posts.author_id -> users.id
    fn users_posts(on_delete: Option<ReferentialAction>) -> Database {
        let mut db = Database::new();
        db.define_table("users", vec![Column::new("name", DataType::String)], vec![])
            .unwrap();
        db.define_table(
            "posts",
            vec![
                Column::new("title", DataType::String),
                Column::new("author_id", DataType::Uuid),
            ],
            vec![ForeignKey::new("author_id", "users", on_delete)],
        )
        .unwrap();
        db
    }

    #[test]
    fn test_define_table() -> Result<()> {
        let mut db = Database::new();
        let table = db.define_table("Users", vec![Column::new("name", DataType::String)], vec![])?;
        // 表名小写归一，身份列自动补上且为主键
        assert_eq!(table.name, "users");
        assert_eq!(table.schema.columns[0].name, ID_COLUMN);
        assert!(table.schema.columns[0].is_primary);
        // 重名失败
        assert!(db
            .define_table("USERS", vec![Column::new("name", DataType::String)], vec![])
            .is_err());
        Ok(())
    }

    #[test]
    fn test_define_table_rejects_bad_foreign_keys() {
        let mut db = Database::new();
        // 引用表不存在
        let result = db.define_table(
            "posts",
            vec![Column::new("author_id", DataType::Uuid)],
            vec![ForeignKey::new("author_id", "users", None)],
        );
        assert!(matches!(result, Err(Error::InvalidData(_))));
        // 源列未声明
        let result = db.define_table(
            "posts",
            vec![Column::new("title", DataType::String)],
            vec![ForeignKey::new("author_id", "posts", None)],
        );
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_define_table_self_reference() -> Result<()> {
        let mut db = Database::new();
        db.define_table(
            "categories",
            vec![
                Column::new("name", DataType::String),
                Column::new("parent_id", DataType::Uuid),
            ],
            vec![ForeignKey::new("parent_id", "categories", Some(ReferentialAction::Cascade))],
        )?;
        Ok(())
    }

    #[test]
    fn test_insert_assigns_identity_and_fills_columns() -> Result<()> {
        let mut db = Database::new();
        db.define_table(
            "events",
            vec![
                Column::new("name", DataType::String),
                Column::new("score", DataType::Number).with_default(Value::Number(0.0)),
                Column::new("created_at", DataType::Date),
                Column::new("note", DataType::String),
            ],
            vec![],
        )?;
        let row = db.insert("events", Row::from([("name".to_string(), Value::from("launch"))]))?;
        let id = row_id(&row);
        assert!(!id.is_empty());
        // 默认值、created_at自动填充、其余落Null
        assert_eq!(row.get("score"), Some(&Value::Number(0.0)));
        assert!(matches!(row.get("created_at"), Some(Value::Number(n)) if *n > 0.0));
        assert_eq!(row.get("note"), Some(&Value::Null));
        // listRows能看到插入的行，声明的列全部在场
        let rows = db.rows("events")?;
        assert_eq!(rows.len(), 1);
        assert_eq!(row_id(&rows[0]), id);
        for column in &db.table("events")?.schema.columns {
            assert!(rows[0].contains_key(&column.name));
        }
        Ok(())
    }

    #[test]
    fn test_insert_type_mismatch_is_atomic() -> Result<()> {
        let mut db = Database::new();
        db.define_table("t", vec![Column::new("age", DataType::Number)], vec![])?;
        let result = db.insert("t", Row::from([("age".to_string(), Value::from("young"))]));
        assert!(matches!(result, Err(Error::InvalidData(_))));
        assert!(db.rows("t")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_insert_ignores_unknown_keys() -> Result<()> {
        let mut db = Database::new();
        db.define_table("t", vec![Column::new("name", DataType::String)], vec![])?;
        let row = db.insert(
            "t",
            Row::from([
                ("name".to_string(), Value::from("Z")),
                ("ghost".to_string(), Value::from(1.0)),
            ]),
        )?;
        assert!(!row.contains_key("ghost"));
        Ok(())
    }

    #[test]
    fn test_insert_foreign_key_checked() -> Result<()> {
        let mut db = users_posts(None);
        let result = db.insert(
            "posts",
            Row::from([
                ("title".to_string(), Value::from("hello")),
                ("author_id".to_string(), Value::from("no-such-user")),
            ]),
        );
        assert!(matches!(result, Err(Error::Constraint(_))));
        assert!(db.rows("posts")?.is_empty());

        let user = db.insert("users", Row::from([("name".to_string(), Value::from("ann"))]))?;
        let post = db.insert(
            "posts",
            Row::from([
                ("title".to_string(), Value::from("hello")),
                ("author_id".to_string(), Value::String(row_id(&user))),
            ]),
        )?;
        assert_eq!(post.get("author_id"), Some(&Value::String(row_id(&user))));
        // Null外键值不校验
        db.insert("posts", Row::from([("title".to_string(), Value::from("orphan"))]))?;
        Ok(())
    }

    #[test]
    fn test_update_identity_is_immutable() -> Result<()> {
        let mut db = Database::new();
        db.define_table("t", vec![Column::new("name", DataType::String)], vec![])?;
        let row = db.insert("t", Row::from([("name".to_string(), Value::from("a"))]))?;
        let id = row_id(&row);
        // 载荷里回传了冲突的id：被静默忽略，不是错误
        let updated = db.update(
            "t",
            &id,
            Row::from([
                ("id".to_string(), Value::from("forged")),
                ("name".to_string(), Value::from("b")),
            ]),
        )?;
        assert_eq!(row_id(&updated), id);
        assert_eq!(updated.get("name"), Some(&Value::from("b")));
        Ok(())
    }

    #[test]
    fn test_update_unknown_column() -> Result<()> {
        let mut db = Database::new();
        db.define_table("t", vec![Column::new("name", DataType::String)], vec![])?;
        let row = db.insert("t", Row::from([("name".to_string(), Value::from("a"))]))?;
        let result = db.update("t", &row_id(&row), Row::from([("nope".to_string(), Value::Null)]));
        assert!(matches!(result, Err(Error::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_update_revalidates_foreign_keys() -> Result<()> {
        let mut db = users_posts(None);
        let user = db.insert("users", Row::from([("name".to_string(), Value::from("ann"))]))?;
        let post = db.insert(
            "posts",
            Row::from([("author_id".to_string(), Value::String(row_id(&user)))]),
        )?;
        let result = db.update(
            "posts",
            &row_id(&post),
            Row::from([("author_id".to_string(), Value::from("no-such-user"))]),
        );
        assert!(matches!(result, Err(Error::Constraint(_))));
        // 失败的更新不落库
        let kept = db.rows("posts")?;
        assert_eq!(kept[0].get("author_id"), Some(&Value::String(row_id(&user))));
        Ok(())
    }

    #[test]
    fn test_delete_restrict_blocks_with_zero_side_effects() -> Result<()> {
        let mut db = users_posts(None); // 默认restrict
        let user = db.insert("users", Row::from([("name".to_string(), Value::from("ann"))]))?;
        db.insert(
            "posts",
            Row::from([("author_id".to_string(), Value::String(row_id(&user)))]),
        )?;
        let before = db.clone();
        let result = db.delete("users", &row_id(&user));
        assert!(matches!(result, Err(Error::Constraint(_))));
        // 两张表完全没动
        assert_eq!(db, before);
        Ok(())
    }

    #[test]
    fn test_delete_cascade_recurses() -> Result<()> {
        // users <- posts (cascade) <- comments (cascade)
        let mut db = users_posts(Some(ReferentialAction::Cascade));
        db.define_table(
            "comments",
            vec![Column::new("post_id", DataType::Uuid)],
            vec![ForeignKey::new("post_id", "posts", Some(ReferentialAction::Cascade))],
        )?;
        let user = db.insert("users", Row::from([("name".to_string(), Value::from("ann"))]))?;
        let post = db.insert(
            "posts",
            Row::from([("author_id".to_string(), Value::String(row_id(&user)))]),
        )?;
        db.insert(
            "comments",
            Row::from([("post_id".to_string(), Value::String(row_id(&post)))]),
        )?;
        db.delete("users", &row_id(&user))?;
        assert!(db.rows("users")?.is_empty());
        assert!(db.rows("posts")?.is_empty());
        assert!(db.rows("comments")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_delete_set_null_keeps_dependent() -> Result<()> {
        let mut db = users_posts(Some(ReferentialAction::SetNull));
        let user = db.insert("users", Row::from([("name".to_string(), Value::from("ann"))]))?;
        let post = db.insert(
            "posts",
            Row::from([
                ("title".to_string(), Value::from("kept")),
                ("author_id".to_string(), Value::String(row_id(&user))),
            ]),
        )?;
        db.delete("users", &row_id(&user))?;
        let rows = db.rows("posts")?;
        assert_eq!(rows.len(), 1);
        assert_eq!(row_id(&rows[0]), row_id(&post));
        assert_eq!(rows[0].get("author_id"), Some(&Value::Null));
        assert_eq!(rows[0].get("title"), Some(&Value::from("kept")));
        Ok(())
    }

    #[test]
    fn test_delete_cyclic_cascade_terminates() -> Result<()> {
        // a.b_id -> b (cascade), b.a_id -> a (cascade)：互相引用成环
        let mut db = Database::new();
        db.define_table("a", vec![], vec![])?;
        db.define_table(
            "b",
            vec![Column::new("a_id", DataType::Uuid)],
            vec![ForeignKey::new("a_id", "a", Some(ReferentialAction::Cascade))],
        )?;
        db.add_column(
            "a",
            Column::new("b_ref", DataType::Uuid),
            Some(ForeignKey::new("b_ref", "b", Some(ReferentialAction::Cascade))),
        )?;
        let ra = db.insert("a", Row::new())?;
        let rb = db.insert("b", Row::from([("a_id".to_string(), Value::String(row_id(&ra)))]))?;
        db.update("a", &row_id(&ra), Row::from([("b_ref".to_string(), Value::String(row_id(&rb)))]))?;
        db.delete("a", &row_id(&ra))?;
        assert!(db.rows("a")?.is_empty());
        assert!(db.rows("b")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_add_and_drop_column() -> Result<()> {
        let mut db = Database::new();
        db.define_table("t", vec![Column::new("name", DataType::String)], vec![])?;
        db.insert("t", Row::from([("name".to_string(), Value::from("a"))]))?;
        db.add_column("t", Column::new("age", DataType::Number), None)?;
        // 已有行回填Null
        assert_eq!(db.rows("t")?[0].get("age"), Some(&Value::Null));
        db.drop_column("t", "age")?;
        assert!(!db.rows("t")?[0].contains_key("age"));
        // 不存在的列
        assert!(matches!(db.drop_column("t", "age"), Err(Error::NotFound(_))));
        // 身份列受保护
        assert!(matches!(db.drop_column("t", ID_COLUMN), Err(Error::InvalidData(_))));
        Ok(())
    }

    #[test]
    fn test_import_overwrite_and_merge() -> Result<()> {
        let mut db = Database::new();
        db.define_table("keep", vec![Column::new("name", DataType::String)], vec![])?;
        db.define_table("shared", vec![Column::new("v", DataType::Number)], vec![])?;
        db.insert("shared", Row::from([("v".to_string(), Value::from(1.0))]))?;

        let mut other = Database::new();
        other.define_table("shared", vec![Column::new("v", DataType::Number)], vec![])?;
        other.insert("shared", Row::from([("v".to_string(), Value::from(2.0))]))?;
        other.meta.extra.insert("origin".to_string(), serde_json::json!("import"));

        // 合并：同名表被覆盖，没同名的保留，meta浅合并
        db.import(serde_json::to_value(&other)?, false)?;
        assert!(db.table("keep").is_ok());
        assert_eq!(db.rows("shared")?.len(), 1);
        assert_eq!(db.rows("shared")?[0].get("v"), Some(&Value::from(2.0)));
        assert_eq!(db.meta.extra.get("origin"), Some(&serde_json::json!("import")));

        // 整库替换
        db.import(serde_json::to_value(&other)?, true)?;
        assert!(db.table("keep").is_err());
        Ok(())
    }

    #[test]
    fn test_import_rejects_malformed_document() {
        let mut db = Database::new();
        let result = db.import(serde_json::json!({"tables": {}}), true);
        assert!(matches!(result, Err(Error::InvalidData(_))));
        let result = db.import(serde_json::json!({"meta": {}}), false);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_load_save_roundtrip() -> Result<()> {
        let mut db = users_posts(None);
        db.insert("users", Row::from([("name".to_string(), Value::from("ann"))]))?;
        let mut store = Memory::new();
        db.save(&mut store)?;
        let loaded = Database::load(&store)?;
        assert_eq!(loaded, db);
        // 空存储给空库
        let empty = Database::load(&Memory::new())?;
        assert!(empty.tables().next().is_none());
        Ok(())
    }
}
