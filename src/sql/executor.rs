use serde::Serialize;

use crate::db_error::{Error, Result};
use crate::sql::parser::ast::{Command, Condition, Direction, SetOperator};
use crate::store::Database;
use crate::types::{Row, Value};

/// 执行结果的统一信封。
/// 成功时带数据与结果种类，修改型命令另带受影响行数；
/// 失败走`Error`，两者不会同时出现。
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutcome {
    pub result_kind: ResultKind,
    pub data: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_row_count: Option<u64>,
}

impl QueryOutcome {
    fn rows(result_kind: ResultKind, data: Vec<Row>) -> Self {
        Self { result_kind, data, affected_row_count: None }
    }
}

/// 结果种类，与命令一一对应
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Select,
    Insert,
    Update,
    Delete,
    Join,
    Union,
    Intersect,
    Difference,
    Tables,
}

/// 查询求值器：把解析好的`Command`跑在`Database`上。
///
/// 求值顺序与语言语义一致：SELECT先过滤再排序再截断最后投影；
/// 修改型命令语句级全有或全无。
pub struct Executor<'a> {
    db: &'a mut Database,
}

impl<'a> Executor<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    pub fn execute(&mut self, command: Command) -> Result<QueryOutcome> {
        match command {
            Command::Select { table, fields, filter, order_by, limit } => {
                self.select(table, fields, filter, order_by, limit)
            }
            Command::Insert { table, record } => self.insert(table, record),
            Command::Update { table, column, value, filter } => {
                self.update(table, column, value, filter)
            }
            Command::Delete { table, filter } => self.delete(table, filter),
            Command::Join { left, right, left_field, right_field } => {
                self.join(left, right, left_field, right_field)
            }
            Command::SetOp { op, left, right } => self.set_op(op, left, right),
            Command::ShowTables => self.show_tables(),
        }
    }

    /// 过滤 -> 稳定排序 -> 截断 -> 投影
    fn select(
        &self,
        table: String,
        fields: Option<Vec<String>>,
        filter: Option<Condition>,
        order_by: Option<(String, Direction)>,
        limit: Option<usize>,
    ) -> Result<QueryOutcome> {
        let mut rows = self.db.rows(&table)?;
        if let Some(condition) = &filter {
            rows.retain(|row| condition.matches(row));
        }
        if let Some((field, direction)) = &order_by {
            // sort_by是稳定排序，同序值保持相对顺序
            rows.sort_by(|a, b| {
                let left = a.get(field).unwrap_or(&Value::Null);
                let right = b.get(field).unwrap_or(&Value::Null);
                let ordering = left.compare_order(right);
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        if let Some(fields) = &fields {
            // 只保留行上实际存在的请求字段
            rows = rows
                .into_iter()
                .map(|row| {
                    fields
                        .iter()
                        .filter_map(|f| row.get(f).map(|v| (f.clone(), v.clone())))
                        .collect()
                })
                .collect();
        }
        Ok(QueryOutcome::rows(ResultKind::Select, rows))
    }

    fn insert(
        &mut self,
        table: String,
        record: serde_json::Map<String, serde_json::Value>,
    ) -> Result<QueryOutcome> {
        let mut data = Row::new();
        for (key, value) in &record {
            data.insert(key.clone(), Value::from_json(value)?);
        }
        let row = self.db.insert(&table, data)?;
        Ok(QueryOutcome {
            result_kind: ResultKind::Insert,
            data: vec![row],
            affected_row_count: Some(1),
        })
    }

    /// 无WHERE时对每一行应用赋值；受影响行数按存储值真正发生
    /// 变化的行计数，返回命中的行集
    fn update(
        &mut self,
        table: String,
        column: String,
        value: Value,
        filter: Option<Condition>,
    ) -> Result<QueryOutcome> {
        // 目标列先行校验，空表上的未知列同样报错
        if !self.db.table(&table)?.schema.has_column(&column) {
            return Err(Error::NotFound(format!("column {column} in table {table}")));
        }
        let matching: Vec<String> = self
            .db
            .table(&table)?
            .rows
            .iter()
            .filter(|(_, row)| filter.as_ref().map_or(true, |c| c.matches(row)))
            .map(|(id, _)| id.clone())
            .collect();
        let mut changed = 0u64;
        let mut data = Vec::with_capacity(matching.len());
        for id in matching {
            let before = self.db.table(&table)?.row(&id).and_then(|r| r.get(&column)).cloned();
            let row = self.db.update(&table, &id, Row::from([(column.clone(), value.clone())]))?;
            if before.as_ref() != row.get(&column) {
                changed += 1;
            }
            data.push(row);
        }
        Ok(QueryOutcome {
            result_kind: ResultKind::Update,
            data,
            affected_row_count: Some(changed),
        })
    }

    /// 无WHERE时清空整表；只返回计数不返回残余数据。
    /// 语句级原子：任何一行被restrict阻塞就整体回滚。
    fn delete(&mut self, table: String, filter: Option<Condition>) -> Result<QueryOutcome> {
        let matching: Vec<String> = self
            .db
            .table(&table)?
            .rows
            .iter()
            .filter(|(_, row)| filter.as_ref().map_or(true, |c| c.matches(row)))
            .map(|(id, _)| id.clone())
            .collect();
        let backup = self.db.clone();
        let mut deleted = 0u64;
        let mut failure = None;
        for id in &matching {
            // 行可能已被前面的级联连带删除
            if self.db.table(&table)?.row(id).is_none() {
                deleted += 1;
                continue;
            }
            if let Err(err) = self.db.delete(&table, id) {
                failure = Some(err);
                break;
            }
            deleted += 1;
        }
        if let Some(err) = failure {
            *self.db = backup;
            return Err(err);
        }
        Ok(QueryOutcome {
            result_kind: ResultKind::Delete,
            data: Vec::new(),
            affected_row_count: Some(deleted),
        })
    }

    /// 内连接：全量笛卡尔积上筛选，连接字段严格相等不做宽化；
    /// 合并行的键带上来源表名前缀避免冲突
    fn join(
        &self,
        left: String,
        right: String,
        left_field: String,
        right_field: String,
    ) -> Result<QueryOutcome> {
        let left_rows = self.db.rows(&left)?;
        let right_rows = self.db.rows(&right)?;
        let mut data = Vec::new();
        for lrow in &left_rows {
            for rrow in &right_rows {
                let (Some(lv), Some(rv)) = (lrow.get(&left_field), rrow.get(&right_field)) else {
                    continue;
                };
                if lv != rv {
                    continue;
                }
                let mut merged = Row::new();
                for (k, v) in lrow {
                    merged.insert(format!("{left}.{k}"), v.clone());
                }
                for (k, v) in rrow {
                    merged.insert(format!("{right}.{k}"), v.clone());
                }
                data.push(merged);
            }
        }
        Ok(QueryOutcome::rows(ResultKind::Join, data))
    }

    /// 集合运算。记录等价即键集与每个键的值完全一致；
    /// 逐一扫描去重，结果集本身也不含重复记录。
    fn set_op(&self, op: SetOperator, left: String, right: String) -> Result<QueryOutcome> {
        let a = self.db.rows(&left)?;
        let b = self.db.rows(&right)?;
        let contains = |rows: &[Row], row: &Row| rows.iter().any(|r| r == row);
        let mut data: Vec<Row> = Vec::new();
        let kind = match op {
            SetOperator::Union => {
                for row in a.iter().chain(b.iter()) {
                    if !contains(&data, row) {
                        data.push(row.clone());
                    }
                }
                ResultKind::Union
            }
            SetOperator::Intersect => {
                for row in &a {
                    if contains(&b, row) && !contains(&data, row) {
                        data.push(row.clone());
                    }
                }
                ResultKind::Intersect
            }
            SetOperator::Difference => {
                for row in &a {
                    if !contains(&b, row) && !contains(&data, row) {
                        data.push(row.clone());
                    }
                }
                ResultKind::Difference
            }
        };
        Ok(QueryOutcome::rows(kind, data))
    }

    /// 表清单，空库返回空序列而不是错误
    fn show_tables(&self) -> Result<QueryOutcome> {
        let data = self
            .db
            .tables()
            .map(|table| {
                Row::from([
                    ("name".to_string(), Value::String(table.name.clone())),
                    ("rowCount".to_string(), Value::Number(table.row_count() as f64)),
                ])
            })
            .collect();
        Ok(QueryOutcome::rows(ResultKind::Tables, data))
    }
}
