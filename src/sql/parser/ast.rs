use crate::types::{Row, Value};

/// 解析后的查询命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 查询语句
    /// - table: 表名
    /// - fields: 投影字段，None表示全投影（`*`或省略字段表）
    /// - filter: 过滤条件
    /// - order_by: 排序字段与方向
    /// - limit: 返回的总条数
    Select {
        table: String,
        fields: Option<Vec<String>>,
        filter: Option<Condition>,
        order_by: Option<(String, Direction)>,
        limit: Option<usize>,
    },

    /// 插入语句
    /// - table: 表名
    /// - record: 行内首个花括号配平的JSON对象载荷
    Insert {
        table: String,
        record: serde_json::Map<String, serde_json::Value>,
    },

    /// 更新语句，仅支持单个赋值的SET子句
    /// - table: 表名
    /// - column: 待更新的列
    /// - value: 新值
    /// - filter: 更新条件
    Update {
        table: String,
        column: String,
        value: Value,
        filter: Option<Condition>,
    },

    /// 从指定表里删除数据
    /// - table: 表名
    /// - filter: 删除条件，缺省清空整表
    Delete {
        table: String,
        filter: Option<Condition>,
    },

    /// 内连接，ON子句里的表名必须与JOIN后的两个表名逐字一致
    Join {
        left: String,
        right: String,
        left_field: String,
        right_field: String,
    },

    /// 集合运算：UNION/INTERSECT/DIFFERENCE
    SetOp {
        op: SetOperator,
        left: String,
        right: String,
    },

    /// 表清单
    ShowTables,
}

/// WHERE条件：`<field> <op> <value>`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Condition {
    /// 判断一行是否命中条件。
    ///
    /// 等值比较按存储的原始值严格比较；大小比较把两边统一宽化成
    /// 数值，任何一边宽化失败视为不命中。
    pub fn matches(&self, row: &Row) -> bool {
        let stored = row.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            CompareOp::Eq => *stored == self.value,
            CompareOp::NotEq => *stored != self.value,
            CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => {
                let (Some(a), Some(b)) = (stored.as_number(), self.value.as_number()) else {
                    return false;
                };
                match self.op {
                    CompareOp::Gt => a > b,
                    CompareOp::Ge => a >= b,
                    CompareOp::Lt => a < b,
                    CompareOp::Le => a <= b,
                    _ => unreachable!(),
                }
            }
        }
    }
}

/// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareOp {
    /// a = b
    Eq,
    /// a != b
    NotEq,
    /// a > b
    Gt,
    /// a >= b
    Ge,
    /// a < b
    Lt,
    /// a <= b
    Le,
}

/// 升降序
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// 集合运算种类
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetOperator {
    Union,
    Intersect,
    Difference,
}
