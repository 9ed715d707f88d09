//! # 值类型与类型转换模块概览
//!
//! 本模块提供查询语言层面的**原始数据类型**、**值表示**与**文本转换**抽象，
//! 供解析与执行阶段复用。
//!
//! ## 主要组成
//! - `DataType`：列声明的类型枚举（`String`/`Number`/`Boolean`/`Date`/`Uuid`）。
//!   实现 `Display`，以快照文件中的小写形式输出（如 `number`）。
//!
//! - `Value`：行数据的统一承载（含 `Null`/`Boolean(bool)`/`Number(f64)`/`String(String)`）。
//!   - **序列化规则**：`#[serde(untagged)]`，与 JSON 的
//!     null/boolean/number/string 一一对应，快照文件里没有标签。
//!   - **等价语义**：`Number` 通过 `f64::to_bits` 比较，`NaN == NaN`，
//!     因此 `Value` 可实现 `Eq`/`Hash`（集合运算的去重依赖这一点）。
//!   - **类型判定**：`matches_type` 校验值是否满足列声明；`Date` 列接受
//!     epoch 秒数或字符串，`Uuid` 列接受字符串，`Null` 对任何列合法。
//!   - **数值转换**：`as_number` 把值宽化为 `f64`（布尔按 1/0，数值字符串
//!     按解析结果），WHERE 的大小比较与 ORDERBY 都建立在它之上。
//!
//! - `Row`：`BTreeMap<String, Value>`，一行数据即列名到值的映射，
//!   行的身份键保存在表里而非行内顺序上。
//!
//! ## 备注
//! - 本模块**不**实现 SQL 三值逻辑；`Null` 的比较行为在条件求值处
//!   显式处理（等值比较按普通值对待，大小比较一律不命中）。

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::db_error::Result;

/// 一行数据：列名到值的映射
pub type Row = BTreeMap<String, Value>;

/// 列声明的数据类型
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// UTF-8编码的字符串
    String,
    /// 64bit浮点数（整数同样落在这里，与JSON的number对齐）
    Number,
    /// 布尔类型：true/false
    Boolean,
    /// 日期：epoch秒数或字符串形式
    Date,
    /// UUID样式的标识串
    Uuid,
}

/// 实现格式化打印
impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Uuid => "uuid",
        })
    }
}

/// 行内值的统一承载
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // 使用to_bits来比较 是因为f64没有实现Eq特征，不具备完全等价的特性
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // 先写入discriminant,避免不同变体的相同内部数据发生hash碰撞
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Number(n) => n.to_bits().hash(state),
            Value::String(s) => s.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => {
                // 整数值不带小数点输出，与JSON展示保持一致
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::String(s) => f.write_str(s),
        }
    }
}

impl Value {
    /// 把查询文本里的字面量转换成类型化的值：
    /// - 数值串 => `Number`
    /// - true/false（忽略大小写）=> `Boolean`
    /// - 其余 => `String`（引号已在词法阶段剥除）
    pub fn parse_literal(raw: &str) -> Value {
        if raw.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        let numeric = !raw.is_empty()
            && raw.chars().any(|c| c.is_ascii_digit())
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
        if numeric {
            if let Ok(n) = raw.parse::<f64>() {
                return Value::Number(n);
            }
        }
        Value::String(raw.to_string())
    }

    /// JSON载荷到值的转换，INSERT与快照导入共用。
    /// 数组与嵌套对象不是合法的列值。
    pub fn from_json(json: &serde_json::Value) -> Result<Value> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Ok(Value::Number(f)),
                None => crate::errdata!("number {n} is not representable"),
            },
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            other => crate::errdata!("unsupported JSON value {other} for a column"),
        }
    }

    /// 校验非空值是否满足列声明的类型
    pub fn matches_type(&self, datatype: DataType) -> bool {
        match self {
            Value::Null => true,
            value => match datatype {
                DataType::String => matches!(value, Value::String(_)),
                DataType::Number => matches!(value, Value::Number(_)),
                DataType::Boolean => matches!(value, Value::Boolean(_)),
                DataType::Date => matches!(value, Value::Number(_) | Value::String(_)),
                DataType::Uuid => matches!(value, Value::String(_)),
            },
        }
    }

    /// 数值宽化：WHERE的大小比较与ORDERBY在比较前统一走这里
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Null => None,
        }
    }

    /// 排序比较：双方都能宽化成数值时用 `total_cmp`，
    /// 否则退化成展示字符串的字典序
    pub fn compare_order(&self, other: &Value) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal() {
        assert_eq!(Value::parse_literal("25"), Value::Number(25.0));
        assert_eq!(Value::parse_literal("-1.5"), Value::Number(-1.5));
        assert_eq!(Value::parse_literal("TRUE"), Value::Boolean(true));
        assert_eq!(Value::parse_literal("false"), Value::Boolean(false));
        assert_eq!(Value::parse_literal("alice"), Value::String("alice".to_string()));
        // 引号已剥除的数值串按数值处理，带字母的混合串按字符串处理
        assert_eq!(Value::parse_literal("2x"), Value::String("2x".to_string()));
    }

    #[test]
    fn test_matches_type() {
        assert!(Value::Number(3.0).matches_type(DataType::Number));
        assert!(!Value::String("3".to_string()).matches_type(DataType::Number));
        assert!(Value::Null.matches_type(DataType::Boolean));
        assert!(Value::Number(1700000000.0).matches_type(DataType::Date));
        assert!(Value::String("2024-01-01".to_string()).matches_type(DataType::Date));
        assert!(Value::String("a-b-c".to_string()).matches_type(DataType::Uuid));
        assert!(!Value::Boolean(true).matches_type(DataType::Uuid));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(Value::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Value::String("30".to_string()).as_number(), Some(30.0));
        assert_eq!(Value::Boolean(true).as_number(), Some(1.0));
        assert_eq!(Value::Null.as_number(), None);
        assert_eq!(Value::String("abc".to_string()).as_number(), None);
    }

    #[test]
    fn test_compare_order() {
        let a = Value::Number(20.0);
        let b = Value::String("100".to_string());
        // 数值串参与数值比较 20 < 100
        assert_eq!(a.compare_order(&b), Ordering::Less);
        let c = Value::String("apple".to_string());
        let d = Value::String("banana".to_string());
        assert_eq!(c.compare_order(&d), Ordering::Less);
    }

    #[test]
    fn test_serde_untagged() -> crate::db_error::Result<()> {
        let row: Row = serde_json::from_str(r#"{"age":30,"name":"Z","ok":true,"gone":null}"#)?;
        assert_eq!(row.get("age"), Some(&Value::Number(30.0)));
        assert_eq!(row.get("name"), Some(&Value::String("Z".to_string())));
        assert_eq!(row.get("ok"), Some(&Value::Boolean(true)));
        assert_eq!(row.get("gone"), Some(&Value::Null));
        let json = serde_json::to_string(&Value::Null)?;
        assert_eq!(json, "null");
        Ok(())
    }

    #[test]
    fn test_from_json_rejects_nested() {
        let nested = serde_json::json!({"a": 1});
        assert!(Value::from_json(&nested).is_err());
    }
}
