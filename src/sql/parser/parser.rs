use std::iter::Peekable;

use crate::db_error::Result;
use crate::errinput;
use crate::sql::parser::ast::{Command, CompareOp, Condition, Direction, SetOperator};
use crate::sql::parser::lexer::{Keyword, Lexer, Token};
use crate::types::Value;

/// 语法分析器：把一行查询文本解析成类型化的`Command`。
///
/// 按首关键字分派的递归下降结构，没有运算符优先级问题——
/// 语言是单子句的。表名位置的标识符归一成小写，字段位置保留
/// 大小写。INSERT的JSON载荷不走词法器，直接在原始行上做花括号
/// 配平提取，载荷缺失是语法错误，载荷解析失败是数据错误。
pub struct Parser<'a> {
    raw: &'a str,
    lexer: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { raw: input, lexer: Lexer::new(input).peekable() }
    }

    /// 解析整行，命令完整后行内不允许再有残余token
    pub fn parse(mut self) -> Result<Command> {
        let command = match self.next_keyword()? {
            Keyword::Select => self.parse_select()?,
            Keyword::Insert => self.parse_insert()?,
            Keyword::Update => self.parse_update()?,
            Keyword::Delete => self.parse_delete()?,
            Keyword::Join => self.parse_join()?,
            Keyword::Union => self.parse_set_op(SetOperator::Union)?,
            Keyword::Intersect => self.parse_set_op(SetOperator::Intersect)?,
            Keyword::Diff | Keyword::Difference => self.parse_set_op(SetOperator::Difference)?,
            Keyword::Show => self.parse_show()?,
            other => return errinput!("unexpected keyword {other}"),
        };
        // INSERT的表名之后是JSON载荷，词法器不消费它
        if !matches!(command, Command::Insert { .. }) {
            self.expect_end()?;
        }
        Ok(command)
    }

    fn next(&mut self) -> Result<Token> {
        self.lexer.next().unwrap_or(errinput!("unexpected end of input"))
    }

    fn peek(&mut self) -> Result<Option<Token>> {
        match self.lexer.peek() {
            None => Ok(None),
            Some(Ok(token)) => Ok(Some(token.clone())),
            Some(Err(err)) => Err(err.clone()),
        }
    }

    fn next_keyword(&mut self) -> Result<Keyword> {
        match self.next()? {
            Token::Keyword(keyword) => Ok(keyword),
            token => errinput!("unexpected token {token}"),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        let token = self.next()?;
        if token != expected {
            return errinput!("expected {expected}, found {token}");
        }
        Ok(())
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        self.expect(Token::Keyword(keyword))
    }

    /// 下一个token恰好是给定关键字时消费它
    fn next_if_keyword(&mut self, keyword: Keyword) -> bool {
        if matches!(self.lexer.peek(), Some(Ok(Token::Keyword(k))) if *k == keyword) {
            self.lexer.next();
            return true;
        }
        false
    }

    /// 表名位置的标识符，归一成小写
    fn next_table_name(&mut self) -> Result<String> {
        Ok(self.next_field_name()?.to_lowercase())
    }

    /// 字段位置的标识符，大小写敏感
    fn next_field_name(&mut self) -> Result<String> {
        match self.next()? {
            Token::Identifier(name) => Ok(name),
            token => errinput!("expected identifier, found {token}"),
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.lexer.next() {
            None => Ok(()),
            Some(Ok(token)) => errinput!("unexpected token {token} after command"),
            Some(Err(err)) => Err(err),
        }
    }

    /// `SELECT [fieldList|*] FROM <table> [WHERE..] [ORDERBY..] [LIMIT n]`
    fn parse_select(&mut self) -> Result<Command> {
        let fields = match self.peek()? {
            Some(Token::Asterisk) => {
                self.next()?;
                None
            }
            // 字段表省略等价于全投影
            Some(Token::Keyword(Keyword::From)) => None,
            _ => {
                let mut fields = vec![self.next_field_name()?];
                while matches!(self.peek()?, Some(Token::Comma)) {
                    self.next()?;
                    fields.push(self.next_field_name()?);
                }
                Some(fields)
            }
        };
        self.expect_keyword(Keyword::From)?;
        let table = self.next_table_name()?;
        let filter = self.parse_where()?;
        let order_by = self.parse_order_by()?;
        let limit = self.parse_limit()?;
        Ok(Command::Select { table, fields, filter, order_by, limit })
    }

    /// `INSERT INTO <table> {json}`
    fn parse_insert(&mut self) -> Result<Command> {
        self.expect_keyword(Keyword::Into)?;
        let table = self.next_table_name()?;
        let payload = extract_json_object(self.raw)?;
        // serde_json的解析失败走InvalidData，与载荷缺失的语法错误区分开
        let document: serde_json::Value = serde_json::from_str(payload)?;
        let serde_json::Value::Object(record) = document else {
            return crate::errdata!("insert payload must be a JSON object");
        };
        Ok(Command::Insert { table, record })
    }

    /// `UPDATE <table> SET <field> = <value> [WHERE..]`，仅单个赋值
    fn parse_update(&mut self) -> Result<Command> {
        let table = self.next_table_name()?;
        self.expect_keyword(Keyword::Set)?;
        let column = self.next_field_name()?;
        self.expect(Token::Equal)?;
        let value = self.parse_value()?;
        if matches!(self.peek()?, Some(Token::Comma)) {
            return errinput!("only a single SET assignment is supported");
        }
        let filter = self.parse_where()?;
        Ok(Command::Update { table, column, value, filter })
    }

    /// `DELETE FROM <table> [WHERE..]`
    fn parse_delete(&mut self) -> Result<Command> {
        self.expect_keyword(Keyword::From)?;
        let table = self.next_table_name()?;
        let filter = self.parse_where()?;
        Ok(Command::Delete { table, filter })
    }

    /// `JOIN <a> <b> ON <a>.<x> = <b>.<y>`
    fn parse_join(&mut self) -> Result<Command> {
        let left = self.next_table_name()?;
        let right = self.next_table_name()?;
        self.expect_keyword(Keyword::On)?;
        let left_table = self.next_table_name()?;
        self.expect(Token::Period)?;
        let left_field = self.next_field_name()?;
        self.expect(Token::Equal)?;
        let right_table = self.next_table_name()?;
        self.expect(Token::Period)?;
        let right_field = self.next_field_name()?;
        if left_table != left || right_table != right {
            return errinput!(
                "ON clause must reference {left} and {right}, found {left_table} and {right_table}"
            );
        }
        Ok(Command::Join { left, right, left_field, right_field })
    }

    /// `UNION|INTERSECT|DIFF|DIFFERENCE <a> <b>`
    fn parse_set_op(&mut self, op: SetOperator) -> Result<Command> {
        let left = self.next_table_name()?;
        let right = self.next_table_name()?;
        Ok(Command::SetOp { op, left, right })
    }

    /// `SHOW TABLES`，部署词汇差异下`SHOW FILES`等价
    fn parse_show(&mut self) -> Result<Command> {
        if self.next_if_keyword(Keyword::Tables) || self.next_if_keyword(Keyword::Files) {
            return Ok(Command::ShowTables);
        }
        errinput!("expected TABLES after SHOW")
    }

    /// `WHERE <field> <op> <value>`
    fn parse_where(&mut self) -> Result<Option<Condition>> {
        if !self.next_if_keyword(Keyword::Where) {
            return Ok(None);
        }
        let field = self.next_field_name()?;
        let op = match self.next()? {
            Token::Equal => CompareOp::Eq,
            Token::NotEqual => CompareOp::NotEq,
            Token::GreaterThanOrEqual => CompareOp::Ge,
            Token::LessThanOrEqual => CompareOp::Le,
            Token::GreaterThan => CompareOp::Gt,
            Token::LessThan => CompareOp::Lt,
            token => return errinput!("expected comparison operator, found {token}"),
        };
        let value = self.parse_value()?;
        Ok(Some(Condition { field, op, value }))
    }

    /// 值字面量：数值串按数值、true/false按布尔、其余按字符串
    fn parse_value(&mut self) -> Result<Value> {
        Ok(match self.next()? {
            Token::Number(n) => match n.parse::<f64>() {
                Ok(number) => Value::Number(number),
                Err(_) => return errinput!("invalid number literal {n}"),
            },
            Token::Minus => match self.next()? {
                Token::Number(n) => match n.parse::<f64>() {
                    Ok(number) => Value::Number(-number),
                    Err(_) => return errinput!("invalid number literal {n}"),
                },
                token => return errinput!("expected number after -, found {token}"),
            },
            // 引号已在词法阶段剥除
            Token::String(s) => Value::String(s),
            Token::Keyword(Keyword::True) => Value::Boolean(true),
            Token::Keyword(Keyword::False) => Value::Boolean(false),
            // 裸词值走统一的字面量转换
            Token::Identifier(raw) => Value::parse_literal(&raw),
            token => return errinput!("expected value, found {token}"),
        })
    }

    /// `ORDERBY <field> [ASC|DESC]`，SORTBY是历史别名
    fn parse_order_by(&mut self) -> Result<Option<(String, Direction)>> {
        if !self.next_if_keyword(Keyword::Orderby) && !self.next_if_keyword(Keyword::Sortby) {
            return Ok(None);
        }
        let field = self.next_field_name()?;
        let direction = if self.next_if_keyword(Keyword::Desc) {
            Direction::Desc
        } else {
            self.next_if_keyword(Keyword::Asc);
            Direction::Asc
        };
        Ok(Some((field, direction)))
    }

    /// `LIMIT <n>`，n必须是非负整数
    fn parse_limit(&mut self) -> Result<Option<usize>> {
        if !self.next_if_keyword(Keyword::Limit) {
            return Ok(None);
        }
        match self.next()? {
            Token::Number(n) => match n.parse::<usize>() {
                Ok(limit) => Ok(Some(limit)),
                Err(_) => errinput!("limit must be a non-negative integer, found {n}"),
            },
            token => errinput!("limit must be a non-negative integer, found {token}"),
        }
    }
}

/// 取原始行内首个花括号配平的`{...}`片段。
/// 字符串内部的花括号与转义引号不参与配平。
fn extract_json_object(raw: &str) -> Result<&str> {
    let Some(start) = raw.find('{') else {
        return errinput!("insert requires a JSON record payload");
    };
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in raw[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&raw[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    errinput!("unbalanced JSON record payload")
}
