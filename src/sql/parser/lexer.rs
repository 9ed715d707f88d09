use crate::errinput;
use std::fmt::Display;
use std::iter::Peekable;
use std::str::Chars;

/// 词法解析Token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(String),
    String(String),
    Identifier(String), // 普通标志符
    Keyword(Keyword),
    Period,             // .
    Equal,              // =
    NotEqual,           // !=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=
    LessThan,           // <
    LessThanOrEqual,    // <=
    Minus,              // -
    Asterisk,           // *
    Comma,              // ,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Number(n) => n,
            Self::String(s) => s,
            Self::Identifier(s) => s,
            Self::Keyword(k) => return std::fmt::Display::fmt(&k, f),
            Self::Period => ".",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Minus => "-",
            Self::Asterisk => "*",
            Self::Comma => ",",
        })
    }
}

impl From<Keyword> for Token {
    fn from(key: Keyword) -> Self {
        Self::Keyword(key)
    }
}

/// 词法关键字
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Keyword {
    Asc,
    Delete,
    Desc,
    Diff,
    Difference,
    False,
    Files,
    From,
    Insert,
    Intersect,
    Into,
    Join,
    Limit,
    On,
    Orderby,
    Select,
    Set,
    Show,
    Sortby,
    Tables,
    True,
    Union,
    Update,
    Where,
}

impl TryFrom<&str> for Keyword {
    // Use a cheap static error string. This just indicates it's not a keyword.
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Only compare lowercase, which is enforced by the lexer. This avoids
        // allocating a string to change the case. Assert this.
        debug_assert!(value.chars().all(|c| !c.is_uppercase()), "keyword must be lowercase");
        Ok(match value {
            "asc" => Self::Asc,
            "delete" => Self::Delete,
            "desc" => Self::Desc,
            "diff" => Self::Diff,
            "difference" => Self::Difference,
            "false" => Self::False,
            "files" => Self::Files,
            "from" => Self::From,
            "insert" => Self::Insert,
            "intersect" => Self::Intersect,
            "into" => Self::Into,
            "join" => Self::Join,
            "limit" => Self::Limit,
            "on" => Self::On,
            "orderby" => Self::Orderby,
            "select" => Self::Select,
            "set" => Self::Set,
            "show" => Self::Show,
            "sortby" => Self::Sortby,
            "tables" => Self::Tables,
            "true" => Self::True,
            "union" => Self::Union,
            "update" => Self::Update,
            "where" => Self::Where,
            _ => return Err("not a keyword"),
        })
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Asc => "ASC",
            Self::Delete => "DELETE",
            Self::Desc => "DESC",
            Self::Diff => "DIFF",
            Self::Difference => "DIFFERENCE",
            Self::False => "FALSE",
            Self::Files => "FILES",
            Self::From => "FROM",
            Self::Insert => "INSERT",
            Self::Intersect => "INTERSECT",
            Self::Into => "INTO",
            Self::Join => "JOIN",
            Self::Limit => "LIMIT",
            Self::On => "ON",
            Self::Orderby => "ORDERBY",
            Self::Select => "SELECT",
            Self::Set => "SET",
            Self::Show => "SHOW",
            Self::Sortby => "SORTBY",
            Self::Tables => "TABLES",
            Self::True => "TRUE",
            Self::Union => "UNION",
            Self::Update => "UPDATE",
            Self::Where => "WHERE",
        })
    }
}

/// # 词法分析器
///
/// 把一行查询文本拆成Token流。关键字匹配忽略大小写；
/// 标识符保留原始大小写（字段名大小写敏感，表名由语法
/// 分析阶段归一成小写）。双字符操作符（`!=` `>=` `<=`）
/// 在单字符前缀之前匹配，避免歧义。
///
/// ```text
/// select name,age from users where age >= 18 orderby age desc limit 3
/// ```
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Iterator for Lexer<'_> {
    type Item = crate::db_error::Result<Token>;
    fn next(&mut self) -> Option<Self::Item> {
        match self.scan_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => self.chars.peek().map(|c| errinput!("unexpected character {c}")),
            Err(err) => Some(Err(err)),
        }
    }
}

impl<'a> Lexer<'a> {
    /// 创建一个解析器结构体：
    ///
    /// 输入 `input`链式调用[`str::chars`] 和 [`Iterator::peekable`]函数
    /// 返回一个[`Peekable`]的迭代器
    pub fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable() }
    }

    /// 返回下一个字符（`char`），仅当它满足给定的谓词条件。
    /// 满足则消费并返回该字符，否则不消费返回 `None`。
    fn next_char_predicate<F>(&mut self, predicate: F) -> Option<char>
    where
        F: Fn(&char) -> bool,
    {
        self.chars.peek().filter(|&c| predicate(c))?;
        self.chars.next()
    }

    fn next_is(&mut self, ch: char) -> bool {
        self.next_char_predicate(|c| ch.eq(c)).is_some()
    }

    fn next_map<F, T>(&mut self, map: F) -> Option<T>
    where
        F: Fn(&char) -> Option<T>,
    {
        // 获取下一个元素
        let value = self.chars.peek().copied().and_then(|c| map(&c))?;
        self.chars.next();
        Some(value)
    }

    fn scan_symbol(&mut self) -> Option<Token> {
        let mut token = self.next_map(|c| {
            Some(match c {
                '.' => Token::Period,
                ',' => Token::Comma,
                '=' => Token::Equal,
                '>' => Token::GreaterThan,
                '<' => Token::LessThan,
                '-' => Token::Minus,
                '*' => Token::Asterisk,
                '!' => Token::NotEqual, // 仅当后随=时合法，见下
                _ => return None,
            })
        })?;
        token = match token {
            // 双字符操作符必须先于单字符前缀匹配
            Token::NotEqual => {
                if self.next_is('=') {
                    Token::NotEqual
                } else {
                    return None;
                }
            }
            Token::GreaterThan if self.next_is('=') => Token::GreaterThanOrEqual,
            Token::LessThan if self.next_is('=') => Token::LessThanOrEqual,
            token => token,
        };
        Some(token)
    }

    /// 扫描并返回下一个 `Token`（如果有的话）。
    ///
    /// 1. 跳过空白字符
    /// 2. 预览下一个字符，判断Token类别并分派扫描方法：
    ///    - `'` 字符串字面量
    ///    - `"` 带引号的标识符
    ///    - 数字 数值字面量
    ///    - 字母 标识符或关键字
    ///    - 其余 操作符号
    fn scan_token(&mut self) -> crate::db_error::Result<Option<Token>> {
        //1、跳过空白字符串
        self.skip_whitespace();

        //2、读取下一个元素，注意这里通过peek去借用
        let Some(c) = self.chars.peek() else {
            return Ok(None);
        };
        //3、根据元素类型，决定后续使用什么方法展开扫描
        match c {
            '\'' => self.scan_string(),
            '"' => self.scan_quoted(),
            '0'..='9' => Ok(self.scan_number()),
            c if c.is_alphabetic() => Ok(self.scan_keyword_or_identifier()),
            _ => Ok(self.scan_symbol()),
        }
    }

    /// 扫描并返回下一个 **标识符 (identifier)** 或 **关键字 (keyword)**。
    ///
    /// 标识符保留原始大小写；关键字匹配用小写副本，
    /// 因此 `SELECT`/`select`/`Select` 等价，而字段名 `Name` 与
    /// `name` 是两个不同的字段。
    fn scan_keyword_or_identifier(&mut self) -> Option<Token> {
        let mut result = self.next_char_predicate(|c| c.is_alphabetic())?.to_string();

        while let Some(c) = self.next_char_predicate(|c| c.is_alphanumeric() || '_'.eq(c)) {
            result.push(c);
        }

        // 判断是否能和关键字匹配上
        // 是 => 返回对应的关键字token
        // 否 => 返回普通标识符
        if let Ok(keyword) = Keyword::try_from(result.to_lowercase().as_str()) {
            return Some(Token::Keyword(keyword));
        }
        Some(Token::Identifier(result))
    }

    /// 带双引号的标识符，引号内原样保留
    fn scan_quoted(&mut self) -> crate::db_error::Result<Option<Token>> {
        //1、判断第一个字符是不是"号
        if !self.next_is('"') {
            return Ok(None);
        }
        let mut result_str = String::new();
        loop {
            match self.chars.next() {
                Some('"') => break,
                Some(c) => result_str.push(c),
                None => return errinput!("unexpected end of quoted identifier"),
            }
        }
        Ok(Some(Token::Identifier(result_str)))
    }

    /// 字符串扫描规则：字符串是由两个单引号引起来的`'test'`
    ///
    /// 两个连续单引号转义成一个，扫描到闭合引号跳出循环
    fn scan_string(&mut self) -> crate::db_error::Result<Option<Token>> {
        //1、判断第一个字符是不是'符号
        if !self.next_is('\'') {
            return Ok(None);
        }
        let mut result_str = String::new();
        loop {
            match self.chars.next() {
                Some('\'') if self.next_is('\'') => result_str.push('\''),
                Some('\'') => break,
                Some(c) => result_str.push(c),
                None => return errinput!("unexpected end of string literal"),
            }
        }
        Ok(Some(Token::String(result_str)))
    }

    /// 扫描数值字面量：整数部分、可选的小数部分、可选的科学计数指数
    fn scan_number(&mut self) -> Option<Token> {
        // 扫描整数部分
        let mut number = self.next_char_predicate(|e| e.is_ascii_digit())?.to_string();
        while let Some(c) = self.next_char_predicate(|e| e.is_ascii_digit()) {
            number.push(c);
        }
        // 扫描小数部分
        if self.next_is('.') {
            number.push('.');
            while let Some(n) = self.next_char_predicate(|c| c.is_ascii_digit()) {
                number.push(n);
            }
        }
        // 扫描指数部分
        if let Some(exp) = self.next_char_predicate(|c| 'e'.eq(c) || 'E'.eq(c)) {
            number.push(exp);
            if let Some(sign) = self.next_char_predicate(|c| '+'.eq(c) || '-'.eq(c)) {
                number.push(sign);
            }
            while let Some(ch) = self.next_char_predicate(|c| c.is_ascii_digit()) {
                number.push(ch);
            }
        }
        Some(Token::Number(number))
    }

    /// 消耗掉空字符串
    fn skip_whitespace(&mut self) {
        while self.next_char_predicate(|c| c.is_whitespace()).is_some() {}
    }
}
