//! 格式转换器
//!
//! 一次性批量转换：读取「每行一个 Python 字面量字典」的旧日志，
//! 写出「每行一个 JSON 对象」的新文件，数组字段归一化为普通嵌套
//! 序列。无流式状态；输出是确定性的（相同输入两次运行产生逐字节
//! 相同的输出）。
//!
//! 输出的分隔符与 Python `json.dump` 的默认值一致（`", "` 和
//! `": "`），键保持插入顺序（serde_json 的 `preserve_order`）。

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::ConvertError;

/// 转换结果摘要
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// 读取的非空行数
    pub lines_read: usize,

    /// 成功写出的行数
    pub lines_written: usize,

    /// 跳过的格式错误行数（仅在跳过策略下非零）
    pub lines_skipped: usize,
}

/// 转换整个文件
///
/// 格式错误的行按配置处理：`continue_on_error` 为 true 时跳过并
/// 告警，否则以 [`ConvertError::Parse`]（含 1 起始行号）中止。
pub fn convert_file(
    input: &Path,
    output: &Path,
    continue_on_error: bool,
) -> Result<ConvertSummary, ConvertError> {
    let content = fs::read_to_string(input).map_err(|source| ConvertError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let file = fs::File::create(output).map_err(|source| ConvertError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let mut summary = ConvertSummary::default();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        summary.lines_read += 1;

        match parse_python_literal(line) {
            Ok(value) => {
                let json = to_python_json(&value).map_err(|source| ConvertError::Write {
                    path: output.to_path_buf(),
                    source,
                })?;
                writer
                    .write_all(json.as_bytes())
                    .and_then(|_| writer.write_all(b"\n"))
                    .map_err(|source| ConvertError::Write {
                        path: output.to_path_buf(),
                        source,
                    })?;
                summary.lines_written += 1;
            },
            Err(e) if continue_on_error => {
                tracing::warn!("Skipping malformed line {}: {}", index + 1, e.reason);
                summary.lines_skipped += 1;
            },
            Err(e) => {
                return Err(ConvertError::Parse {
                    line: index + 1,
                    column: e.column,
                    reason: e.reason,
                });
            },
        }
    }

    writer.flush().map_err(|source| ConvertError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(summary)
}

/// 单行解析失败（列号为 1 起始）
#[derive(Debug)]
pub struct PyParseError {
    pub column: usize,
    pub reason: String,
}

/// 解析一行 Python 字面量
///
/// 支持的子集：dict / list / tuple / str（单双引号）/ int / float /
/// True / False / None。元组输出为数组；非字符串键按 Python
/// `json.dump` 的规则转成字符串。
pub fn parse_python_literal(line: &str) -> Result<Value, PyParseError> {
    let mut parser = Parser {
        bytes: line.as_bytes(),
        pos: 0,
    };
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos != parser.bytes.len() {
        return Err(parser.error("trailing characters after literal"));
    }
    Ok(value)
}

/// 按 Python `json.dump` 的分隔符序列化（`", "` / `": "`，单行）
pub fn to_python_json(value: &Value) -> io::Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PySpacedFormatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `json.dump` 默认分隔符的 Formatter
struct PySpacedFormatter;

impl serde_json::ser::Formatter for PySpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Python 字面量的递归下降解析器
struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> PyParseError {
        PyParseError {
            column: self.pos + 1,
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), PyParseError> {
        match self.peek() {
            Some(b) if b == expected => {
                self.pos += 1;
                Ok(())
            },
            Some(b) => Err(self.error(&format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))),
            None => Err(self.error(&format!("expected '{}', found end of line", expected as char))),
        }
    }

    fn parse_value(&mut self) -> Result<Value, PyParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => self.parse_dict(),
            Some(b'[') => self.parse_sequence(b'[', b']'),
            Some(b'(') => self.parse_sequence(b'(', b')'),
            Some(b'\'') | Some(b'"') => Ok(Value::String(self.parse_string()?)),
            Some(b) if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.' => {
                self.parse_number()
            },
            Some(b) if b.is_ascii_alphabetic() => self.parse_keyword(),
            Some(b) => Err(self.error(&format!("unexpected character '{}'", b as char))),
            None => Err(self.error("unexpected end of line")),
        }
    }

    fn parse_dict(&mut self) -> Result<Value, PyParseError> {
        self.expect(b'{')?;
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(map));
        }

        loop {
            let key = self.parse_value()?;
            self.skip_whitespace();
            self.expect(b':')?;
            let value = self.parse_value()?;
            map.insert(json_key(&key), value);

            self.skip_whitespace();
            match self.bump() {
                Some(b',') => {
                    // 允许尾随逗号
                    self.skip_whitespace();
                    if self.peek() == Some(b'}') {
                        self.pos += 1;
                        return Ok(Value::Object(map));
                    }
                },
                Some(b'}') => return Ok(Value::Object(map)),
                _ => return Err(self.error("expected ',' or '}' in dict")),
            }
        }
    }

    fn parse_sequence(&mut self, open: u8, close: u8) -> Result<Value, PyParseError> {
        self.expect(open)?;
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(b',') => {
                    self.skip_whitespace();
                    if self.peek() == Some(close) {
                        self.pos += 1;
                        return Ok(Value::Array(items));
                    }
                },
                Some(b) if b == close => return Ok(Value::Array(items)),
                _ => return Err(self.error("expected ',' or closing bracket in sequence")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, PyParseError> {
        let quote = match self.bump() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(self.error("expected string quote")),
        };

        let mut buf = Vec::new();
        loop {
            match self.bump() {
                Some(b) if b == quote => break,
                Some(b'\\') => match self.bump() {
                    Some(b'n') => buf.push(b'\n'),
                    Some(b't') => buf.push(b'\t'),
                    Some(b'r') => buf.push(b'\r'),
                    Some(b'0') => buf.push(0),
                    Some(b'\\') => buf.push(b'\\'),
                    Some(b'\'') => buf.push(b'\''),
                    Some(b'"') => buf.push(b'"'),
                    Some(b'x') => {
                        let code = self.parse_hex_digits(2)?;
                        buf.push(code as u8);
                    },
                    Some(b'u') => {
                        let code = self.parse_hex_digits(4)?;
                        match char::from_u32(code) {
                            Some(c) => {
                                let mut utf8 = [0u8; 4];
                                buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                            },
                            None => return Err(self.error("invalid unicode escape")),
                        }
                    },
                    // Python 对未知转义保留反斜杠本身
                    Some(b) => {
                        buf.push(b'\\');
                        buf.push(b);
                    },
                    None => return Err(self.error("unterminated escape sequence")),
                },
                Some(b) => buf.push(b),
                None => return Err(self.error("unterminated string literal")),
            }
        }

        String::from_utf8(buf).map_err(|_| self.error("invalid UTF-8 in string literal"))
    }

    fn parse_hex_digits(&mut self, count: usize) -> Result<u32, PyParseError> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = match self.bump() {
                Some(b) if b.is_ascii_hexdigit() => (b as char)
                    .to_digit(16)
                    .unwrap_or(0),
                _ => return Err(self.error("invalid hex escape")),
            };
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Value, PyParseError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }

        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' => {
                    is_float = true;
                    self.pos += 1;
                },
                b'e' | b'E' => {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some(b'-' | b'+')) {
                        self.pos += 1;
                    }
                },
                b'_' => self.pos += 1, // Python 数字分隔符
                _ => break,
            }
        }

        let text: String = String::from_utf8_lossy(&self.bytes[start..self.pos]).replace('_', "");
        if text.is_empty() || text == "-" || text == "+" {
            return Err(self.error("invalid number literal"));
        }

        if is_float {
            let parsed: f64 = text
                .parse()
                .map_err(|_| self.error("invalid float literal"))?;
            match Number::from_f64(parsed) {
                Some(n) => Ok(Value::Number(n)),
                None => Err(self.error("non-finite float literal")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => Ok(Value::Number(Number::from(n))),
                // i64 溢出时回退到浮点（与 Python 任意精度整数的近似）
                Err(_) => {
                    let parsed: f64 = text
                        .parse()
                        .map_err(|_| self.error("invalid integer literal"))?;
                    match Number::from_f64(parsed) {
                        Some(n) => Ok(Value::Number(n)),
                        None => Err(self.error("non-finite integer literal")),
                    }
                },
            }
        }
    }

    fn parse_keyword(&mut self) -> Result<Value, PyParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }

        match &self.bytes[start..self.pos] {
            b"True" => Ok(Value::Bool(true)),
            b"False" => Ok(Value::Bool(false)),
            b"None" => Ok(Value::Null),
            other => {
                let word = String::from_utf8_lossy(other).into_owned();
                self.pos = start;
                Err(self.error(&format!("unknown keyword '{}'", word)))
            },
        }
    }
}

/// 非字符串键按 Python `json.dump` 的规则转成字符串
fn json_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Null => "null".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
