//! 命令记录与文件格式
//!
//! 两种命令文件格式：
//!
//! - **结构化（JSONL）**: 每行一个 JSON 对象，字段为 `world_vector`
//!   （3 个数）、`rotation_delta`（3 个数）、`open_gripper`
//!   （单元素数组，元素为 [0, 1] 内的数或 null）
//! - **传统（Legacy）**: 每行是一个人类可读标签，无结构化字段，
//!   回放器代入固定位姿偏移 [`LEGACY_OFFSET`]
//!
//! 记录一旦解析完成即不可变，按源文件顺序恰好消费一次。

use crate::error::ReplayError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 传统格式的固定位置偏移（y -0.1m, z -0.2m，与原始测试脚本一致）
pub const LEGACY_OFFSET: [f64; 3] = [0.0, -0.1, -0.2];

/// 一条回放单元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// 位置增量（米）
    pub world_vector: [f64; 3],

    /// 姿态增量（度）
    pub rotation_delta: [f64; 3],

    /// 夹爪目标位置，[0, 1]；线上格式为单元素数组 `[x]` 或 `[null]`。
    /// 0.0 和 1.0 是合法边界值（全闭/全开），不视为缺失。
    #[serde(default, with = "gripper_wire")]
    pub open_gripper: Option<f64>,

    /// 传统格式的原始行内容（仅用于回放时回显）
    #[serde(skip)]
    pub label: Option<String>,
}

impl CommandRecord {
    /// 传统格式记录：固定偏移，无姿态增量，无夹爪动作
    pub fn legacy(label: &str) -> Self {
        CommandRecord {
            world_vector: LEGACY_OFFSET,
            rotation_delta: [0.0; 3],
            open_gripper: None,
            label: Some(label.to_string()),
        }
    }
}

/// `open_gripper` 的线上表示：`[0.5]` / `[null]` / 字段缺失
mod gripper_wire {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [*value].serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        match values.as_slice() {
            [value] => Ok(*value),
            [] => Err(D::Error::custom("open_gripper array must not be empty")),
            _ => Err(D::Error::custom(
                "open_gripper array must hold exactly one element",
            )),
        }
    }
}

/// 命令文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// 传统文本（每行一个标签）
    Legacy,
    /// 每行一个 JSON 对象
    Jsonl,
}

/// 解析单行命令记录
pub fn parse_line(line: &str, format: RecordFormat) -> Result<CommandRecord, serde_json::Error> {
    match format {
        RecordFormat::Legacy => Ok(CommandRecord::legacy(line)),
        RecordFormat::Jsonl => serde_json::from_str(line),
    }
}

/// 读取整个命令文件
///
/// 空行被跳过；空文件返回空序列（回放零次迭代，不报错）。
///
/// 格式错误的行按配置处理：`continue_on_error` 为 true 时跳过并
/// 记录警告，否则整个读取以 [`ReplayError::Record`] 失败。
pub fn read_records(
    path: &Path,
    format: RecordFormat,
    continue_on_error: bool,
) -> Result<Vec<CommandRecord>, ReplayError> {
    let content = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line, format) {
            Ok(record) => records.push(record),
            Err(e) if continue_on_error => {
                tracing::warn!("Skipping malformed record at line {}: {}", index + 1, e);
            },
            Err(e) => {
                return Err(ReplayError::Record {
                    line: index + 1,
                    reason: e.to_string(),
                });
            },
        }
    }

    Ok(records)
}
