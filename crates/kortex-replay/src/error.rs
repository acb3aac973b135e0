//! 回放层错误类型定义

use kortex_client::ClientError;
use std::path::PathBuf;
use thiserror::Error;

/// 回放层错误类型
#[derive(Error, Debug)]
pub enum ReplayError {
    /// 客户端/会话错误
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// 回放配置非法
    #[error("Invalid replay config: {0}")]
    Config(String),

    /// 命令文件读取失败
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 命令记录格式错误（1 起始行号）
    #[error("Malformed record at line {line}: {reason}")]
    Record { line: usize, reason: String },

    /// 动作执行线程不可用
    #[error("Action worker unavailable: {0}")]
    Worker(String),
}

/// 格式转换器错误类型
#[derive(Error, Debug)]
pub enum ConvertError {
    /// 输入文件读取失败
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 输出文件写入失败
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Python 字面量解析失败（1 起始行号 / 列号）
    #[error("Parse error at line {line}, column {column}: {reason}")]
    Parse {
        line: usize,
        column: usize,
        reason: String,
    },
}
