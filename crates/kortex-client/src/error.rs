//! 客户端层错误类型定义

use crate::session::SubscriptionId;
use thiserror::Error;

/// 客户端层错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    /// 连接建立失败（致命，回放开始前触发）
    #[error("Connection failed: {0}")]
    Connection(String),

    /// 传输层错误（会话建立后的 RPC 调用失败）
    #[error("Transport error: {0}")]
    Transport(String),

    /// 未知的通知订阅句柄
    #[error("Unknown subscription: {0:?}")]
    UnknownSubscription(SubscriptionId),

    /// 会话已关闭
    #[error("Session closed")]
    SessionClosed,
}
