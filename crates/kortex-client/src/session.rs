//! 机械臂会话能力面
//!
//! 回放器只依赖一组固定的厂商 SDK 能力：读取当前工具位姿、
//! 下发绝对位姿动作、下发夹爪指令、订阅/退订动作与夹爪通知主题。
//! 本模块把这组能力抽象为 `ArmApi` trait，RPC 协议和连接握手
//! 由具体后端实现（仿真后端见 [`crate::sim`]）。
//!
//! # RAII 语义
//!
//! 通知订阅通过 [`Subscription`] 守卫管理：守卫被丢弃时自动退订，
//! 包括超时、错误提前返回和 panic 展开等所有退出路径。

use crate::error::ClientError;
use crate::notification::ActionEvent;
use crate::pose::ToolPose;

/// 通知监听器（在后台线程上被调用）
pub type ActionListener = Box<dyn Fn(ActionEvent) + Send + 'static>;

/// 通知订阅句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// 从原始句柄值创建
    pub fn new(raw: u64) -> Self {
        SubscriptionId(raw)
    }

    /// 原始句柄值
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// 机械臂会话能力面
///
/// 对应厂商 SDK 的 `RefreshFeedback` / `ExecuteAction` /
/// `SendGripperCommand` / `OnNotification*Topic` / `Unsubscribe`。
/// 所有方法都是阻塞 RPC 调用；通知监听器在后台线程上触发。
pub trait ArmApi: Send + Sync {
    /// 读取当前测量的工具位姿（反馈刷新）
    fn refresh_feedback(&self) -> Result<ToolPose, ClientError>;

    /// 下发绝对位姿运动动作（立即返回，完成情况经通知主题上报）
    fn execute_action(&self, target: &ToolPose) -> Result<(), ClientError>;

    /// 下发夹爪位置指令，`position` 取值 [0, 1]（0 全闭，1 全开）
    fn send_gripper_command(&self, position: f64) -> Result<(), ClientError>;

    /// 订阅动作生命周期通知主题
    fn subscribe_action_topic(&self, listener: ActionListener)
    -> Result<SubscriptionId, ClientError>;

    /// 订阅夹爪完成通知主题
    fn subscribe_gripper_topic(
        &self,
        listener: ActionListener,
    ) -> Result<SubscriptionId, ClientError>;

    /// 退订通知主题
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), ClientError>;
}

/// 通知订阅守卫（RAII）
///
/// Drop 时自动退订；退订失败降级为 `tracing::warn!`，
/// 因为 Drop 上下文无法传播错误。
pub struct Subscription<'a> {
    arm: &'a dyn ArmApi,
    id: Option<SubscriptionId>,
}

impl<'a> Subscription<'a> {
    /// 包装一个已建立的订阅
    pub fn new(arm: &'a dyn ArmApi, id: SubscriptionId) -> Self {
        Subscription { arm, id: Some(id) }
    }

    /// 订阅句柄
    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take()
            && let Err(e) = self.arm.unsubscribe(id)
        {
            tracing::warn!("Failed to unsubscribe notification {:?}: {}", id, e);
        }
    }
}
