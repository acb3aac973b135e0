//! # Kortex Client - 机械臂会话能力面
//!
//! 回放测试台对厂商 SDK 的最小依赖面：反馈刷新、绝对位姿动作、
//! 夹爪指令、动作/夹爪通知主题的订阅与退订。
//!
//! **依赖原则**: 不实现 RPC 协议、运动学模型和连接认证握手，
//! 这些由厂商 SDK 后端负责；本 crate 只定义能力面和通知原语。
//!
//! ## 包含模块
//!
//! - `session` - `ArmApi` trait 与 RAII 订阅守卫
//! - `notification` - 动作事件与一次性完成信号
//! - `pose` - 工具位姿类型
//! - `sim` - 进程内仿真后端（无硬件环境下的闭环测试）
//!
//! ## 使用示例
//!
//! ```rust
//! use kortex_client::{ArmApi, CompletionSignal, SimArm, SimConfig, Subscription};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let arm = SimArm::connect(SimConfig::default())?;
//!
//! let (signal, notifier) = CompletionSignal::new();
//! let id = arm.subscribe_action_topic(Box::new(move |event| {
//!     if event.is_terminal() {
//!         notifier.set();
//!     }
//! }))?;
//! let _guard = Subscription::new(arm.as_ref(), id);
//!
//! arm.execute_action(&Default::default())?;
//! let completed = signal.wait(Duration::from_secs(5));
//! assert!(completed);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod notification;
pub mod pose;
pub mod session;
pub mod sim;

// 重新导出常用类型
pub use error::ClientError;
pub use notification::{ActionEvent, CompletionNotifier, CompletionSignal};
pub use pose::ToolPose;
pub use session::{ActionListener, ArmApi, Subscription, SubscriptionId};
pub use sim::{SimArm, SimConfig};
