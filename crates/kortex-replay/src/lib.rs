//! # Kortex Replay - 命令回放测试台
//!
//! 把录制的运动/夹爪命令序列以固定频率回放到机械臂会话上，
//! 测量每条命令的延迟与成功/超时率，并提供旧格式日志到 JSONL
//! 的批量转换器。
//!
//! ## 包含模块
//!
//! - `record` - 命令记录与文件格式（Legacy / JSONL）
//! - `action` - 单条记录的「移动机械臂 + 可选夹爪」组合执行
//! - `dispatch` - 单槽位工作线程与外层调度超时
//! - `replay` - 固定频率回放循环（起点对齐，无漂移累积）
//! - `stats` - 运行统计累加器
//! - `convert` - Python 字面量 → JSONL 转换器
//!
//! ## 使用示例
//!
//! ```rust
//! use kortex_client::{SimArm, SimConfig};
//! use kortex_replay::{CommandRecord, ReplayConfig, Replayer};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let arm = SimArm::connect(SimConfig {
//!     action_latency: Duration::from_millis(2),
//!     ..Default::default()
//! })?;
//!
//! let records = vec![CommandRecord::legacy("waypoint 1")];
//! let replayer = Replayer::new(arm, ReplayConfig {
//!     hz: 100.0,
//!     ..Default::default()
//! })?;
//!
//! let stats = replayer.run(&records)?;
//! assert_eq!(stats.calls, 1);
//! println!("{}", stats.report());
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod record;
pub mod replay;
pub mod stats;

// 重新导出常用类型
pub use action::{ACTION_TIMEOUT, ActionConfig, ActionOutcome, GRIPPER_TIMEOUT};
pub use convert::{ConvertSummary, convert_file};
pub use dispatch::{ActionDispatcher, DispatchResult};
pub use error::{ConvertError, ReplayError};
pub use record::{CommandRecord, LEGACY_OFFSET, RecordFormat, read_records};
pub use replay::{ReplayConfig, Replayer};
pub use stats::ActionStats;
