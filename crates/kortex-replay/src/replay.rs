//! 固定频率回放循环
//!
//! 按源文件顺序逐条调度命令记录，结果计入统计，并把每次迭代的
//! *起点* 对齐到理想时间表：`next_deadline += period`，然后
//! `sleep(max(0, next_deadline - now))`。处理耗时被吸收进迭代间隙
//! 而不是叠加在周期之上，长时间运行不会累积漂移；若单条记录的
//! 处理经常超过周期，频率会静默下降（不设超限告警）。
//!
//! # 超时分层
//!
//! - 内层：动作 / 夹爪等待各有显式上限（5s / 3s）
//! - 外层：调用方等待工作线程结果的上限 = 动作上限 + 0.2s 调度余量
//!
//! 外层先触发说明内层保护失效（任务卡死）：该次迭代记为硬超时
//! 并输出诊断，循环继续——卡死的迭代永远不会中止整个运行。

use kortex_client::ArmApi;
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::action::{ACTION_TIMEOUT, ActionConfig, GRIPPER_TIMEOUT};
use crate::dispatch::{ActionDispatcher, DispatchResult};
use crate::error::ReplayError;
use crate::record::CommandRecord;
use crate::stats::ActionStats;

/// 回放配置
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// 目标回放频率（记录/秒）
    pub hz: f64,

    /// 机械臂动作等待上限
    pub action_timeout: Duration,

    /// 夹爪动作等待上限
    pub gripper_timeout: Duration,

    /// 外层调度余量（外层超时 = action_timeout + dispatch_slack）
    pub dispatch_slack: Duration,

    /// 格式错误的记录：true 跳过并告警，false 中止整个运行
    pub continue_on_error: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            hz: 10.0,
            action_timeout: ACTION_TIMEOUT,
            gripper_timeout: GRIPPER_TIMEOUT,
            dispatch_slack: Duration::from_millis(200),
            continue_on_error: false,
        }
    }
}

impl ReplayConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<(), ReplayError> {
        if !self.hz.is_finite() || self.hz <= 0.0 {
            return Err(ReplayError::Config(format!(
                "Invalid hz: {} (must be > 0)",
                self.hz
            )));
        }
        if self.action_timeout.is_zero() || self.gripper_timeout.is_zero() {
            return Err(ReplayError::Config(
                "Timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// 单次迭代的理想周期
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.hz)
    }

    /// 外层调度超时
    pub fn outer_timeout(&self) -> Duration {
        self.action_timeout + self.dispatch_slack
    }
}

/// 命令回放器
///
/// 持有机械臂会话和配置；统计对象由每次运行创建并返回，
/// 生命周期限定在一次回放运行内。
pub struct Replayer {
    arm: Arc<dyn ArmApi>,
    config: ReplayConfig,
}

impl Replayer {
    /// 创建回放器（校验配置）
    pub fn new(arm: Arc<dyn ArmApi>, config: ReplayConfig) -> Result<Self, ReplayError> {
        config.validate()?;
        Ok(Replayer { arm, config })
    }

    /// 回放配置
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// 回放整个记录序列
    pub fn run(&self, records: &[CommandRecord]) -> Result<ActionStats, ReplayError> {
        let running = AtomicBool::new(true);
        self.run_with_cancel(records, &running)
    }

    /// 回放整个记录序列（支持协作式取消）
    ///
    /// `running` 被清零后，当前在途记录正常收尾，其余记录跳过；
    /// 已累计的统计仍然返回。
    pub fn run_with_cancel(
        &self,
        records: &[CommandRecord],
        running: &AtomicBool,
    ) -> Result<ActionStats, ReplayError> {
        let action_config = ActionConfig {
            action_timeout: self.config.action_timeout,
            gripper_timeout: self.config.gripper_timeout,
        };
        let dispatcher = ActionDispatcher::new(Arc::clone(&self.arm), action_config)?;

        let period = self.config.period();
        let outer_timeout = self.config.outer_timeout();
        let sleeper = SpinSleeper::default();

        let mut stats = ActionStats::new();
        let mut next_deadline = Instant::now();

        for record in records {
            if !running.load(Ordering::SeqCst) {
                tracing::info!("Replay cancelled, {} records skipped", records.len() as u64 - stats.calls);
                break;
            }

            if let Some(label) = &record.label {
                tracing::info!("{}", label);
            }

            match dispatcher.dispatch(record.clone(), outer_timeout) {
                DispatchResult::Completed(outcome) => stats.record(&outcome),
                DispatchResult::TimedOut => {
                    // 硬超时：内层保护失效，计 0 耗时，继续下一条
                    tracing::warn!("action timeout");
                    stats.add(Duration::ZERO, false, true);
                },
            }

            // 对齐下一次迭代的起点到理想时间表
            next_deadline += period;
            let now = Instant::now();
            if next_deadline > now {
                sleeper.sleep(next_deadline - now);
            }
        }

        Ok(stats)
    }
}
