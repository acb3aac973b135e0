//! 单条记录的动作执行
//!
//! 每条记录对应一次「移动机械臂，然后（可选）移动夹爪」的组合操作：
//!
//! 1. 反馈刷新读取当前工具位姿，叠加记录增量得到绝对目标
//! 2. 订阅动作通知 → 下发动作 → 带超时阻塞等待终止事件 → 退订
//! 3. 记录携带夹爪目标时，对夹爪主题重复同样的订阅/等待/退订流程
//!
//! 退订由 RAII 守卫保证在所有退出路径上执行（含超时与错误提前返回）。
//! 超时的调用记为 elapsed = 0，不向统计泄漏部分耗时。

use kortex_client::{ArmApi, ClientError, CompletionSignal, Subscription, ToolPose};
use std::time::{Duration, Instant};

use crate::record::CommandRecord;

/// 机械臂动作等待上限
pub const ACTION_TIMEOUT: Duration = Duration::from_secs(5);

/// 夹爪动作等待上限（比机械臂动作短）
pub const GRIPPER_TIMEOUT: Duration = Duration::from_secs(3);

/// 单次动作的超时配置
#[derive(Debug, Clone)]
pub struct ActionConfig {
    /// 机械臂动作等待上限
    pub action_timeout: Duration,

    /// 夹爪动作等待上限
    pub gripper_timeout: Duration,
}

impl Default for ActionConfig {
    fn default() -> Self {
        ActionConfig {
            action_timeout: ACTION_TIMEOUT,
            gripper_timeout: GRIPPER_TIMEOUT,
        }
    }
}

/// 一次动作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    /// 耗时（超时调用恒为 0）
    pub elapsed: Duration,

    /// 机械臂与夹爪（如请求）均在超时前解决
    pub success: bool,

    /// 是否因超时失败
    pub timed_out: bool,
}

impl ActionOutcome {
    /// 动作在超时前解决
    pub fn completed(elapsed: Duration) -> Self {
        ActionOutcome {
            elapsed,
            success: true,
            timed_out: false,
        }
    }

    /// 动作等待超时（内层或外层）；耗时恒为 0
    pub fn timed_out() -> Self {
        ActionOutcome {
            elapsed: Duration::ZERO,
            success: false,
            timed_out: true,
        }
    }

    /// SDK 调用中途失败（非超时）；计入实测耗时
    pub fn failed(elapsed: Duration) -> Self {
        ActionOutcome {
            elapsed,
            success: false,
            timed_out: false,
        }
    }
}

/// 单次运动的内部结果
enum MotionResult {
    /// 终止事件在超时前到达
    Resolved,
    /// 等待超时
    TimedOut,
}

/// 执行一条命令记录（阻塞，在专用工作线程中调用）
pub fn execute_record(
    arm: &dyn ArmApi,
    record: &CommandRecord,
    config: &ActionConfig,
) -> ActionOutcome {
    let start = Instant::now();

    // 1. 反馈刷新 + 计算绝对目标
    let feedback = match arm.refresh_feedback() {
        Ok(pose) => pose,
        Err(e) => {
            tracing::warn!("Feedback refresh failed: {}", e);
            return ActionOutcome::failed(start.elapsed());
        },
    };
    let target = feedback.apply_delta(&record.world_vector, &record.rotation_delta);

    // 2. 机械臂运动；等待超时时跳过夹爪阶段，不让一条记录占用
    //    action_timeout + gripper_timeout 的工作线程时间
    match run_arm_motion(arm, &target, config.action_timeout) {
        Ok(MotionResult::Resolved) => {},
        Ok(MotionResult::TimedOut) => return ActionOutcome::timed_out(),
        Err(e) => {
            tracing::warn!("Arm motion failed: {}", e);
            return ActionOutcome::failed(start.elapsed());
        },
    }

    // 3. 夹爪运动（仅当记录携带非空目标；0.0 / 1.0 是合法边界值）
    if let Some(position) = record.open_gripper {
        match run_gripper_motion(arm, position, config.gripper_timeout) {
            Ok(MotionResult::Resolved) => {},
            Ok(MotionResult::TimedOut) => return ActionOutcome::timed_out(),
            Err(e) => {
                tracing::warn!("Gripper motion failed: {}", e);
                return ActionOutcome::failed(start.elapsed());
            },
        }
    }

    ActionOutcome::completed(start.elapsed())
}

/// 机械臂运动：订阅 → 下发 → 带超时等待 → 退订（RAII）
fn run_arm_motion(
    arm: &dyn ArmApi,
    target: &ToolPose,
    timeout: Duration,
) -> Result<MotionResult, ClientError> {
    let (signal, notifier) = CompletionSignal::new();
    let id = arm.subscribe_action_topic(Box::new(move |event| {
        if event.is_terminal() {
            notifier.set();
        }
    }))?;
    let _guard = Subscription::new(arm, id);

    arm.execute_action(target)?;

    if signal.wait(timeout) {
        Ok(MotionResult::Resolved)
    } else {
        Ok(MotionResult::TimedOut)
    }
}

/// 夹爪运动：与机械臂运动同构，但等待上限更短
fn run_gripper_motion(
    arm: &dyn ArmApi,
    position: f64,
    timeout: Duration,
) -> Result<MotionResult, ClientError> {
    let (signal, notifier) = CompletionSignal::new();
    let id = arm.subscribe_gripper_topic(Box::new(move |event| {
        if event.is_terminal() {
            notifier.set();
        }
    }))?;
    let _guard = Subscription::new(arm, id);

    arm.send_gripper_command(position)?;

    if signal.wait(timeout) {
        Ok(MotionResult::Resolved)
    } else {
        Ok(MotionResult::TimedOut)
    }
}
