//! 回放运行统计
//!
//! 纯累加器，只被回放循环线程修改：每条记录恰好更新一次，
//! 按记录顺序。生命周期限定在一次回放运行内，由调用链显式
//! 持有和返回，不是模块级单例。

use crate::action::ActionOutcome;
use std::time::Duration;

/// 动作调用统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionStats {
    /// 调用总数
    pub calls: u64,

    /// 成功数（机械臂与夹爪（如有）均在超时前完成）
    pub success: u64,

    /// 超时数（动作/夹爪等待超时或外层调度超时）
    pub timeout: u64,

    /// 累计耗时（超时调用贡献 0，不泄漏部分耗时）
    total: Duration,
}

impl ActionStats {
    /// 创建全零统计
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次调用
    pub fn add(&mut self, elapsed: Duration, ok: bool, timed_out: bool) {
        self.calls += 1;
        self.total += elapsed;
        if ok {
            self.success += 1;
        }
        if timed_out {
            self.timeout += 1;
        }
    }

    /// 记录一次动作结果
    pub fn record(&mut self, outcome: &ActionOutcome) {
        self.add(outcome.elapsed, outcome.success, outcome.timed_out);
    }

    /// 累计耗时
    pub fn total(&self) -> Duration {
        self.total
    }

    /// 平均耗时（毫秒）；零次调用时定义为 0.0，避免除零
    pub fn avg_ms(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.total.as_secs_f64() * 1e3 / self.calls as f64
    }

    /// 渲染最终报告（调用数 / 成功数 / 超时数 / 平均延迟，1 位小数）
    pub fn report(&self) -> String {
        format!(
            "--- Stats ---\ncalls    {}\nsuccess  {}\ntimeouts {}\navg {:.1} ms",
            self.calls,
            self.success,
            self.timeout,
            self.avg_ms()
        )
    }
}
