//! 单槽位动作调度器
//!
//! 一个长驻工作线程通过会合通道（容量 0）一次接收一个任务，
//! 执行阻塞的机械臂/夹爪往返；调用方在任务结果上施加独立的
//! 外层超时。任何时刻最多存在一个在途动作：上一个任务解决或
//! 超时之前，下一次提交不会发出。
//!
//! 外层超时先于任务返回触发时（内层保护失效、任务卡死），该次
//! 迭代记为硬超时，循环继续处理下一条记录；卡死的任务留在工作
//! 线程中自行解决，后续提交在会合通道上自然排队等待。

use crossbeam_channel::{Sender, bounded};
use kortex_client::ArmApi;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::action::{ActionConfig, ActionOutcome, execute_record};
use crate::error::ReplayError;
use crate::record::CommandRecord;

/// 提交给工作线程的任务
struct Job {
    record: CommandRecord,
    reply: Sender<ActionOutcome>,
}

/// 一次调度的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// 任务在外层超时前返回
    Completed(ActionOutcome),
    /// 外层超时先触发（提交或等待结果阶段）
    TimedOut,
}

/// 单槽位动作调度器
pub struct ActionDispatcher {
    job_tx: Sender<Job>,
    // 工作线程不在 Drop 中 join：卡死的任务会阻塞关闭。
    // 通道关闭后线程自行退出。
    _worker: thread::JoinHandle<()>,
}

impl ActionDispatcher {
    /// 启动工作线程
    pub fn new(arm: Arc<dyn ArmApi>, config: ActionConfig) -> Result<Self, ReplayError> {
        // 容量 0 的会合通道：提交本身就是「等待槽位空闲」
        let (job_tx, job_rx) = bounded::<Job>(0);

        let worker = thread::Builder::new()
            .name("action-worker".to_string())
            .spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    let outcome = execute_record(arm.as_ref(), &job.record, &config);
                    // 调用方可能已因外层超时放弃等待
                    let _ = job.reply.send(outcome);
                }
                tracing::debug!("Action worker exiting: job channel closed");
            })
            .map_err(|e| ReplayError::Worker(e.to_string()))?;

        Ok(ActionDispatcher {
            job_tx,
            _worker: worker,
        })
    }

    /// 提交一条记录并等待结果，整体受 `outer_timeout` 约束
    pub fn dispatch(&self, record: CommandRecord, outer_timeout: Duration) -> DispatchResult {
        let deadline = Instant::now() + outer_timeout;
        let (reply_tx, reply_rx) = bounded(1);

        let job = Job {
            record,
            reply: reply_tx,
        };

        // 上一个任务仍占用槽位时，提交阶段也会消耗外层超时
        if self.job_tx.send_timeout(job, outer_timeout).is_err() {
            return DispatchResult::TimedOut;
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        match reply_rx.recv_timeout(remaining) {
            Ok(outcome) => DispatchResult::Completed(outcome),
            Err(_) => DispatchResult::TimedOut,
        }
    }
}
