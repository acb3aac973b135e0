//! 进程内仿真后端
//!
//! 在没有真实机械臂的环境下运行回放闭环：动作以可配置的延迟在
//! 后台定时线程中「完成」，并通过通知主题回调上报终止事件，
//! 完整复现跨线程回调路径。
//!
//! # 可注入的故障
//!
//! - `fail_connect`: 连接建立即失败（致命错误路径）
//! - `fail_execute`: 动作下发返回传输错误（非超时的调用失败路径）
//! - `complete_actions = false`: 动作永不完成（超时路径）
//! - `feedback_delay`: 反馈刷新阻塞指定时长（调度超时路径）

use crate::error::ClientError;
use crate::notification::ActionEvent;
use crate::pose::ToolPose;
use crate::session::{ActionListener, ArmApi, SubscriptionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// 仿真后端配置
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 动作完成延迟（模拟机械臂运动耗时）
    pub action_latency: Duration,

    /// 夹爪完成延迟
    pub gripper_latency: Duration,

    /// 反馈刷新耗时（默认为零；非零值用于模拟卡死的 RPC 调用）
    pub feedback_delay: Duration,

    /// 是否上报完成事件（false 时所有等待都会超时）
    pub complete_actions: bool,

    /// 连接建立即失败
    pub fail_connect: bool,

    /// 动作下发立即返回传输错误（不产生超时，用于失败路径）
    pub fail_execute: bool,

    /// 初始工具位姿
    pub initial_pose: ToolPose,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            action_latency: Duration::from_millis(20),
            gripper_latency: Duration::from_millis(10),
            feedback_delay: Duration::ZERO,
            complete_actions: true,
            fail_connect: false,
            fail_execute: false,
            initial_pose: ToolPose::default(),
        }
    }
}

/// 通知订阅表（动作主题和夹爪主题各一张监听器表）
#[derive(Default)]
struct Topics {
    action: HashMap<u64, ActionListener>,
    gripper: HashMap<u64, ActionListener>,
    next_id: u64,
}

impl Topics {
    fn insert_action(&mut self, listener: ActionListener) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.action.insert(id, listener);
        SubscriptionId::new(id)
    }

    fn insert_gripper(&mut self, listener: ActionListener) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.gripper.insert(id, listener);
        SubscriptionId::new(id)
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        self.action.remove(&id.raw()).is_some() || self.gripper.remove(&id.raw()).is_some()
    }
}

/// 仿真机械臂会话
pub struct SimArm {
    config: SimConfig,
    pose: Arc<Mutex<ToolPose>>,
    gripper: Arc<Mutex<f64>>,
    topics: Arc<Mutex<Topics>>,
}

impl SimArm {
    /// 建立仿真会话
    ///
    /// `fail_connect` 置位时返回 [`ClientError::Connection`]，
    /// 用于测试致命的连接失败路径。
    pub fn connect(config: SimConfig) -> Result<Arc<SimArm>, ClientError> {
        if config.fail_connect {
            return Err(ClientError::Connection(
                "simulated connection refused".to_string(),
            ));
        }

        let initial_pose = config.initial_pose;
        Ok(Arc::new(SimArm {
            config,
            pose: Arc::new(Mutex::new(initial_pose)),
            gripper: Arc::new(Mutex::new(0.0)),
            topics: Arc::new(Mutex::new(Topics::default())),
        }))
    }

    /// 当前活跃订阅数（测试用，验证退订清理）
    pub fn subscriber_count(&self) -> usize {
        let topics = self.topics.lock();
        topics.action.len() + topics.gripper.len()
    }

    /// 当前工具位姿
    pub fn current_pose(&self) -> ToolPose {
        *self.pose.lock()
    }

    /// 当前夹爪位置
    pub fn gripper_position(&self) -> f64 {
        *self.gripper.lock()
    }

    /// 在定时线程中触发动作主题的终止事件
    fn fire_action_end(topics: &Mutex<Topics>) {
        let topics = topics.lock();
        for listener in topics.action.values() {
            listener(ActionEvent::End);
        }
    }

    /// 在定时线程中触发夹爪主题的终止事件
    fn fire_gripper_end(topics: &Mutex<Topics>) {
        let topics = topics.lock();
        for listener in topics.gripper.values() {
            listener(ActionEvent::End);
        }
    }
}

impl ArmApi for SimArm {
    fn refresh_feedback(&self) -> Result<ToolPose, ClientError> {
        if !self.config.feedback_delay.is_zero() {
            thread::sleep(self.config.feedback_delay);
        }
        Ok(*self.pose.lock())
    }

    fn execute_action(&self, target: &ToolPose) -> Result<(), ClientError> {
        if self.config.fail_execute {
            return Err(ClientError::Transport(
                "simulated execute rejection".to_string(),
            ));
        }

        let latency = self.config.action_latency;
        let complete = self.config.complete_actions;
        let pose = Arc::clone(&self.pose);
        let topics = Arc::clone(&self.topics);
        let target = *target;

        // 定时线程模拟机械臂运动：延迟后更新位姿并上报终止事件
        thread::spawn(move || {
            thread::sleep(latency);
            if complete {
                *pose.lock() = target;
                SimArm::fire_action_end(&topics);
            }
        });

        Ok(())
    }

    fn send_gripper_command(&self, position: f64) -> Result<(), ClientError> {
        let latency = self.config.gripper_latency;
        let complete = self.config.complete_actions;
        let gripper = Arc::clone(&self.gripper);
        let topics = Arc::clone(&self.topics);

        thread::spawn(move || {
            thread::sleep(latency);
            if complete {
                *gripper.lock() = position.clamp(0.0, 1.0);
                SimArm::fire_gripper_end(&topics);
            }
        });

        Ok(())
    }

    fn subscribe_action_topic(
        &self,
        listener: ActionListener,
    ) -> Result<SubscriptionId, ClientError> {
        Ok(self.topics.lock().insert_action(listener))
    }

    fn subscribe_gripper_topic(
        &self,
        listener: ActionListener,
    ) -> Result<SubscriptionId, ClientError> {
        Ok(self.topics.lock().insert_gripper(listener))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), ClientError> {
        if self.topics.lock().remove(id) {
            Ok(())
        } else {
            Err(ClientError::UnknownSubscription(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::CompletionSignal;

    #[test]
    fn test_connect_failure() {
        let result = SimArm::connect(SimConfig {
            fail_connect: true,
            ..Default::default()
        });
        assert!(matches!(result, Err(ClientError::Connection(_))));
    }

    #[test]
    fn test_action_completes_and_updates_pose() {
        let arm = SimArm::connect(SimConfig {
            action_latency: Duration::from_millis(5),
            ..Default::default()
        })
        .expect("sim connect");

        let (signal, notifier) = CompletionSignal::new();
        let id = arm
            .subscribe_action_topic(Box::new(move |event| {
                if event.is_terminal() {
                    notifier.set();
                }
            }))
            .expect("subscribe");

        let target = ToolPose {
            x: 0.1,
            y: -0.1,
            z: 0.3,
            ..Default::default()
        };
        arm.execute_action(&target).expect("execute");

        assert!(signal.wait(Duration::from_millis(500)));
        assert_eq!(arm.current_pose(), target);

        arm.unsubscribe(id).expect("unsubscribe");
    }

    #[test]
    fn test_incomplete_action_never_signals() {
        let arm = SimArm::connect(SimConfig {
            action_latency: Duration::from_millis(1),
            complete_actions: false,
            ..Default::default()
        })
        .expect("sim connect");

        let (signal, notifier) = CompletionSignal::new();
        let _id = arm
            .subscribe_action_topic(Box::new(move |event| {
                if event.is_terminal() {
                    notifier.set();
                }
            }))
            .expect("subscribe");

        arm.execute_action(&ToolPose::default()).expect("execute");
        assert!(!signal.wait(Duration::from_millis(30)));
    }

    #[test]
    fn test_gripper_command_completes() {
        let arm = SimArm::connect(SimConfig {
            gripper_latency: Duration::from_millis(5),
            ..Default::default()
        })
        .expect("sim connect");

        let (signal, notifier) = CompletionSignal::new();
        arm.subscribe_gripper_topic(Box::new(move |event| {
            if event.is_terminal() {
                notifier.set();
            }
        }))
        .expect("subscribe");

        arm.send_gripper_command(1.0).expect("gripper");
        assert!(signal.wait(Duration::from_millis(500)));
        assert_eq!(arm.gripper_position(), 1.0);
    }

    #[test]
    fn test_execute_failure_is_immediate() {
        let arm = SimArm::connect(SimConfig {
            fail_execute: true,
            ..Default::default()
        })
        .expect("sim connect");

        let result = arm.execute_action(&ToolPose::default());
        assert!(matches!(result, Err(ClientError::Transport(_))));
        assert_eq!(arm.current_pose(), ToolPose::default());
    }

    #[test]
    fn test_unsubscribe_unknown_handle() {
        let arm = SimArm::connect(SimConfig::default()).expect("sim connect");
        let result = arm.unsubscribe(SubscriptionId::new(999));
        assert!(matches!(result, Err(ClientError::UnknownSubscription(_))));
    }

    #[test]
    fn test_feedback_delay_blocks() {
        let arm = SimArm::connect(SimConfig {
            feedback_delay: Duration::from_millis(30),
            ..Default::default()
        })
        .expect("sim connect");

        let start = std::time::Instant::now();
        arm.refresh_feedback().expect("feedback");
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
