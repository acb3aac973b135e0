//! 通知完成信号
//!
//! 外部 SDK 的动作通知以回调形式在后台线程触发。本模块把回调风格
//! 转换为控制线程上的阻塞等待：回调方调用 `CompletionNotifier::set()`，
//! 控制线程在 `CompletionSignal::wait()` 上带超时阻塞。
//!
//! # 设计目标
//!
//! - **一次性语义**: 信号只能被触发一次，重复 `set()` 是无害的空操作
//! - **单写单读**: 回调线程写、控制线程读，无需额外互斥
//! - **显式超时**: `wait()` 永远有界，不存在无限阻塞路径

use crossbeam_channel::{Receiver, Sender, bounded};
use std::time::Duration;

/// 动作生命周期事件（来自通知主题）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEvent {
    /// 动作开始执行
    Start,
    /// 动作正常结束
    End,
    /// 动作被中止
    Abort,
}

impl ActionEvent {
    /// 是否为终止事件（END 或 ABORT 均视为动作已解决）
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionEvent::End | ActionEvent::Abort)
    }
}

/// 一次性完成信号（等待端）
pub struct CompletionSignal {
    rx: Receiver<()>,
}

/// 一次性完成信号（触发端，可克隆后移入回调闭包）
#[derive(Clone)]
pub struct CompletionNotifier {
    tx: Sender<()>,
}

impl CompletionSignal {
    /// 创建一对信号端点
    pub fn new() -> (CompletionSignal, CompletionNotifier) {
        // 容量 1：第一次 set() 写入，后续 set() 被 try_send 静默丢弃
        let (tx, rx) = bounded(1);
        (CompletionSignal { rx }, CompletionNotifier { tx })
    }

    /// 阻塞等待信号触发
    ///
    /// 返回 `true` 表示在超时前收到信号；`false` 表示超时。
    pub fn wait(&self, timeout: Duration) -> bool {
        self.rx.recv_timeout(timeout).is_ok()
    }
}

impl CompletionNotifier {
    /// 触发信号（幂等：重复调用或等待端已消失时为空操作）
    pub fn set(&self) {
        let _ = self.tx.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_action_event_terminal() {
        assert!(!ActionEvent::Start.is_terminal());
        assert!(ActionEvent::End.is_terminal());
        assert!(ActionEvent::Abort.is_terminal());
    }

    #[test]
    fn test_set_before_wait() {
        let (signal, notifier) = CompletionSignal::new();
        notifier.set();
        assert!(signal.wait(Duration::from_millis(10)));
    }

    #[test]
    fn test_wait_timeout() {
        let (signal, _notifier) = CompletionSignal::new();
        let start = Instant::now();
        assert!(!signal.wait(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_set_from_background_thread() {
        let (signal, notifier) = CompletionSignal::new();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            notifier.set();
        });

        assert!(signal.wait(Duration::from_millis(500)));
        handle.join().expect("notifier thread panicked");
    }

    #[test]
    fn test_set_is_idempotent() {
        let (signal, notifier) = CompletionSignal::new();
        notifier.set();
        notifier.set();
        notifier.set();

        // 只消费一次，后续等待超时
        assert!(signal.wait(Duration::from_millis(10)));
        assert!(!signal.wait(Duration::from_millis(10)));
    }

    #[test]
    fn test_set_after_waiter_dropped() {
        let (signal, notifier) = CompletionSignal::new();
        drop(signal);
        // 不应 panic
        notifier.set();
    }
}
