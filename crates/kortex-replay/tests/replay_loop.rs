//! 回放循环集成测试
//!
//! 用仿真后端跑完整闭环：调度、超时分层、统计与节拍。

use kortex_client::{SimArm, SimConfig};
use kortex_replay::{ActionStats, CommandRecord, RecordFormat, ReplayConfig, Replayer, read_records};
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

fn legacy_records(n: usize) -> Vec<CommandRecord> {
    (0..n)
        .map(|i| CommandRecord::legacy(&format!("waypoint {i}")))
        .collect()
}

fn run(sim: SimConfig, config: ReplayConfig, records: &[CommandRecord]) -> ActionStats {
    let arm = SimArm::connect(sim).expect("sim connect");
    let replayer = Replayer::new(arm, config).expect("replayer");
    replayer.run(records).expect("run")
}

#[test]
fn calls_match_record_count() {
    let stats = run(
        SimConfig {
            action_latency: Duration::from_millis(2),
            ..Default::default()
        },
        ReplayConfig {
            hz: 200.0,
            ..Default::default()
        },
        &legacy_records(5),
    );

    assert_eq!(stats.calls, 5);
    assert_eq!(stats.success, 5);
    assert_eq!(stats.timeout, 0);
    assert!(stats.avg_ms() > 0.0);
}

#[test]
fn empty_source_reports_all_zero() {
    let stats = run(SimConfig::default(), ReplayConfig::default(), &[]);
    assert_eq!(stats, ActionStats::new());
    assert_eq!(stats.avg_ms(), 0.0);
}

#[test]
fn three_legacy_lines_all_time_out() {
    // 动作永不完成，等待上限压到 20ms → 3 条记录全部超时
    let stats = run(
        SimConfig {
            complete_actions: false,
            ..Default::default()
        },
        ReplayConfig {
            hz: 100.0,
            action_timeout: Duration::from_millis(20),
            gripper_timeout: Duration::from_millis(20),
            dispatch_slack: Duration::from_millis(100),
            ..Default::default()
        },
        &legacy_records(3),
    );

    assert_eq!(stats.calls, 3);
    assert_eq!(stats.success, 0);
    assert_eq!(stats.timeout, 3);
    // 超时调用不泄漏部分耗时
    assert_eq!(stats.avg_ms(), 0.0);
    assert!(stats.report().contains("avg 0.0 ms"));
}

#[test]
fn hard_timeout_does_not_abort_run() {
    // 反馈刷新卡 150ms，外层上限 10ms + 20ms → 每条都是硬超时，
    // 但循环必须跑完所有记录
    let stats = run(
        SimConfig {
            feedback_delay: Duration::from_millis(150),
            ..Default::default()
        },
        ReplayConfig {
            hz: 100.0,
            action_timeout: Duration::from_millis(10),
            gripper_timeout: Duration::from_millis(10),
            dispatch_slack: Duration::from_millis(20),
            ..Default::default()
        },
        &legacy_records(3),
    );

    assert_eq!(stats.calls, 3);
    assert_eq!(stats.timeout, 3);
    assert_eq!(stats.avg_ms(), 0.0);
}

#[test]
fn failed_calls_do_not_abort_run() {
    // 动作下发直接报错 → 每条记为失败（非超时），循环仍跑完
    let stats = run(
        SimConfig {
            fail_execute: true,
            ..Default::default()
        },
        ReplayConfig {
            hz: 100.0,
            ..Default::default()
        },
        &legacy_records(3),
    );

    assert_eq!(stats.calls, 3);
    assert_eq!(stats.success, 0);
    assert_eq!(stats.timeout, 0);
}

#[test]
fn gripper_boundary_zero_triggers_motion() {
    let arm = SimArm::connect(SimConfig {
        action_latency: Duration::from_millis(2),
        gripper_latency: Duration::from_millis(2),
        ..Default::default()
    })
    .expect("sim connect");

    // 先把夹爪置为全开，再用边界值 0.0 命令全闭
    let warmup = CommandRecord {
        world_vector: [0.0; 3],
        rotation_delta: [0.0; 3],
        open_gripper: Some(1.0),
        label: None,
    };
    let close = CommandRecord {
        world_vector: [0.0; 3],
        rotation_delta: [0.0; 3],
        open_gripper: Some(0.0),
        label: None,
    };

    let replayer = Replayer::new(
        arm.clone(),
        ReplayConfig {
            hz: 100.0,
            ..Default::default()
        },
    )
    .expect("replayer");

    let stats = replayer.run(&[warmup, close]).expect("run");
    assert_eq!(stats.success, 2);
    assert_eq!(arm.gripper_position(), 0.0);
}

#[test]
fn gripper_null_does_not_trigger_motion() {
    let arm = SimArm::connect(SimConfig {
        action_latency: Duration::from_millis(2),
        ..Default::default()
    })
    .expect("sim connect");

    let record: CommandRecord = serde_json::from_str(
        r#"{"world_vector": [0,0,0], "rotation_delta": [0,0,0], "open_gripper": [null]}"#,
    )
    .expect("parse");

    let replayer = Replayer::new(
        arm.clone(),
        ReplayConfig {
            hz: 100.0,
            ..Default::default()
        },
    )
    .expect("replayer");

    let stats = replayer.run(&[record]).expect("run");
    assert_eq!(stats.success, 1);
    // 夹爪保持初始位置
    assert_eq!(arm.gripper_position(), 0.0);
}

#[test]
fn pacing_absorbs_processing_time_without_drift() {
    // hz=20（周期 50ms），每条处理约 2ms；N 条的总时长应落在
    // (N-1) 个周期和 N 个周期 + 一个周期容差之间
    let n = 5;
    let start = Instant::now();
    let stats = run(
        SimConfig {
            action_latency: Duration::from_millis(2),
            ..Default::default()
        },
        ReplayConfig {
            hz: 20.0,
            ..Default::default()
        },
        &legacy_records(n),
    );
    let elapsed = start.elapsed();

    assert_eq!(stats.calls, n as u64);
    assert!(
        elapsed >= Duration::from_millis(((n - 1) * 50) as u64),
        "run finished too fast: {:?}",
        elapsed
    );
    assert!(
        elapsed <= Duration::from_millis((n * 50 + 50) as u64),
        "pacing drifted: {:?}",
        elapsed
    );
}

#[test]
fn cancellation_skips_remaining_records() {
    let arm = SimArm::connect(SimConfig {
        action_latency: Duration::from_millis(2),
        ..Default::default()
    })
    .expect("sim connect");

    let replayer = Replayer::new(
        arm,
        ReplayConfig {
            hz: 100.0,
            ..Default::default()
        },
    )
    .expect("replayer");

    // 启动前清零 → 零次迭代，仍返回（空的）统计
    let running = AtomicBool::new(false);
    let stats = replayer
        .run_with_cancel(&legacy_records(10), &running)
        .expect("run");
    assert_eq!(stats.calls, 0);
}

#[test]
fn jsonl_records_replay_end_to_end() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"{{"world_vector": [0.0, -0.1, -0.2], "rotation_delta": [0.0, 0.0, 0.0], "open_gripper": [null]}}"#
    )
    .expect("write");
    writeln!(
        file,
        r#"{{"world_vector": [0.1, 0.0, 0.0], "rotation_delta": [0.0, 0.0, 5.0], "open_gripper": [0.5]}}"#
    )
    .expect("write");

    let records = read_records(file.path(), RecordFormat::Jsonl, false).expect("read");
    assert_eq!(records.len(), 2);

    let arm = SimArm::connect(SimConfig {
        action_latency: Duration::from_millis(2),
        gripper_latency: Duration::from_millis(2),
        ..Default::default()
    })
    .expect("sim connect");

    let replayer = Replayer::new(
        arm.clone(),
        ReplayConfig {
            hz: 100.0,
            ..Default::default()
        },
    )
    .expect("replayer");

    let stats = replayer.run(&records).expect("run");
    assert_eq!(stats.calls, 2);
    assert_eq!(stats.success, 2);

    // 两条位置增量都落到了位姿上
    let pose = arm.current_pose();
    assert!((pose.x - 0.1).abs() < 1e-12);
    assert!((pose.y - (-0.1)).abs() < 1e-12);
    assert!((pose.z - (-0.2)).abs() < 1e-12);
    assert!((pose.theta_z - 5.0).abs() < 1e-12);
    assert_eq!(arm.gripper_position(), 0.5);
}
