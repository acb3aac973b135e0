//! replay 命令
//!
//! 以固定频率回放命令序列，测量每条命令的延迟与成功/超时率

use anyhow::{Context, Result};
use clap::Args;
use kortex_client::{SimArm, SimConfig};
use kortex_replay::{ActionStats, RecordFormat, ReplayConfig, Replayer, read_records};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::spawn_blocking;

/// 回放命令参数
#[derive(Args, Debug)]
pub struct ReplayCommand {
    /// 命令文件路径
    #[arg(short, long)]
    pub input: String,

    /// 目标回放频率（记录/秒）
    #[arg(long, default_value_t = 10.0)]
    pub hz: f64,

    /// 传统文本格式（每行一个标签，回放固定偏移）
    #[arg(long)]
    pub legacy: bool,

    /// 格式错误的记录跳过而不是中止整个运行
    #[arg(long)]
    pub continue_on_error: bool,

    /// 机械臂动作等待上限（秒）
    #[arg(long, default_value_t = 5.0)]
    pub timeout: f64,

    /// 夹爪动作等待上限（秒）
    #[arg(long, default_value_t = 3.0)]
    pub gripper_timeout: f64,

    /// 仿真后端的动作延迟（毫秒）
    #[arg(long, default_value_t = 50)]
    pub latency_ms: u64,

    /// 仿真后端不上报完成事件（所有等待超时，用于压测超时路径）
    #[arg(long)]
    pub no_complete: bool,

    /// 跳过回放前确认
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl ReplayCommand {
    /// 执行回放
    pub async fn execute(&self) -> Result<()> {
        // === 1. 文件检查 ===

        let path = std::path::Path::new(&self.input);
        if !path.exists() {
            anyhow::bail!("❌ 命令文件不存在: {}", self.input);
        }

        // === 2. 显示回放信息 ===

        println!("════════════════════════════════════════");
        println!("           命令回放模式");
        println!("════════════════════════════════════════");
        println!();
        println!("📁 文件: {}", self.input);
        println!(
            "📄 格式: {}",
            if self.legacy { "Legacy" } else { "JSONL" }
        );
        println!("⏱  频率: {:.1} Hz", self.hz);
        println!("⏲  动作超时: {:.1}s / 夹爪超时: {:.1}s", self.timeout, self.gripper_timeout);
        println!();

        // === 3. 安全确认 ===

        if !self.yes {
            let prompt = "即将开始回放，确定要继续吗？[y/N] ";

            print!("{}", prompt);
            use std::io::Write;
            std::io::stdout().flush()?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !input.trim().to_lowercase().starts_with('y') {
                println!("❌ 操作已取消");
                return Ok(());
            }

            println!("✅ 已确认");
            println!();
        }

        // === 4. 创建停止信号 ===

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        // 注册 Ctrl-C 处理器：收尾当前记录后停止
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!();
                println!("🛑 收到停止信号，完成当前记录后停止...");
                running_clone.store(false, Ordering::SeqCst);
            }
        });

        // === 5. 使用 spawn_blocking 隔离阻塞回放 ===

        let args = ReplaySyncArgs {
            input: self.input.clone(),
            format: if self.legacy {
                RecordFormat::Legacy
            } else {
                RecordFormat::Jsonl
            },
            config: ReplayConfig {
                hz: self.hz,
                action_timeout: Duration::from_secs_f64(self.timeout),
                gripper_timeout: Duration::from_secs_f64(self.gripper_timeout),
                continue_on_error: self.continue_on_error,
                ..Default::default()
            },
            sim: SimConfig {
                action_latency: Duration::from_millis(self.latency_ms),
                complete_actions: !self.no_complete,
                ..Default::default()
            },
        };
        let running_for_task = running.clone();

        println!("💡 提示: 按 Ctrl-C 可随时停止回放");
        println!();

        let stats = spawn_blocking(move || {
            // ✅ 在专用 OS 线程中运行，不阻塞 Tokio Worker
            Self::replay_sync(args, running_for_task)
        })
        .await
        .context("回放任务执行失败")??;

        // === 6. 最终报告 ===

        println!();
        println!("{}", stats.report());
        println!();
        println!("✅ 回放完成");

        Ok(())
    }

    /// 同步回放实现（在专用线程中运行）
    ///
    /// 此方法在 spawn_blocking 的 OS 线程中执行，包含：
    /// 1. 建立机械臂会话（阻塞；失败是致命错误）
    /// 2. 读取命令文件
    /// 3. 回放全部记录（阻塞 + 可取消）
    fn replay_sync(args: ReplaySyncArgs, running: Arc<AtomicBool>) -> Result<ActionStats> {
        // === 建立会话 ===

        println!("⏳ 连接到机械臂...");
        let arm = SimArm::connect(args.sim).context("连接失败")?;
        println!("✅ 已连接（仿真后端）");

        // === 读取命令文件 ===

        let path = std::path::Path::new(&args.input);
        let records = read_records(path, args.format, args.config.continue_on_error)
            .context("读取命令文件失败")?;
        println!("📋 {} 条命令记录", records.len());
        println!();

        // === 回放（带取消支持） ===

        let replayer = Replayer::new(arm, args.config).context("回放配置非法")?;
        let stats = replayer
            .run_with_cancel(&records, &running)
            .context("回放失败")?;

        Ok(stats)
    }
}

/// 传入专用线程的回放参数
struct ReplaySyncArgs {
    input: String,
    format: RecordFormat,
    config: ReplayConfig,
    sim: SimConfig,
}
