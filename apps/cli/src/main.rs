//! # Kortex CLI
//!
//! Command-line replay harness for Kortex-style robot arms.
//!
//! ## 使用方式
//!
//! ```bash
//! # 旧格式日志转换为 JSONL
//! kortex-cli convert --input test.txt --output test.jsonl
//!
//! # 以 10Hz 回放命令序列并打印统计
//! kortex-cli replay --input test.jsonl --hz 10 --yes
//!
//! # 传统文本格式（每行一个标签，固定偏移）
//! kortex-cli replay --input test.txt --legacy --yes
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConvertCommand, ReplayCommand};

/// Kortex CLI - 机械臂命令回放测试台
#[derive(Parser, Debug)]
#[command(name = "kortex-cli")]
#[command(about = "Command-line replay harness for Kortex-style robot arms", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 回放命令序列并测量延迟/超时率
    Replay {
        #[command(flatten)]
        args: ReplayCommand,
    },

    /// 旧格式日志转换为 JSONL
    Convert {
        #[command(flatten)]
        args: ConvertCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kortex_cli=info".parse().unwrap())
                .add_directive("kortex_replay=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { args } => {
            // One-shot 模式：回放
            args.execute().await
        },

        Commands::Convert { args } => {
            // One-shot 模式：格式转换
            args.execute()
        },
    }
}
