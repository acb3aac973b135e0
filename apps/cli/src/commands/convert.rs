//! convert 命令
//!
//! 旧格式日志（每行一个 Python 字面量字典）转换为 JSONL

use anyhow::{Context, Result};
use clap::Args;
use kortex_replay::convert_file;
use std::path::PathBuf;

/// 格式转换命令参数
#[derive(Args, Debug)]
pub struct ConvertCommand {
    /// 输入文件路径（每行一个 Python 字面量字典）
    #[arg(short, long)]
    pub input: String,

    /// 输出文件路径（默认：输入文件名改为 .jsonl 后缀）
    #[arg(short, long)]
    pub output: Option<String>,

    /// 格式错误的行跳过而不是中止转换
    #[arg(long)]
    pub continue_on_error: bool,
}

impl ConvertCommand {
    /// 执行转换
    pub fn execute(&self) -> Result<()> {
        let input = PathBuf::from(&self.input);
        if !input.exists() {
            anyhow::bail!("❌ 输入文件不存在: {}", self.input);
        }

        let output = match &self.output {
            Some(path) => PathBuf::from(path),
            None => input.with_extension("jsonl"),
        };

        println!("📜 转换: {} → {}", input.display(), output.display());

        let summary =
            convert_file(&input, &output, self.continue_on_error).context("转换失败")?;

        if summary.lines_skipped > 0 {
            println!("⚠️  跳过 {} 行格式错误的记录", summary.lines_skipped);
        }
        println!(
            "✅ 转换完成: {}（{} 行）",
            output.display(),
            summary.lines_written
        );

        Ok(())
    }
}
