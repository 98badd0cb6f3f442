//! # report 子命令 CLI 定义
//!
//! 离线解析已保存的 STIDY 报告。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/report.rs`

use clap::Args;
use std::path::PathBuf;

/// report 子命令参数
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Saved STIDY report (PLATON output)
    pub file: PathBuf,

    /// Accepted width of the Wyckoff field in STIDY rows (e.g. '4-5')
    #[arg(long, default_value = "4-5")]
    pub wyckoff_width: String,

    /// Write the parsed result as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}
