//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `symmetry/`, `batch/`, `utils/`
//! - 子模块: fingerprint, report

pub mod fingerprint;
pub mod report;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Fingerprint(args) => fingerprint::execute(args),
        Commands::Report(args) => report::execute(args),
    }
}
