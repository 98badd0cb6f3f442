//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `fingerprint`: 调用 PLATON 计算结构指纹（单文件或批量）
//! - `report`: 离线解析已保存的 STIDY 报告
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: fingerprint, report

pub mod fingerprint;
pub mod report;

use clap::{Parser, Subcommand};

/// symprint - 基于 PLATON 的晶体结构对称性指纹
#[derive(Parser)]
#[command(name = "symprint")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Symmetry-normalized crystal structure fingerprints via PLATON", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Standardize structures with PLATON and print their fingerprints
    Fingerprint(fingerprint::FingerprintArgs),

    /// Parse a saved STIDY report and print its fingerprint
    Report(report::ReportArgs),
}
