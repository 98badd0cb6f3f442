//! # 批量处理模块
//!
//! 目录输入时收集结构文件并并行执行标准化。
//!
//! ## 依赖关系
//! - 被 `commands/fingerprint.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::{FileCollector, DEFAULT_PATTERN};
pub use runner::{BatchRunner, ProcessResult};
