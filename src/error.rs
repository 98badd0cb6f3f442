//! # 统一错误处理模块
//!
//! 定义 symprint 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 外部程序错误：PLATON 不存在、运行失败、超时
//! - 报告解析错误：STIDY 报告缺少必要字段或格式不符
//! - 指纹编码错误：位点对称符号超过 26 个、计数超过两位数
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// symprint 统一错误类型
#[derive(Error, Debug)]
pub enum SymprintError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 结构文件解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误 (PLATON)
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("External command '{command}' timed out after {seconds} s")]
    CommandTimedOut { command: String, seconds: u64 },

    // ─────────────────────────────────────────────────────────────
    // STIDY 报告错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed STIDY report: {reason}\n  near: {fragment}")]
    MalformedReport { reason: String, fragment: String },

    // ─────────────────────────────────────────────────────────────
    // 指纹编码错误
    // ─────────────────────────────────────────────────────────────
    #[error("Too many distinct site symmetries ({count}), at most 26 can be relabelled")]
    TooManySpecies { count: usize },

    #[error("Site count {count} for {symbol} at Wyckoff '{wyckoff}' does not fit in two digits")]
    CountOverflow {
        wyckoff: String,
        symbol: char,
        count: usize,
    },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 导出错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl SymprintError {
    /// 构造报告解析错误，截断过长的片段
    pub fn malformed(reason: impl Into<String>, fragment: &str) -> Self {
        const MAX_FRAGMENT: usize = 120;
        let fragment = fragment.trim();
        let fragment = match fragment.char_indices().nth(MAX_FRAGMENT) {
            Some((idx, _)) => format!("{}...", &fragment[..idx]),
            None => fragment.to_string(),
        };
        SymprintError::MalformedReport {
            reason: reason.into(),
            fragment,
        }
    }

    /// 是否属于外部程序错误
    pub fn is_external_tool(&self) -> bool {
        matches!(
            self,
            SymprintError::CommandNotFound { .. }
                | SymprintError::CommandFailed { .. }
                | SymprintError::CommandTimedOut { .. }
        )
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, SymprintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_truncates_fragment() {
        let long = "x".repeat(500);
        match SymprintError::malformed("bad row", &long) {
            SymprintError::MalformedReport { fragment, .. } => {
                assert_eq!(fragment.len(), 123);
                assert!(fragment.ends_with("..."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_external_tool_classification() {
        let err = SymprintError::CommandTimedOut {
            command: "platon".to_string(),
            seconds: 5,
        };
        assert!(err.is_external_tool());
        assert!(!SymprintError::TooManySpecies { count: 27 }.is_external_tool());
    }
}
