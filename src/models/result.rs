//! # 标准化结果数据模型
//!
//! 一次标准化调用的完整输出，供控制台表格、CSV 和 JSON 导出使用。
//!
//! ## 依赖关系
//! - 被 `symmetry/normalizer.rs` 创建
//! - 被 `symmetry/export.rs`, `commands/` 使用

use super::site::{RowDiagnostic, SiteTable, SpaceGroupNumber, UnitCell};
use super::structure::Crystal;
use serde::{Deserialize, Serialize};

/// 标准化结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationResult {
    /// 输入结构名称
    pub name: String,

    /// 空间群编号
    pub space_group: SpaceGroupNumber,

    /// 与位点一一对应的 Wyckoff 字母
    pub wyckoffs: Vec<String>,

    /// 位点表
    pub sites: SiteTable,

    /// 晶胞参数
    pub cell: UnitCell,

    /// 指纹字符串
    pub fingerprint: String,

    /// 由 STIDY 结果重建的标准结构
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_structure: Option<Crystal>,

    /// 报告解析诊断
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<RowDiagnostic>,
}

impl NormalizationResult {
    /// 不同 Wyckoff 位置的数量
    pub fn num_wyckoff_positions(&self) -> usize {
        let mut letters: Vec<&str> = self.wyckoffs.iter().map(String::as_str).collect();
        letters.sort_unstable();
        letters.dedup();
        letters.len()
    }
}
