//! # STIDY 位点数据模型
//!
//! STIDY 报告解析后的结构化中间表示：空间群编号、位点表、晶胞参数。
//!
//! ## 依赖关系
//! - 被 `parsers/stidy.rs` 创建
//! - 被 `symmetry/fingerprint.rs`, `symmetry/normalizer.rs` 使用
//! - 使用 `models/structure.rs` 重建标准结构

use super::structure::{Atom, Crystal, Lattice};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 国际表空间群编号 (1-230)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct SpaceGroupNumber(u16);

impl SpaceGroupNumber {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 230;

    pub fn new(number: u16) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&number)
            .then_some(SpaceGroupNumber(number))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for SpaceGroupNumber {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        SpaceGroupNumber::new(value).ok_or_else(|| format!("space group {} out of 1-230", value))
    }
}

impl From<SpaceGroupNumber> for u16 {
    fn from(sg: SpaceGroupNumber) -> u16 {
        sg.0
    }
}

impl fmt::Display for SpaceGroupNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// STIDY 报告中的一行位点记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// 带编号的位点标签，如 `Fe1`
    pub label: String,

    /// 元素符号，如 `Fe`
    pub species: String,

    /// 原始 Wyckoff 字段，如 `4(c)`
    pub wyckoff_token: String,

    /// Wyckoff 字母，如 `c`
    pub wyckoff: String,

    /// 分数坐标
    pub position: [f64; 3],

    /// 位点对称性符号（用作重标记的键）
    pub site_symmetry: String,

    /// 位点多重度
    pub multiplicity: u32,
}

/// 一份报告的全部位点，保持报告中的顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteTable {
    sites: Vec<SiteRecord>,
}

impl SiteTable {
    pub fn new(sites: Vec<SiteRecord>) -> Self {
        SiteTable { sites }
    }

    /// 与位点一一对应的 Wyckoff 字母序列
    pub fn wyckoffs(&self) -> Vec<String> {
        self.sites.iter().map(|s| s.wyckoff.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SiteRecord> {
        self.sites.iter()
    }

    pub fn as_slice(&self) -> &[SiteRecord] {
        &self.sites
    }

    /// 多重度之和，即晶胞内原子总数
    pub fn total_multiplicity(&self) -> u32 {
        self.sites.iter().map(|s| s.multiplicity).sum()
    }
}

impl<'a> IntoIterator for &'a SiteTable {
    type Item = &'a SiteRecord;
    type IntoIter = std::slice::Iter<'a, SiteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.sites.iter()
    }
}

/// `Cell :` 行给出的晶胞参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    /// a, b, c (Å)
    pub lengths: [f64; 3],
    /// alpha, beta, gamma (度)
    pub angles: [f64; 3],
}

impl UnitCell {
    pub fn to_lattice(&self) -> Lattice {
        let [a, b, c] = self.lengths;
        let [alpha, beta, gamma] = self.angles;
        Lattice::from_parameters(a, b, c, alpha, beta, gamma)
    }
}

/// STIDY 报告解析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StidyReport {
    pub space_group: SpaceGroupNumber,
    pub sites: SiteTable,
    pub cell: UnitCell,
    /// 形似位点行但未通过严格模式的行
    pub diagnostics: Vec<RowDiagnostic>,
}

impl StidyReport {
    /// 由晶胞与位点（不展开对称操作）重建标准结构
    pub fn to_crystal(&self, name: impl Into<String>) -> Crystal {
        let atoms = self
            .sites
            .iter()
            .map(|site| Atom::new(site.species.clone(), site.position).with_label(site.label.clone()))
            .collect();

        let mut crystal = Crystal::new(name, self.cell.to_lattice(), atoms);
        crystal.space_group = Some(self.space_group.get());
        crystal.source_format = Some("stidy".to_string());
        crystal
    }
}

/// 未匹配行的诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDiagnostic {
    pub line: String,
    pub reason: String,
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.line.trim(), self.reason)
    }
}
