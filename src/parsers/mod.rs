//! # 解析器模块
//!
//! 结构文件读写，以及 PLATON STIDY 报告解析。
//!
//! 输入结构在进入标准化流程之前被解析为显式的 [`StructureInput`] 变体，
//! 每个变体有各自的 CIF 转换方式。
//!
//! ## 依赖关系
//! - 被 `symmetry/` 和 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: res, cell, poscar, cif, stidy

pub mod cell;
pub mod cif;
pub mod poscar;
pub mod res;
pub mod stidy;

use crate::error::{Result, SymprintError};
use crate::models::Crystal;
use std::fs;
use std::path::Path;

/// 标准化流程的输入结构
#[derive(Debug, Clone, PartialEq)]
pub enum StructureInput {
    /// 已解析的结构（来自 .res / .cell / POSCAR）
    Crystal(Crystal),
    /// 原样交给 PLATON 的 CIF 文本
    Cif { name: String, content: String },
}

impl StructureInput {
    /// 根据文件名选择变体并读取
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("structure")
            .to_string();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        let reader: fn(&str, &str) -> Result<Crystal> = match ext.as_str() {
            "cif" => {
                return Ok(StructureInput::Cif {
                    name,
                    content: read_file(path)?,
                })
            }
            "res" => res::parse_res_content,
            "cell" => cell::parse_cell_content,
            _ if file_name.starts_with("POSCAR") || file_name.starts_with("CONTCAR") => {
                poscar::parse_poscar_content
            }
            "vasp" => poscar::parse_poscar_content,
            _ => {
                return Err(SymprintError::UnsupportedFormat(format!(
                    "Cannot determine format for: {}",
                    path.display()
                )))
            }
        };

        let crystal = reader(&read_file(path)?, &name).map_err(|e| match e {
            SymprintError::ParseError { format, reason, .. } => SymprintError::ParseError {
                format,
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        Ok(StructureInput::Crystal(crystal))
    }

    pub fn name(&self) -> &str {
        match self {
            StructureInput::Crystal(crystal) => &crystal.name,
            StructureInput::Cif { name, .. } => name,
        }
    }

    /// 转换为 PLATON 的输入 CIF
    pub fn to_cif(&self) -> String {
        match self {
            StructureInput::Crystal(crystal) => cif::to_cif_string(crystal),
            StructureInput::Cif { content, .. } => content.clone(),
        }
    }
}

impl From<Crystal> for StructureInput {
    fn from(crystal: Crystal) -> Self {
        StructureInput::Crystal(crystal)
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SymprintError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}
